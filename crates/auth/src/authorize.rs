use serde::Serialize;

use stockflow_core::{Denial, DenialKind, StockError, StockResult, WarehouseId};

use crate::{Actor, Operation, Role};

/// Warehouses an actor may see or mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    All,
    Warehouse(WarehouseId),
}

impl Scope {
    pub fn permits(&self, warehouse: WarehouseId) -> bool {
        match self {
            Scope::All => true,
            Scope::Warehouse(bound) => *bound == warehouse,
        }
    }

    /// Resolve the scope a list query runs in.
    ///
    /// An explicit warehouse filter narrows the scope but must itself be
    /// authorized first, so a staff actor naming a foreign warehouse is denied
    /// rather than handed an empty (count-leaking) result.
    pub fn for_query(
        actor: &Actor,
        operation: Operation,
        requested: Option<WarehouseId>,
    ) -> StockResult<Scope> {
        match requested {
            Some(warehouse) => {
                authorize(actor, operation, Some(warehouse))?;
                Ok(Scope::Warehouse(warehouse))
            }
            None => Ok(scope(actor)),
        }
    }
}

/// The actor's full scope.
pub fn scope(actor: &Actor) -> Scope {
    match actor.role {
        Role::Manager => Scope::All,
        Role::Staff { warehouse } => Scope::Warehouse(warehouse),
    }
}

/// Authorize `operation` against `target`.
///
/// - Manager: always allowed.
/// - Staff: manager-only operations are denied; everything else requires the
///   target to be the bound warehouse. An untargeted operation is outside any
///   single warehouse and therefore denied.
pub fn authorize(
    actor: &Actor,
    operation: Operation,
    target: Option<WarehouseId>,
) -> StockResult<()> {
    let bound = match actor.role {
        Role::Manager => return Ok(()),
        Role::Staff { warehouse } => warehouse,
    };

    if operation.is_manager_only() {
        return Err(deny(actor, operation, DenialKind::ManagerOnly, target));
    }

    match target {
        Some(warehouse) if warehouse == bound => Ok(()),
        _ => Err(deny(actor, operation, DenialKind::OutOfScope, target)),
    }
}

/// Authorize an internal transfer line: on top of the document's warehouse,
/// staff need both endpoints inside their bound warehouse.
pub fn authorize_transfer(
    actor: &Actor,
    target: WarehouseId,
    source: WarehouseId,
    destination: WarehouseId,
) -> StockResult<()> {
    let operation = Operation::CreateDocument(stockflow_core::DocumentKind::InternalTransfer);
    authorize(actor, operation, Some(target))?;
    authorize(actor, operation, Some(source))?;
    authorize(actor, operation, Some(destination))
}

fn deny(
    actor: &Actor,
    operation: Operation,
    kind: DenialKind,
    target: Option<WarehouseId>,
) -> StockError {
    tracing::warn!(
        actor = %actor.id,
        role = %actor.role,
        operation = %operation,
        target = ?target,
        "access denied"
    );
    StockError::AccessDenied(Denial {
        kind,
        target,
        operation: operation.as_str().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stockflow_core::{ActorId, DocumentKind};

    fn warehouse() -> WarehouseId {
        WarehouseId::new()
    }

    fn denial_kind(err: StockError) -> DenialKind {
        match err {
            StockError::AccessDenied(d) => d.kind,
            other => panic!("expected AccessDenied, got {other:?}"),
        }
    }

    #[test]
    fn manager_is_unrestricted() {
        let actor = Actor::manager(ActorId::new());
        assert!(authorize(&actor, Operation::ManageCatalog, None).is_ok());
        assert!(authorize(&actor, Operation::ReadStock, Some(warehouse())).is_ok());
        assert_eq!(scope(&actor), Scope::All);
    }

    #[test]
    fn staff_limited_to_bound_warehouse() {
        let home = warehouse();
        let actor = Actor::staff(ActorId::new(), home);

        assert!(authorize(&actor, Operation::TransitionDocument, Some(home)).is_ok());
        let err = authorize(&actor, Operation::TransitionDocument, Some(warehouse())).unwrap_err();
        assert_eq!(denial_kind(err), DenialKind::OutOfScope);

        let err = authorize(&actor, Operation::ReadStock, None).unwrap_err();
        assert_eq!(denial_kind(err), DenialKind::OutOfScope);
    }

    #[test]
    fn staff_cannot_manage_master_data_even_at_home() {
        let home = warehouse();
        let actor = Actor::staff(ActorId::new(), home);
        let err = authorize(&actor, Operation::ManageTopology, Some(home)).unwrap_err();
        assert_eq!(denial_kind(err), DenialKind::ManagerOnly);
    }

    #[test]
    fn transfer_requires_both_endpoints_in_scope() {
        let home = warehouse();
        let away = warehouse();
        let actor = Actor::staff(ActorId::new(), home);

        assert!(authorize_transfer(&actor, home, home, home).is_ok());
        assert!(authorize_transfer(&actor, home, home, away).is_err());
        assert!(authorize_transfer(&actor, home, away, home).is_err());

        let manager = Actor::manager(ActorId::new());
        assert!(authorize_transfer(&manager, home, home, away).is_ok());
    }

    #[test]
    fn query_scope_narrows_or_denies() {
        let home = warehouse();
        let staff = Actor::staff(ActorId::new(), home);

        assert_eq!(
            Scope::for_query(&staff, Operation::ReadMoves, None).unwrap(),
            Scope::Warehouse(home)
        );
        assert!(Scope::for_query(&staff, Operation::ReadMoves, Some(warehouse())).is_err());

        let manager = Actor::manager(ActorId::new());
        let other = warehouse();
        assert_eq!(
            Scope::for_query(&manager, Operation::ReadMoves, Some(other)).unwrap(),
            Scope::Warehouse(other)
        );
    }

    proptest! {
        /// Property: a staff actor is allowed for a warehouse exactly when it
        /// is the bound one, whatever the scoped operation.
        #[test]
        fn staff_allowed_iff_bound(same in any::<bool>(), op_idx in 0usize..7) {
            let ops = [
                Operation::ReadStock,
                Operation::ReadMoves,
                Operation::ReadDocuments,
                Operation::CreateDocument(DocumentKind::Receipt),
                Operation::CreateDocument(DocumentKind::Delivery),
                Operation::EditDocument,
                Operation::TransitionDocument,
            ];
            let home = warehouse();
            let target = if same { home } else { warehouse() };
            let actor = Actor::staff(ActorId::new(), home);

            prop_assert_eq!(authorize(&actor, ops[op_idx], Some(target)).is_ok(), same);
            prop_assert_eq!(scope(&actor).permits(target), same);
        }
    }
}
