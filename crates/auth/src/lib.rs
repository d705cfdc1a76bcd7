//! `stockflow-auth`: the access scope guard (pure policy, no IO).
//!
//! Identity is verified elsewhere; this crate only decides whether an already
//! authenticated actor may touch a given warehouse.

pub mod actor;
pub mod authorize;
pub mod operation;
pub mod roles;

pub use actor::Actor;
pub use authorize::{Scope, authorize, authorize_transfer, scope};
pub use operation::Operation;
pub use roles::Role;
