//! Bounded per-key lock table.
//!
//! Callers acquire a *set* of keys at once; the table grants all of them or
//! none, so two callers never hold overlapping partial sets and cannot
//! deadlock on each other. Waiting is bounded by a timeout that surfaces as
//! [`LockTimeout`], never as an indefinite block.

use std::collections::HashSet;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use crate::error::StockError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("timed out after {waited:?} waiting for {contended} contended key(s)")]
pub struct LockTimeout {
    pub waited: Duration,
    pub contended: usize,
}

impl From<LockTimeout> for StockError {
    fn from(value: LockTimeout) -> Self {
        StockError::conflict(value.to_string())
    }
}

#[derive(Debug)]
pub struct KeyLockTable<K> {
    held: Mutex<HashSet<K>>,
    released: Condvar,
}

impl<K> Default for KeyLockTable<K> {
    fn default() -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
        }
    }
}

impl<K> KeyLockTable<K>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire every key in `keys`, waiting at most `timeout`.
    pub fn acquire(
        &self,
        keys: impl IntoIterator<Item = K>,
        timeout: Duration,
    ) -> Result<KeyLockGuard<'_, K>, LockTimeout> {
        let mut wanted: Vec<K> = Vec::new();
        for key in keys {
            if !wanted.contains(&key) {
                wanted.push(key);
            }
        }

        let started = Instant::now();
        let deadline = started + timeout;
        let mut held = self.held.lock();

        loop {
            let contended = wanted.iter().filter(|k| held.contains(*k)).count();
            if contended == 0 {
                held.extend(wanted.iter().cloned());
                return Ok(KeyLockGuard {
                    table: self,
                    keys: wanted,
                });
            }

            if self.released.wait_until(&mut held, deadline).timed_out() {
                let contended = wanted.iter().filter(|k| held.contains(*k)).count();
                if contended == 0 {
                    continue;
                }
                return Err(LockTimeout {
                    waited: started.elapsed(),
                    contended,
                });
            }
        }
    }

    /// Number of keys currently held (diagnostics/tests).
    pub fn held_count(&self) -> usize {
        self.held.lock().len()
    }

    fn release(&self, keys: &[K]) {
        let mut held = self.held.lock();
        for key in keys {
            held.remove(key);
        }
        drop(held);
        self.released.notify_all();
    }
}

/// Releases its keys on drop.
#[derive(Debug)]
pub struct KeyLockGuard<'a, K>
where
    K: Clone + Eq + Hash,
{
    table: &'a KeyLockTable<K>,
    keys: Vec<K>,
}

impl<K> KeyLockGuard<'_, K>
where
    K: Clone + Eq + Hash,
{
    pub fn keys(&self) -> &[K] {
        &self.keys
    }
}

impl<K> Drop for KeyLockGuard<'_, K>
where
    K: Clone + Eq + Hash,
{
    fn drop(&mut self) {
        self.table.release(&self.keys);
    }
}
