//! The store trait driven by the interface daemon.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::change::ChangeBatch;
use crate::error::StoreResult;
use crate::txn::Transaction;

/// Ownership of the store's single-writer lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    /// This session holds the lock.
    #[default]
    Held,
    /// The lock has been requested but not yet granted.
    Pending,
    /// Another session holds the lock.
    Contended,
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Held => write!(f, "held"),
            Self::Pending => write!(f, "pending"),
            Self::Contended => write!(f, "contended"),
        }
    }
}

/// A transactional store session.
///
/// The daemon suspends only inside [`Store::wait_for_changes`]. Everything
/// between two waits runs to completion against the returned batch.
#[async_trait]
pub trait Store: Send {
    /// Waits until rows change or `timeout` elapses.
    ///
    /// Returns an empty batch on timeout.
    async fn wait_for_changes(&mut self, timeout: Duration) -> StoreResult<ChangeBatch>;

    /// Returns the current state of the named lock for this session.
    fn lock_state(&self) -> LockState;

    /// Commits a transaction atomically.
    async fn commit(&mut self, txn: Transaction) -> StoreResult<()>;
}
