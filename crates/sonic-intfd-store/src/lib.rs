//! Store abstractions for the SONiC interface daemon.
//!
//! The interface daemon reads declarative configuration and observed
//! hardware facts from a shared transactional store and writes derived
//! state back. This crate holds the narrow seam between the daemon and
//! that store:
//!
//! - [`InterfaceRow`], [`PortRow`], [`SubsystemRow`], [`SystemRow`]: row
//!   snapshots of the consumed schema
//! - [`ChangeQueue`] / [`PendingChanges`] / [`ChangeBatch`]: per-key
//!   deduplicated change delivery
//! - [`Transaction`]: queued writes committed atomically once per pass
//! - [`Store`]: the async trait the daemon drives (wait, lock, commit)
//! - [`MemoryStore`]: an in-process implementation backed by JSON snapshots
//!
//! # Example
//!
//! ```ignore
//! use sonic_intfd_store::{MemoryStore, Store};
//!
//! let mut store = MemoryStore::load_snapshot("/etc/sonic/intfd-snapshot.json")?;
//! let batch = store.wait_for_changes(Duration::from_secs(1)).await?;
//! ```

mod change;
mod error;
mod memory;
mod row;
mod store;
mod txn;

pub use change::{ChangeBatch, ChangeQueue, Operation, PendingChanges, RowChange};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use row::{ColumnMap, InterfaceRow, PortRow, StoreSnapshot, SubsystemRow, SystemRow};
pub use store::{LockState, Store};
pub use txn::{InterfaceUpdate, Transaction};
