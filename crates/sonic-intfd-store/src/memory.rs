//! In-process store implementation.
//!
//! `MemoryStore` is a cheaply cloneable handle: one clone is driven by the
//! daemon through the [`Store`] trait while other clones mutate rows the way
//! the platform daemons and the CLI would. Every row mutation queues a
//! change and wakes a pending [`Store::wait_for_changes`]. Columns written by
//! the interface daemon itself (`error`, `hw_intf_config`,
//! `forwarding_state`) are applied on commit without raising a change.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::change::{ChangeBatch, PendingChanges, RowChange};
use crate::error::{StoreError, StoreResult};
use crate::row::{InterfaceRow, PortRow, StoreSnapshot, SubsystemRow, SystemRow};
use crate::store::{LockState, Store};
use crate::txn::Transaction;

#[derive(Debug, Default)]
struct Tables {
    system: SystemRow,
    subsystems: BTreeMap<String, SubsystemRow>,
    interfaces: BTreeMap<String, InterfaceRow>,
    ports: BTreeMap<String, PortRow>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: Tables,
    pending: PendingChanges,
    lock: LockState,
    commit_count: usize,
    fail_next_commit: Option<String>,
}

/// In-memory store handle.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    notify: Arc<Notify>,
}

impl MemoryStore {
    /// Creates an empty store whose lock is held by this session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded from a snapshot.
    ///
    /// Every row of the snapshot is queued as an insertion, so the first
    /// batch the daemon sees is the full initial image.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let store = Self::new();
        store.set_cur_cfg(snapshot.system.cur_cfg);
        for subsystem in snapshot.subsystems {
            store.upsert_subsystem(subsystem);
        }
        for interface in snapshot.interfaces {
            store.upsert_interface(interface);
        }
        for port in snapshot.ports {
            store.upsert_port(port);
        }
        store
    }

    /// Loads a JSON snapshot file.
    pub fn load_snapshot(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::snapshot(path, e.to_string()))?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)
            .map_err(|e| StoreError::snapshot(path, e.to_string()))?;
        debug!(
            "Loaded snapshot {} ({} interfaces, {} ports)",
            path.display(),
            snapshot.interfaces.len(),
            snapshot.ports.len()
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Returns the current contents as a snapshot.
    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.inner.lock();
        StoreSnapshot {
            system: inner.tables.system,
            subsystems: inner.tables.subsystems.values().cloned().collect(),
            interfaces: inner.tables.interfaces.values().cloned().collect(),
            ports: inner.tables.ports.values().cloned().collect(),
        }
    }

    /// Inserts or replaces an interface row.
    pub fn upsert_interface(&self, row: InterfaceRow) {
        self.mutate(|inner| {
            inner
                .pending
                .push_interface(RowChange::set(row.name.clone(), row.clone()));
            inner.tables.interfaces.insert(row.name.clone(), row);
        });
    }

    /// Modifies an existing interface row in place.
    pub fn update_interface<F>(&self, name: &str, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut InterfaceRow),
    {
        let mut inner = self.inner.lock();
        let row = inner
            .tables
            .interfaces
            .get_mut(name)
            .ok_or_else(|| StoreError::row_not_found("Interface", name))?;
        f(row);
        let row = row.clone();
        inner.pending.push_interface(RowChange::set(name, row));
        drop(inner);
        self.notify.notify_one();
        Ok(())
    }

    /// Deletes an interface row.
    pub fn delete_interface(&self, name: &str) {
        self.mutate(|inner| {
            if inner.tables.interfaces.remove(name).is_some() {
                inner.pending.push_interface(RowChange::del(name));
            }
        });
    }

    /// Inserts or replaces a port row.
    pub fn upsert_port(&self, row: PortRow) {
        self.mutate(|inner| {
            inner
                .pending
                .push_port(RowChange::set(row.name.clone(), row.clone()));
            inner.tables.ports.insert(row.name.clone(), row);
        });
    }

    /// Deletes a port row.
    pub fn delete_port(&self, name: &str) {
        self.mutate(|inner| {
            if inner.tables.ports.remove(name).is_some() {
                inner.pending.push_port(RowChange::del(name));
            }
        });
    }

    /// Inserts or replaces a subsystem row.
    pub fn upsert_subsystem(&self, row: SubsystemRow) {
        self.mutate(|inner| {
            inner
                .pending
                .push_subsystem(RowChange::set(row.name.clone(), row.clone()));
            inner.tables.subsystems.insert(row.name.clone(), row);
        });
    }

    /// Sets the System row's configuration generation.
    pub fn set_cur_cfg(&self, cur_cfg: i64) {
        self.mutate(|inner| {
            inner.tables.system.cur_cfg = cur_cfg;
            let system = inner.tables.system;
            inner.pending.set_system(system);
        });
    }

    /// Sets the lock state reported to the daemon.
    pub fn set_lock_state(&self, lock: LockState) {
        self.inner.lock().lock = lock;
    }

    /// Makes the next commit fail with the given message.
    pub fn fail_next_commit(&self, message: impl Into<String>) {
        self.inner.lock().fail_next_commit = Some(message.into());
    }

    /// Returns a copy of an interface row.
    pub fn interface(&self, name: &str) -> Option<InterfaceRow> {
        self.inner.lock().tables.interfaces.get(name).cloned()
    }

    /// Returns the number of successful commits.
    pub fn commit_count(&self) -> usize {
        self.inner.lock().commit_count
    }

    /// Returns true if changes are queued for the daemon.
    pub fn has_pending(&self) -> bool {
        self.inner.lock().pending.has_pending()
    }

    fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut Inner),
    {
        {
            let mut inner = self.inner.lock();
            f(&mut *inner);
        }
        self.notify.notify_one();
    }

    fn take_pending(&self) -> Option<ChangeBatch> {
        let mut inner = self.inner.lock();
        if inner.pending.has_pending() {
            Some(inner.pending.take())
        } else {
            None
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn wait_for_changes(&mut self, timeout: Duration) -> StoreResult<ChangeBatch> {
        if let Some(batch) = self.take_pending() {
            return Ok(batch);
        }
        // Timing out is the normal idle path; an empty batch is returned.
        let _ = tokio::time::timeout(timeout, self.notify.notified()).await;
        Ok(self.take_pending().unwrap_or_default())
    }

    fn lock_state(&self) -> LockState {
        self.inner.lock().lock
    }

    async fn commit(&mut self, txn: Transaction) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        if let Some(message) = inner.fail_next_commit.take() {
            return Err(StoreError::commit(message));
        }

        for (name, update) in txn.updates() {
            let Some(row) = inner.tables.interfaces.get_mut(name) else {
                warn!("Commit references deleted interface {}, skipping", name);
                continue;
            };
            if let Some(error) = &update.error {
                row.error = error.clone();
            }
            if let Some(config) = &update.hw_intf_config {
                row.hw_intf_config = config.clone();
            }
            if let Some(state) = &update.forwarding_state {
                row.forwarding_state = state.clone();
            }
        }

        debug!("Committed writes for {} interfaces", txn.len());
        inner.commit_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::Operation;
    use crate::row::ColumnMap;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[tokio::test]
    async fn test_snapshot_rows_arrive_as_first_batch() {
        let snapshot = StoreSnapshot {
            system: SystemRow { cur_cfg: 1 },
            interfaces: vec![InterfaceRow::new("1"), InterfaceRow::new("2")],
            ports: vec![PortRow::new("p1", ["1"])],
            ..Default::default()
        };
        let mut store = MemoryStore::from_snapshot(snapshot);

        let batch = store
            .wait_for_changes(Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(batch.system, Some(SystemRow { cur_cfg: 1 }));
        assert_eq!(batch.interfaces.len(), 2);
        assert_eq!(batch.ports.len(), 1);

        let batch = store
            .wait_for_changes(Duration::from_millis(10))
            .await
            .unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_wait_wakes_on_mutation_from_clone() {
        let mut store = MemoryStore::new();
        let writer = store.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            writer.upsert_port(PortRow::new("p1", ["1"]));
        });

        let batch = store
            .wait_for_changes(Duration::from_secs(5))
            .await
            .unwrap();
        handle.await.unwrap();
        assert_eq!(batch.ports.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_applies_daemon_columns_without_change() {
        let mut store = MemoryStore::new();
        store.upsert_interface(InterfaceRow::new("1"));
        let _ = store.wait_for_changes(Duration::from_millis(1)).await;

        let mut txn = Transaction::new();
        txn.set_error("1", Some("admin_down".to_string()));
        txn.set_hw_intf_config(
            "1",
            ColumnMap::from([("enable".to_string(), "false".to_string())]),
        );
        store.commit(txn).await.unwrap();

        let row = store.interface("1").unwrap();
        assert_eq!(row.error.as_deref(), Some("admin_down"));
        assert_eq!(row.hw_intf_config.get("enable").map(String::as_str), Some("false"));
        assert!(!store.has_pending());
        assert_eq!(store.commit_count(), 1);
    }

    #[tokio::test]
    async fn test_fail_next_commit() {
        let mut store = MemoryStore::new();
        store.fail_next_commit("conflict");

        let err = store.commit(Transaction::new()).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store.commit_count(), 0);
        assert!(store.commit(Transaction::new()).await.is_ok());
    }

    #[test]
    fn test_update_and_delete_interface() {
        let store = MemoryStore::new();
        store.upsert_interface(InterfaceRow::new("1"));
        store
            .update_interface("1", |row| {
                row.user_config.insert("admin".to_string(), "up".to_string());
            })
            .unwrap();
        store.delete_interface("1");

        assert!(store.update_interface("1", |_| {}).is_err());
        let batch = store.take_pending().unwrap();
        let ops: Vec<Operation> = batch.interfaces.iter().map(|c| c.op).collect();
        assert_eq!(ops, vec![Operation::Del]);
    }

    #[test]
    fn test_load_snapshot_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"system": {{"cur_cfg": 3}}, "interfaces": [{{"name": "7"}}]}}"#
        )
        .unwrap();

        let store = MemoryStore::load_snapshot(file.path()).unwrap();
        assert!(store.interface("7").is_some());
        assert_eq!(store.snapshot().system.cur_cfg, 3);
    }

    #[test]
    fn test_load_snapshot_missing_file() {
        let err = MemoryStore::load_snapshot("/nonexistent/snapshot.json").unwrap_err();
        assert!(matches!(err, StoreError::Snapshot { .. }));
    }
}
