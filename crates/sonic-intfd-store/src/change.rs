//! Change delivery with per-key deduplication.

use std::collections::{BTreeMap, VecDeque};

use crate::row::{InterfaceRow, PortRow, SubsystemRow, SystemRow};

/// Operation type for a row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Row inserted or modified.
    Set,
    /// Row deleted.
    Del,
}

impl Operation {
    /// Returns true if this is a Del operation.
    pub fn is_del(&self) -> bool {
        matches!(self, Operation::Del)
    }
}

/// A single row change. Set changes carry the full new row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowChange<R> {
    /// Row key (the row's name).
    pub key: String,
    /// The operation.
    pub op: Operation,
    /// The new row contents (None for Del).
    pub row: Option<R>,
}

impl<R> RowChange<R> {
    /// Creates a Set change.
    pub fn set(key: impl Into<String>, row: R) -> Self {
        Self {
            key: key.into(),
            op: Operation::Set,
            row: Some(row),
        }
    }

    /// Creates a Del change.
    pub fn del(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            op: Operation::Del,
            row: None,
        }
    }
}

/// Pending changes for one table, deduplicated by key.
///
/// When multiple changes arrive for the same key before they are drained:
/// - DEL clears any pending SET and replaces it
/// - SET after SET replaces the older row (rows are full snapshots)
/// - DEL then SET keeps both, in order, so the consumer sees a re-creation
#[derive(Debug, Clone)]
pub struct ChangeQueue<R> {
    to_sync: BTreeMap<String, VecDeque<RowChange<R>>>,
    pending_count: usize,
}

impl<R> Default for ChangeQueue<R> {
    fn default() -> Self {
        Self {
            to_sync: BTreeMap::new(),
            pending_count: 0,
        }
    }
}

impl<R> ChangeQueue<R> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are pending changes.
    pub fn has_pending(&self) -> bool {
        self.pending_count > 0
    }

    /// Returns the number of pending changes.
    pub fn pending_count(&self) -> usize {
        self.pending_count
    }

    /// Adds a change with deduplication.
    pub fn push(&mut self, change: RowChange<R>) {
        let queue = self.to_sync.entry(change.key.clone()).or_default();

        match change.op {
            Operation::Del => {
                self.pending_count -= queue.len();
                queue.clear();
                queue.push_back(change);
                self.pending_count += 1;
            }
            Operation::Set => {
                if let Some(last) = queue.back_mut() {
                    if last.op == Operation::Set {
                        last.row = change.row;
                        return;
                    }
                }
                queue.push_back(change);
                self.pending_count += 1;
            }
        }
    }

    /// Drains all pending changes, grouped by key in key order.
    pub fn drain(&mut self) -> Vec<RowChange<R>> {
        let mut result = Vec::with_capacity(self.pending_count);
        for (_key, queue) in std::mem::take(&mut self.to_sync) {
            result.extend(queue);
        }
        self.pending_count = 0;
        result
    }
}

/// Everything that changed in the store since the previous batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    /// New System row, if it changed.
    pub system: Option<SystemRow>,
    /// Subsystem table changes.
    pub subsystems: Vec<RowChange<SubsystemRow>>,
    /// Interface table changes.
    pub interfaces: Vec<RowChange<InterfaceRow>>,
    /// Port table changes.
    pub ports: Vec<RowChange<PortRow>>,
}

impl ChangeBatch {
    /// Returns true if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.system.is_none()
            && self.subsystems.is_empty()
            && self.interfaces.is_empty()
            && self.ports.is_empty()
    }

    /// Returns the number of row changes in the batch.
    pub fn len(&self) -> usize {
        usize::from(self.system.is_some())
            + self.subsystems.len()
            + self.interfaces.len()
            + self.ports.len()
    }
}

/// Changes accumulated across batches, deduplicated per table and key.
///
/// The System row is latest-wins. The other tables fold through a
/// [`ChangeQueue`], so repeated changes to one row keep at most a DEL and a
/// SET pending.
#[derive(Debug, Clone, Default)]
pub struct PendingChanges {
    system: Option<SystemRow>,
    subsystems: ChangeQueue<SubsystemRow>,
    interfaces: ChangeQueue<InterfaceRow>,
    ports: ChangeQueue<PortRow>,
}

impl PendingChanges {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pending System row, if any.
    pub fn system(&self) -> Option<&SystemRow> {
        self.system.as_ref()
    }

    /// Returns true if anything is pending.
    pub fn has_pending(&self) -> bool {
        self.system.is_some()
            || self.subsystems.has_pending()
            || self.interfaces.has_pending()
            || self.ports.has_pending()
    }

    /// Returns the number of pending row changes.
    pub fn pending_count(&self) -> usize {
        usize::from(self.system.is_some())
            + self.subsystems.pending_count()
            + self.interfaces.pending_count()
            + self.ports.pending_count()
    }

    /// Sets the System row, replacing any pending one.
    pub fn set_system(&mut self, system: SystemRow) {
        self.system = Some(system);
    }

    /// Queues a Subsystem change.
    pub fn push_subsystem(&mut self, change: RowChange<SubsystemRow>) {
        self.subsystems.push(change);
    }

    /// Queues an Interface change.
    pub fn push_interface(&mut self, change: RowChange<InterfaceRow>) {
        self.interfaces.push(change);
    }

    /// Queues a Port change.
    pub fn push_port(&mut self, change: RowChange<PortRow>) {
        self.ports.push(change);
    }

    /// Folds a whole batch into the pending changes.
    pub fn merge(&mut self, batch: ChangeBatch) {
        if let Some(system) = batch.system {
            self.set_system(system);
        }
        for change in batch.subsystems {
            self.push_subsystem(change);
        }
        for change in batch.interfaces {
            self.push_interface(change);
        }
        for change in batch.ports {
            self.push_port(change);
        }
    }

    /// Drains everything pending into one batch.
    pub fn take(&mut self) -> ChangeBatch {
        ChangeBatch {
            system: self.system.take(),
            subsystems: self.subsystems.drain(),
            interfaces: self.interfaces.drain(),
            ports: self.ports.drain(),
        }
    }
}
