//! Queued writes committed as one atomic transaction.

use std::collections::BTreeMap;

use crate::row::ColumnMap;

/// Column writes queued for a single interface row.
///
/// `None` leaves a column untouched. `error: Some(None)` clears the column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceUpdate {
    /// New `error` column value.
    pub error: Option<Option<String>>,
    /// New `hw_intf_config` column value.
    pub hw_intf_config: Option<ColumnMap>,
    /// New `forwarding_state` column value.
    pub forwarding_state: Option<ColumnMap>,
}

impl InterfaceUpdate {
    /// Returns true if no column is written.
    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.hw_intf_config.is_none() && self.forwarding_state.is_none()
    }
}

/// A set of interface writes issued together.
///
/// Later writes to the same column of the same row replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    updates: BTreeMap<String, InterfaceUpdate>,
}

impl Transaction {
    /// Creates an empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a write of the `error` column.
    pub fn set_error(&mut self, interface: &str, error: Option<String>) {
        self.entry(interface).error = Some(error);
    }

    /// Queues a write of the `hw_intf_config` column.
    pub fn set_hw_intf_config(&mut self, interface: &str, config: ColumnMap) {
        self.entry(interface).hw_intf_config = Some(config);
    }

    /// Queues a write of the `forwarding_state` column.
    pub fn set_forwarding_state(&mut self, interface: &str, state: ColumnMap) {
        self.entry(interface).forwarding_state = Some(state);
    }

    /// Returns the queued update for an interface.
    pub fn get(&self, interface: &str) -> Option<&InterfaceUpdate> {
        self.updates.get(interface)
    }

    /// Iterates queued updates in interface-name order.
    pub fn updates(&self) -> impl Iterator<Item = (&str, &InterfaceUpdate)> {
        self.updates.iter().map(|(name, update)| (name.as_str(), update))
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.updates.values().all(InterfaceUpdate::is_empty)
    }

    /// Returns the number of interfaces with queued writes.
    pub fn len(&self) -> usize {
        self.updates.values().filter(|u| !u.is_empty()).count()
    }

    fn entry(&mut self, interface: &str) -> &mut InterfaceUpdate {
        self.updates.entry(interface.to_string()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_transaction() {
        let txn = Transaction::new();
        assert!(txn.is_empty());
        assert_eq!(txn.len(), 0);
    }

    #[test]
    fn test_writes_merge_per_interface() {
        let mut txn = Transaction::new();
        txn.set_error("1", Some("admin_down".to_string()));
        txn.set_hw_intf_config(
            "1",
            ColumnMap::from([("enable".to_string(), "false".to_string())]),
        );
        txn.set_error("1", None);

        assert_eq!(txn.len(), 1);
        let update = txn.get("1").unwrap();
        assert_eq!(update.error, Some(None));
        assert_eq!(
            update.hw_intf_config.as_ref().and_then(|m| m.get("enable")),
            Some(&"false".to_string())
        );
        assert!(update.forwarding_state.is_none());
    }
}
