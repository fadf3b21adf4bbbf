//! Row snapshots of the tables the interface daemon consumes.
//!
//! Rows are delivered whole; a modification carries the full new row.
//! Map-valued columns are `BTreeMap<String, String>` so that equality and
//! serialization are deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// String-to-string map column.
pub type ColumnMap = BTreeMap<String, String>;

/// A row of the Interface table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceRow {
    /// Unique interface name (e.g. "1", "49-1").
    pub name: String,
    /// Interface type ("system", "internal", "vlansubint", "loopback", or empty).
    #[serde(rename = "type")]
    pub intf_type: String,
    /// Declarative user configuration.
    pub user_config: ColumnMap,
    /// Static hardware description.
    pub hw_intf_info: ColumnMap,
    /// Observed pluggable-module information.
    pub pm_info: ColumnMap,
    /// Link aggregation (bond) status.
    pub bond_status: ColumnMap,
    /// System readiness status.
    pub hw_status: ColumnMap,
    /// Name of the split parent, if this is a split child.
    pub split_parent: Option<String>,
    /// Names of the split children, if this is a splittable parent.
    pub split_children: Vec<String>,
    /// Hardware configuration written by the daemon.
    pub hw_intf_config: ColumnMap,
    /// Forwarding state written by the daemon.
    pub forwarding_state: ColumnMap,
    /// Disable reason written by the daemon (cleared when enabled).
    pub error: Option<String>,
}

impl InterfaceRow {
    /// Creates an empty row with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A row of the Port table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortRow {
    /// Unique port name.
    pub name: String,
    /// Administrative state ("up", "down", or unset).
    pub admin: Option<String>,
    /// Member interface names.
    pub interfaces: Vec<String>,
}

impl PortRow {
    /// Creates a port row with the given members.
    pub fn new<I, S>(name: impl Into<String>, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            admin: None,
            interfaces: interfaces.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the admin column.
    pub fn with_admin(mut self, admin: impl Into<String>) -> Self {
        self.admin = Some(admin.into());
        self
    }
}

/// A row of the Subsystem table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsystemRow {
    /// Subsystem name (e.g. "base").
    pub name: String,
    /// Free-form subsystem information.
    pub other_info: ColumnMap,
}

/// The singleton System row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemRow {
    /// Configuration generation; zero until the configuration is loaded.
    pub cur_cfg: i64,
}

/// A complete store image, used to seed a [`crate::MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    /// System row.
    pub system: SystemRow,
    /// Subsystem rows.
    pub subsystems: Vec<SubsystemRow>,
    /// Interface rows.
    pub interfaces: Vec<InterfaceRow>,
    /// Port rows.
    pub ports: Vec<PortRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_row_deserialize_partial() {
        let json = r#"{
            "name": "1",
            "type": "system",
            "user_config": {"admin": "up"},
            "split_children": ["1-1", "1-2"]
        }"#;
        let row: InterfaceRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.name, "1");
        assert_eq!(row.intf_type, "system");
        assert_eq!(row.user_config.get("admin").map(String::as_str), Some("up"));
        assert_eq!(row.split_children, vec!["1-1", "1-2"]);
        assert!(row.split_parent.is_none());
        assert!(row.error.is_none());
    }

    #[test]
    fn test_port_row_builder() {
        let port = PortRow::new("bridge_normal", ["1", "2"]).with_admin("down");
        assert_eq!(port.interfaces, vec!["1", "2"]);
        assert_eq!(port.admin.as_deref(), Some("down"));
    }

    #[test]
    fn test_snapshot_defaults() {
        let snapshot: StoreSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot.system.cur_cfg, 0);
        assert!(snapshot.interfaces.is_empty());
    }
}
