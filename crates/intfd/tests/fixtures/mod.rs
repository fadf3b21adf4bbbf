//! Row builders and store setup shared by the integration tests.

#![allow(dead_code)]

use sonic_intfd::{IntfMgr, IntfdConfig, PassOutcome};
use sonic_intfd_store::{ColumnMap, InterfaceRow, MemoryStore, PortRow, SubsystemRow};

/// Builder for Interface rows.
#[derive(Debug, Clone)]
pub struct IntfRow {
    row: InterfaceRow,
}

impl IntfRow {
    /// Starts an empty row.
    pub fn new(name: &str) -> Self {
        Self {
            row: InterfaceRow::new(name),
        }
    }

    /// Adds a `user_config` key.
    pub fn user(mut self, key: &str, value: &str) -> Self {
        self.row.user_config.insert(key.to_string(), value.to_string());
        self
    }

    /// Adds a `hw_intf_info` key.
    pub fn hw(mut self, key: &str, value: &str) -> Self {
        self.row.hw_intf_info.insert(key.to_string(), value.to_string());
        self
    }

    /// Adds a `pm_info` key.
    pub fn pm(mut self, key: &str, value: &str) -> Self {
        self.row.pm_info.insert(key.to_string(), value.to_string());
        self
    }

    /// Sets the interface type.
    pub fn kind(mut self, intf_type: &str) -> Self {
        self.row.intf_type = intf_type.to_string();
        self
    }

    /// Sets `bond_status:state`.
    pub fn bond(mut self, state: &str) -> Self {
        self.row
            .bond_status
            .insert("state".to_string(), state.to_string());
        self
    }

    /// Sets the split parent.
    pub fn parent(mut self, parent: &str) -> Self {
        self.row.split_parent = Some(parent.to_string());
        self
    }

    /// Sets the split children.
    pub fn children(mut self, children: &[&str]) -> Self {
        self.row.split_children = children.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn build(self) -> InterfaceRow {
        self.row
    }
}

/// Pluggable SFP+ cage supporting 1G and 10G, admin up.
pub fn sfp_cage(name: &str) -> IntfRow {
    IntfRow::new(name)
        .user("admin", "up")
        .hw("pluggable", "true")
        .hw("connector", "SFP_PLUS")
        .hw("speeds", "1000,10000")
        .hw("max_speed", "10000")
}

/// SFP+ cage with a supported direct-attach cable.
pub fn sfp_dac(name: &str) -> IntfRow {
    sfp_cage(name)
        .pm("connector", "SFP_DAC")
        .pm("connector_status", "supported")
}

/// QSFP28 cage with a supported SR4 module, splittable into four children.
pub fn qsfp28_parent(name: &str) -> IntfRow {
    let children: Vec<String> = (1..=4).map(|i| format!("{}-{}", name, i)).collect();
    let children: Vec<&str> = children.iter().map(String::as_str).collect();
    IntfRow::new(name)
        .user("admin", "up")
        .hw("pluggable", "true")
        .hw("connector", "QSFP28")
        .hw("speeds", "40000,100000")
        .hw("max_speed", "100000")
        .hw("split_4", "true")
        .pm("connector", "QSFP28_SR4")
        .pm("connector_status", "supported")
        .children(&children)
}

/// Split child of `parent`, admin up.
pub fn split_child(parent: &str, index: u32) -> IntfRow {
    IntfRow::new(&format!("{}-{}", parent, index))
        .user("admin", "up")
        .hw("pluggable", "true")
        .hw("speeds", "10000,25000")
        .hw("max_speed", "25000")
        .parent(parent)
}

/// Subsystem row advertising a maximum MTU.
pub fn base_subsystem(max_mtu: u32) -> SubsystemRow {
    SubsystemRow {
        name: "base".to_string(),
        other_info: ColumnMap::from([(
            "max_transmission_unit".to_string(),
            max_mtu.to_string(),
        )]),
    }
}

/// Store with the system configured and a 9216 maximum MTU.
pub fn ready_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.set_cur_cfg(1);
    store.upsert_subsystem(base_subsystem(9216));
    store
}

/// Port owning the given interfaces with admin unset (up).
pub fn port(name: &str, members: &[&str]) -> PortRow {
    PortRow::new(name, members.iter().copied())
}

/// Manager with a short poll timeout.
pub fn manager() -> IntfMgr {
    let mut config = IntfdConfig::default();
    config.store.poll_timeout_ms = 10;
    IntfMgr::new(config)
}

/// Runs one pass and returns its outcome.
pub async fn pass(mgr: &mut IntfMgr, store: &mut MemoryStore) -> PassOutcome {
    mgr.run_once(store).await.expect("pass failed")
}

/// Reads one key of a column map as `&str`.
pub fn get<'a>(map: &'a ColumnMap, key: &str) -> Option<&'a str> {
    map.get(key).map(String::as_str)
}
