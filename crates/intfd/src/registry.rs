//! Interface and port registry.
//!
//! Entities are keyed by name. Insertion never silently replaces an
//! existing entity and lookups never create one. Cross-references (split
//! parent/children, port members) are stored as names and resolved on use.

use std::collections::BTreeMap;

use tracing::debug;

use sonic_intfd_store::{ColumnMap, InterfaceRow, PortRow};

use crate::arbiter::LayerState;
use crate::capability::{self, TransceiverInfo};
use crate::error::{IntfdError, IntfdResult};
use crate::normalizer::{self, HardwareInfo, ModuleReport, UserConfig};
use crate::tables::{bond_status, hw_status, values, INTERFACE_TABLE_NAME, PORT_TABLE_NAME};
use crate::types::{
    AdminState, AutonegCapability, AutonegState, DisableReason, Duplex, InterfaceType, Mtu,
    PauseMode, SpeedList,
};

/// Operational state derived for an interface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperState {
    pub enabled: bool,
    pub reason: DisableReason,
    pub duplex: Duplex,
    pub pause: PauseMode,
    pub autoneg_capability: AutonegCapability,
    pub autoneg_state: AutonegState,
    /// Reason reported when `autoneg_state` is invalid.
    pub autoneg_reason: Option<DisableReason>,
    pub mtu: Mtu,
    pub speeds: SpeedList,
}

/// Everything intfd knows about one interface.
#[derive(Debug, Clone, Default)]
pub struct InterfaceEntity {
    pub name: String,
    pub intf_type: InterfaceType,
    /// Raw `user_config`, kept so the config can be re-normalized when the
    /// subsystem MTU limit changes.
    pub user_config_map: ColumnMap,
    pub user: UserConfig,
    pub hw: HardwareInfo,
    /// This row's own module report.
    pub module: ModuleReport,
    /// Transceiver in effect (the parent's, reinterpreted, for split children).
    pub transceiver: TransceiverInfo,
    pub oper: OperState,
    /// Admin state of the owning port.
    pub port_admin: AdminState,
    pub split_parent: Option<String>,
    pub split_children: Vec<String>,
    /// `bond_status:state`, consulted by the LACP protocol.
    pub bond_state: Option<String>,
    /// `hw_status:ready == "true"`.
    pub hw_ready: bool,
    /// Per-layer arbiter state, outward from the medium.
    pub layers: Vec<LayerState>,
    /// Last forwarding-state map written (or read on creation).
    pub forwarding_state: ColumnMap,
    /// Last hardware-config map written (or read on creation).
    pub hw_intf_config: ColumnMap,
    /// Last `error` value written (or read on creation).
    pub error: Option<String>,
}

impl InterfaceEntity {
    /// Builds an entity from its first observed row.
    pub fn from_row(row: &InterfaceRow, max_mtu: u32) -> Self {
        let hw = HardwareInfo::parse(&row.hw_intf_info);
        let user = UserConfig::parse(&row.user_config, &hw, max_mtu);
        let module = ModuleReport::parse(&row.pm_info);
        let transceiver = capability::resolve_transceiver(&hw, &module);

        Self {
            name: row.name.clone(),
            intf_type: normalizer::parse_interface_type(&row.intf_type),
            user_config_map: row.user_config.clone(),
            user,
            hw,
            module,
            transceiver,
            oper: OperState::default(),
            port_admin: AdminState::Down,
            split_parent: row.split_parent.clone(),
            split_children: row.split_children.clone(),
            bond_state: row.bond_status.get(bond_status::STATE).cloned(),
            hw_ready: row.hw_status.get(hw_status::READY).map(String::as_str) == Some(values::TRUE),
            layers: Vec::new(),
            forwarding_state: row.forwarding_state.clone(),
            hw_intf_config: row.hw_intf_config.clone(),
            error: row.error.clone(),
        }
    }

    /// Returns true if this interface is a split child.
    pub fn is_split_child(&self) -> bool {
        self.split_parent.is_some()
    }

    /// Returns true if this interface has split children.
    pub fn is_split_parent(&self) -> bool {
        !self.split_children.is_empty()
    }
}

/// A port (bridge/routing port) grouping member interfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEntity {
    pub name: String,
    pub admin: AdminState,
    pub members: Vec<String>,
}

impl PortEntity {
    /// Builds a port entity from its row.
    pub fn from_row(row: &PortRow) -> Self {
        Self {
            name: row.name.clone(),
            admin: normalizer::parse_port_admin(row.admin.as_deref()),
            members: row.interfaces.clone(),
        }
    }

    /// Returns true if the interface is a member of this port.
    pub fn has_member(&self, interface: &str) -> bool {
        self.members.iter().any(|m| m == interface)
    }
}

/// Name-keyed store of interfaces and ports.
#[derive(Debug, Default)]
pub struct Registry {
    interfaces: BTreeMap<String, InterfaceEntity>,
    ports: BTreeMap<String, PortEntity>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new interface. Fails if the name is already registered.
    pub fn insert_interface(&mut self, entity: InterfaceEntity) -> IntfdResult<()> {
        if self.interfaces.contains_key(&entity.name) {
            return Err(IntfdError::duplicate_entry(INTERFACE_TABLE_NAME, &entity.name));
        }
        debug!("Registered interface {}", entity.name);
        self.interfaces.insert(entity.name.clone(), entity);
        Ok(())
    }

    /// Removes an interface, returning it if it existed.
    pub fn remove_interface(&mut self, name: &str) -> Option<InterfaceEntity> {
        self.interfaces.remove(name)
    }

    /// Returns the interface with the given name.
    pub fn interface(&self, name: &str) -> Option<&InterfaceEntity> {
        self.interfaces.get(name)
    }

    /// Returns a mutable reference to the interface with the given name.
    pub fn interface_mut(&mut self, name: &str) -> Option<&mut InterfaceEntity> {
        self.interfaces.get_mut(name)
    }

    /// Returns a mutable reference or an entry-not-found error.
    pub fn require_interface_mut(&mut self, name: &str) -> IntfdResult<&mut InterfaceEntity> {
        self.interfaces
            .get_mut(name)
            .ok_or_else(|| IntfdError::entry_not_found(INTERFACE_TABLE_NAME, name))
    }

    /// Returns true if the interface is registered.
    pub fn contains_interface(&self, name: &str) -> bool {
        self.interfaces.contains_key(name)
    }

    /// Iterates interfaces in name order.
    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceEntity> {
        self.interfaces.values()
    }

    /// Iterates interfaces mutably in name order.
    pub fn interfaces_mut(&mut self) -> impl Iterator<Item = &mut InterfaceEntity> {
        self.interfaces.values_mut()
    }

    /// Returns the number of registered interfaces.
    pub fn interface_count(&self) -> usize {
        self.interfaces.len()
    }

    /// Inserts a new port. Fails if the name is already registered.
    pub fn insert_port(&mut self, port: PortEntity) -> IntfdResult<()> {
        if self.ports.contains_key(&port.name) {
            return Err(IntfdError::duplicate_entry(PORT_TABLE_NAME, &port.name));
        }
        debug!("Registered port {}", port.name);
        self.ports.insert(port.name.clone(), port);
        Ok(())
    }

    /// Replaces an existing port, returning the previous entity.
    pub fn replace_port(&mut self, port: PortEntity) -> IntfdResult<PortEntity> {
        match self.ports.get_mut(&port.name) {
            Some(existing) => Ok(std::mem::replace(existing, port)),
            None => Err(IntfdError::entry_not_found(PORT_TABLE_NAME, &port.name)),
        }
    }

    /// Removes a port, returning it if it existed.
    pub fn remove_port(&mut self, name: &str) -> Option<PortEntity> {
        self.ports.remove(name)
    }

    /// Returns the port with the given name.
    pub fn port(&self, name: &str) -> Option<&PortEntity> {
        self.ports.get(name)
    }

    /// Returns the number of registered ports.
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Returns the first port (in name order) listing the interface.
    pub fn owning_port(&self, interface: &str) -> Option<&PortEntity> {
        self.ports.values().find(|p| p.has_member(interface))
    }

    /// Returns the admin state an interface inherits from its port.
    ///
    /// An interface no port claims is treated as port-admin down.
    pub fn port_admin_of(&self, interface: &str) -> AdminState {
        self.owning_port(interface)
            .map_or(AdminState::Down, |p| p.admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str) -> InterfaceRow {
        let mut row = InterfaceRow::new(name);
        row.user_config
            .insert("admin".to_string(), "up".to_string());
        row
    }

    #[test]
    fn test_insert_refuses_duplicates() {
        let mut registry = Registry::new();
        registry
            .insert_interface(InterfaceEntity::from_row(&row("1"), 9216))
            .unwrap();
        let err = registry
            .insert_interface(InterfaceEntity::from_row(&row("1"), 9216))
            .unwrap_err();
        assert!(matches!(err, IntfdError::DuplicateEntry { .. }));
        assert_eq!(registry.interface_count(), 1);
    }

    #[test]
    fn test_lookup_does_not_create() {
        let mut registry = Registry::new();
        assert!(registry.interface("missing").is_none());
        assert!(registry.interface_mut("missing").is_none());
        assert!(registry.require_interface_mut("missing").is_err());
        assert_eq!(registry.interface_count(), 0);
    }

    #[test]
    fn test_entity_from_row() {
        let mut r = row("49");
        r.split_children = vec!["49-1".to_string(), "49-2".to_string()];
        r.bond_status.insert("state".to_string(), "down".to_string());
        r.hw_status.insert("ready".to_string(), "true".to_string());
        r.intf_type = "system".to_string();

        let entity = InterfaceEntity::from_row(&r, 9216);
        assert_eq!(entity.user.admin, AdminState::Up);
        assert!(entity.is_split_parent());
        assert!(!entity.is_split_child());
        assert_eq!(entity.bond_state.as_deref(), Some("down"));
        assert!(entity.hw_ready);
        assert_eq!(entity.oper.reason, DisableReason::Uninitialized);
    }

    #[test]
    fn test_port_admin_of() {
        let mut registry = Registry::new();
        registry
            .insert_port(PortEntity::from_row(&PortRow::new("p1", ["1", "2"])))
            .unwrap();
        registry
            .insert_port(PortEntity::from_row(
                &PortRow::new("p2", ["3"]).with_admin("down"),
            ))
            .unwrap();

        assert_eq!(registry.port_admin_of("1"), AdminState::Up);
        assert_eq!(registry.port_admin_of("3"), AdminState::Down);
        assert_eq!(registry.port_admin_of("9"), AdminState::Down);
        assert_eq!(registry.owning_port("2").map(|p| p.name.as_str()), Some("p1"));
    }

    #[test]
    fn test_replace_port() {
        let mut registry = Registry::new();
        assert!(registry
            .replace_port(PortEntity::from_row(&PortRow::new("p1", ["1"])))
            .is_err());

        registry
            .insert_port(PortEntity::from_row(&PortRow::new("p1", ["1"])))
            .unwrap();
        let old = registry
            .replace_port(PortEntity::from_row(&PortRow::new("p1", ["2"])))
            .unwrap();
        assert_eq!(old.members, vec!["1"]);
        assert!(registry.port("p1").unwrap().has_member("2"));
    }
}
