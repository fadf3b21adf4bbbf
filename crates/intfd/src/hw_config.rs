//! Rendering of the derived state into the hardware-config columns.

use sonic_intfd_store::ColumnMap;

use crate::registry::InterfaceEntity;
use crate::tables::{hw_intf_config, values, MIN_MTU};
use crate::types::AutonegState;

/// Builds `hw_intf_config` for an interface from its operational state.
///
/// `enable` is always present. The link parameters are only written for
/// enabled physical interfaces.
pub fn build(entity: &InterfaceEntity) -> ColumnMap {
    let oper = &entity.oper;
    let mut map = ColumnMap::new();

    map.insert(
        hw_intf_config::ENABLE.to_string(),
        bool_value(oper.enabled).to_string(),
    );
    if !oper.enabled || entity.intf_type.is_logical() {
        return map;
    }

    let autoneg = if oper.autoneg_state == AutonegState::Enabled {
        values::ON
    } else {
        values::OFF
    };
    map.insert(hw_intf_config::AUTONEG.to_string(), autoneg.to_string());
    map.insert(hw_intf_config::DUPLEX.to_string(), oper.duplex.to_string());
    map.insert(hw_intf_config::PAUSE.to_string(), oper.pause.to_string());

    if let Some(mtu) = oper.mtu.value().filter(|mtu| *mtu >= MIN_MTU) {
        map.insert(hw_intf_config::MTU.to_string(), mtu.to_string());
    }
    if oper.speeds.speeds().is_some_and(|s| !s.is_empty()) {
        map.insert(hw_intf_config::SPEEDS.to_string(), oper.speeds.to_string());
    }
    map.insert(
        hw_intf_config::INTERFACE_TYPE.to_string(),
        entity.transceiver.intf_type.to_string(),
    );
    map
}

/// Value of the `error` column: the disable reason, or none when enabled.
pub fn error_value(entity: &InterfaceEntity) -> Option<String> {
    if entity.oper.enabled {
        None
    } else {
        Some(entity.oper.reason.as_str().to_string())
    }
}

fn bool_value(value: bool) -> &'static str {
    if value {
        values::TRUE
    } else {
        values::FALSE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Connector, ConnectorStatus, PhyInterfaceType};
    use crate::types::{DisableReason, InterfaceType, Mtu, PauseMode, SpeedList};
    use pretty_assertions::assert_eq;

    fn enabled_entity() -> InterfaceEntity {
        let mut entity = InterfaceEntity {
            name: "1".to_string(),
            ..Default::default()
        };
        entity.transceiver.connector = Connector::SfpDac;
        entity.transceiver.status = ConnectorStatus::Supported;
        entity.transceiver.intf_type = PhyInterfaceType::Base10gCr;
        entity.oper.enabled = true;
        entity.oper.reason = DisableReason::Ok;
        entity.oper.mtu = Mtu::Value(1500);
        entity.oper.speeds = SpeedList::Valid(vec![10_000]);
        entity.oper.pause = PauseMode::RxTx;
        entity
    }

    #[test]
    fn test_enabled_physical_interface() {
        let entity = enabled_entity();
        let expected = ColumnMap::from([
            ("autoneg".to_string(), "off".to_string()),
            ("duplex".to_string(), "full".to_string()),
            ("enable".to_string(), "true".to_string()),
            ("interface_type".to_string(), "10GBASE_CR".to_string()),
            ("mtu".to_string(), "1500".to_string()),
            ("pause".to_string(), "rxtx".to_string()),
            ("speeds".to_string(), "10000".to_string()),
        ]);
        assert_eq!(build(&entity), expected);
        assert_eq!(error_value(&entity), None);
    }

    #[test]
    fn test_disabled_interface_only_enable() {
        let mut entity = enabled_entity();
        entity.oper.enabled = false;
        entity.oper.reason = DisableReason::ModuleMissing;
        assert_eq!(
            build(&entity),
            ColumnMap::from([("enable".to_string(), "false".to_string())])
        );
        assert_eq!(error_value(&entity).as_deref(), Some("module_missing"));
    }

    #[test]
    fn test_logical_interface_only_enable() {
        let mut entity = enabled_entity();
        entity.intf_type = InterfaceType::Loopback;
        let map = build(&entity);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("enable").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_empty_speeds_omitted() {
        let mut entity = enabled_entity();
        entity.oper.speeds = SpeedList::Valid(Vec::new());
        entity.oper.autoneg_state = AutonegState::Enabled;
        let map = build(&entity);
        assert!(!map.contains_key("speeds"));
        assert_eq!(map.get("autoneg").map(String::as_str), Some("on"));
    }
}
