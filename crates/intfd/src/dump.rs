//! Developer dump of the in-memory interface state.

use std::fmt::Write;

use crate::registry::{InterfaceEntity, Registry};
use crate::types::SpeedList;

/// Renders one interface, or every interface when `name` is `None`.
///
/// An unknown name renders a single "not found" line.
pub fn render(registry: &Registry, name: Option<&str>) -> String {
    let mut out = String::new();
    match name {
        Some(name) => match registry.interface(name) {
            Some(entity) => render_interface(&mut out, entity),
            None => {
                let _ = writeln!(out, "Interface {} not found", name);
            }
        },
        None => {
            for entity in registry.interfaces() {
                render_interface(&mut out, entity);
            }
        }
    }
    out
}

fn speeds_or_unset(speeds: &SpeedList) -> String {
    if speeds.is_empty() {
        "unset".to_string()
    } else {
        speeds.to_string()
    }
}

fn render_interface(out: &mut String, entity: &InterfaceEntity) {
    let user = &entity.user;
    let oper = &entity.oper;

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Interface {}:", entity.name);
    let _ = writeln!(out, "    type               : {}", entity.intf_type);
    let _ = writeln!(out, "    admin              : {}", user.admin);
    let _ = writeln!(out, "    port_admin         : {}", entity.port_admin);
    let _ = writeln!(out, "    hw_enable          : {}", oper.enabled);
    let _ = writeln!(out, "    op_state_reason    : {}", oper.reason);
    let _ = writeln!(out, "    cfg_autoneg        : {}", user.autoneg);
    let _ = writeln!(out, "    autoneg_capability : {}", oper.autoneg_capability);
    let _ = writeln!(out, "    op_autoneg_state   : {}", oper.autoneg_state);
    let _ = writeln!(out, "    cfg_speeds         : {}", speeds_or_unset(&user.speeds));
    let _ = writeln!(out, "    op_speeds          : {}", speeds_or_unset(&oper.speeds));
    let _ = writeln!(out, "    cfg_mtu            : {}", user.mtu);
    let _ = writeln!(out, "    op_mtu             : {}", oper.mtu);
    let _ = writeln!(out, "    cfg_pause          : {}", user.pause);
    let _ = writeln!(out, "    cfg_duplex         : {}", user.duplex);
    let _ = writeln!(out, "    op_connector       : {}", entity.transceiver.connector);
    let _ = writeln!(out, "    connector_status   : {}", entity.transceiver.status);
    let _ = writeln!(out, "    hw_interface_type  : {}", entity.transceiver.intf_type);
    let _ = writeln!(out, "    pluggable          : {}", entity.hw.pluggable);
    let _ = writeln!(out, "    max_speed          : {}", entity.hw.max_speed);
    let _ = writeln!(out, "    capabilities       : {}", entity.hw.capabilities);
    let _ = writeln!(out, "    lane_split         : {}", user.lane_split);
    let _ = writeln!(
        out,
        "    split_parent       : {}",
        entity.split_parent.as_deref().unwrap_or("none")
    );
    if entity.split_children.is_empty() {
        let _ = writeln!(out, "    split_children     : none");
    } else {
        for (i, child) in entity.split_children.iter().enumerate() {
            let _ = writeln!(out, "    split_children[{}]  : {}", i, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonic_intfd_store::InterfaceRow;

    #[test]
    fn test_render_single_interface() {
        let mut registry = Registry::new();
        let mut row = InterfaceRow::new("49");
        row.split_children = vec!["49-1".to_string(), "49-2".to_string()];
        row.hw_intf_info = [
            ("pluggable", "true"),
            ("speeds", "40000,100000"),
            ("max_speed", "100000"),
            ("split_4", "true"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        registry
            .insert_interface(InterfaceEntity::from_row(&row, 9216))
            .unwrap();

        let out = render(&registry, Some("49"));
        assert!(out.starts_with("Interface 49:\n"));
        assert!(out.contains("    op_state_reason    : uninitialized\n"));
        assert!(out.contains("    cfg_speeds         : unset\n"));
        assert!(out.contains("    split_children[1]  : 49-2\n"));
        assert!(out.contains("    split_parent       : none\n"));
        assert!(out.contains("    pluggable          : true\n"));
        assert!(out.contains("    max_speed          : 100000\n"));
        assert!(out.contains("    capabilities       : 0xd1\n"));
    }

    #[test]
    fn test_render_all_and_missing() {
        let mut registry = Registry::new();
        for name in ["1", "2"] {
            registry
                .insert_interface(InterfaceEntity::from_row(&InterfaceRow::new(name), 9216))
                .unwrap();
        }

        let out = render(&registry, None);
        assert_eq!(out.matches("Interface ").count(), 2);
        assert_eq!(render(&registry, Some("9")), "Interface 9 not found\n");
    }
}
