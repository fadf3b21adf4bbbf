//! Split-hierarchy manager.
//!
//! A splittable interface (parent) owns up to four child interfaces that
//! share its lanes. Children have no module of their own: their transceiver
//! is the parent's module reinterpreted per lane. Links are names; a
//! missing counterpart is logged and picked up again when it appears.

use tracing::{debug, warn};

use crate::capability::{self, TransceiverInfo};
use crate::registry::Registry;
use crate::tables::MAX_SPLIT_COUNT;
use crate::types::LaneSplit;

/// Returns the transceiver an interface should use.
///
/// A split child with a present parent takes the parent's module; anything
/// else (including a child whose parent is not registered yet) uses its own.
pub fn effective_transceiver(registry: &Registry, name: &str) -> Option<TransceiverInfo> {
    let entity = registry.interface(name)?;
    let parent = entity
        .split_parent
        .as_deref()
        .and_then(|p| registry.interface(p));

    Some(match parent {
        Some(parent) => capability::resolve_split_child(&parent.module),
        None => capability::resolve_transceiver(&entity.hw, &entity.module),
    })
}

/// Returns the lane-split setting of an interface's present split parent.
pub fn parent_lane_split(registry: &Registry, name: &str) -> Option<LaneSplit> {
    let parent = registry.interface(name)?.split_parent.as_deref()?;
    registry.interface(parent).map(|p| p.user.lane_split)
}

/// Resolves the split links of a newly observed interface.
///
/// Returns the names of already-registered children whose transceiver was
/// re-resolved because their parent just appeared; they need re-deriving.
pub fn link(registry: &mut Registry, name: &str) -> Vec<String> {
    let Some(entity) = registry.interface(name) else {
        return Vec::new();
    };
    let parent = entity.split_parent.clone();
    let children = entity.split_children.clone();

    if let Some(parent) = parent {
        match registry.interface(&parent) {
            Some(p) => {
                if !p.split_children.iter().any(|c| c == name) {
                    warn!("Parent {} does not list {} as a split child", parent, name);
                }
                refresh_transceiver(registry, name);
            }
            None => warn!("Could not find split parent {} of {}", parent, name),
        }
    }

    if children.len() > MAX_SPLIT_COUNT {
        warn!(
            "Interface {} lists {} split children, expected at most {}",
            name,
            children.len(),
            MAX_SPLIT_COUNT
        );
    }

    let mut resolved = Vec::new();
    for child in children {
        match registry.interface(&child) {
            Some(c) => {
                if c.split_parent.as_deref() != Some(name) {
                    warn!("Split child {} does not point back to {}", child, name);
                    continue;
                }
                refresh_transceiver(registry, &child);
                resolved.push(child);
            }
            None => warn!("Could not find split child {} of {}", child, name),
        }
    }
    resolved
}

/// Re-resolves every present child's transceiver from the parent's module.
///
/// Returns the children that are present and need re-deriving.
pub fn refresh_children(registry: &mut Registry, parent: &str) -> Vec<String> {
    let Some(entity) = registry.interface(parent) else {
        return Vec::new();
    };
    let children = entity.split_children.clone();

    children
        .into_iter()
        .filter(|child| {
            if registry.contains_interface(child) {
                refresh_transceiver(registry, child);
                true
            } else {
                debug!("Split child {} of {} not present", child, parent);
                false
            }
        })
        .collect()
}

/// Recomputes and stores an interface's transceiver. Returns true if it
/// changed.
pub fn refresh_transceiver(registry: &mut Registry, name: &str) -> bool {
    let Some(transceiver) = effective_transceiver(registry, name) else {
        return false;
    };
    match registry.interface_mut(name) {
        Some(entity) if entity.transceiver != transceiver => {
            entity.transceiver = transceiver;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Connector;
    use crate::registry::InterfaceEntity;
    use sonic_intfd_store::InterfaceRow;

    fn parent_row(connector: &str) -> InterfaceRow {
        let mut row = InterfaceRow::new("49");
        row.hw_intf_info
            .insert("pluggable".to_string(), "true".to_string());
        row.pm_info
            .insert("connector".to_string(), connector.to_string());
        row.pm_info
            .insert("connector_status".to_string(), "supported".to_string());
        row.split_children = vec!["49-1".to_string(), "49-2".to_string()];
        row
    }

    fn child_row(name: &str) -> InterfaceRow {
        let mut row = InterfaceRow::new(name);
        row.hw_intf_info
            .insert("pluggable".to_string(), "true".to_string());
        row.split_parent = Some("49".to_string());
        row
    }

    fn insert(registry: &mut Registry, row: &InterfaceRow) {
        registry
            .insert_interface(InterfaceEntity::from_row(row, 9216))
            .unwrap();
    }

    #[test]
    fn test_child_before_parent_is_resolved_when_parent_appears() {
        let mut registry = Registry::new();
        insert(&mut registry, &child_row("49-1"));
        assert!(link(&mut registry, "49-1").is_empty());
        assert_eq!(
            registry.interface("49-1").unwrap().transceiver.connector,
            Connector::Unknown
        );

        insert(&mut registry, &parent_row("QSFP_SR4"));
        let resolved = link(&mut registry, "49");
        assert_eq!(resolved, vec!["49-1"]);
        assert_eq!(
            registry.interface("49-1").unwrap().transceiver.connector,
            Connector::SfpSr
        );
    }

    #[test]
    fn test_parent_lane_split() {
        let mut registry = Registry::new();
        let mut parent = parent_row("QSFP_SR4");
        parent
            .user_config
            .insert("lane_split".to_string(), "split".to_string());
        insert(&mut registry, &parent);
        insert(&mut registry, &child_row("49-1"));

        assert_eq!(parent_lane_split(&registry, "49-1"), Some(LaneSplit::Split));
        assert_eq!(parent_lane_split(&registry, "49"), None);
        assert_eq!(parent_lane_split(&registry, "missing"), None);
    }

    #[test]
    fn test_refresh_children_after_module_change() {
        let mut registry = Registry::new();
        insert(&mut registry, &parent_row("QSFP_SR4"));
        insert(&mut registry, &child_row("49-1"));
        link(&mut registry, "49-1");

        let parent = registry.interface_mut("49").unwrap();
        parent.module.connector = Connector::Qsfp28Cr4;

        let refreshed = refresh_children(&mut registry, "49");
        assert_eq!(refreshed, vec!["49-1"]);
        assert_eq!(
            registry.interface("49-1").unwrap().transceiver.connector,
            Connector::Sfp28Cr
        );
    }

    #[test]
    fn test_inconsistent_child_is_not_linked() {
        let mut registry = Registry::new();
        insert(&mut registry, &parent_row("QSFP_SR4"));
        let mut stray = child_row("49-2");
        stray.split_parent = Some("50".to_string());
        insert(&mut registry, &stray);

        assert!(link(&mut registry, "49").is_empty());
    }

    #[test]
    fn test_refresh_transceiver_reports_change() {
        let mut registry = Registry::new();
        insert(&mut registry, &parent_row("QSFP_LR4"));
        insert(&mut registry, &child_row("49-1"));

        assert!(refresh_transceiver(&mut registry, "49-1"));
        assert!(!refresh_transceiver(&mut registry, "49-1"));
        assert!(!refresh_transceiver(&mut registry, "missing"));
    }
}
