//! Table, column and key constants for intfd.
//!
//! These match the store schema consumed and produced by the daemon.

/// Interface table.
pub const INTERFACE_TABLE_NAME: &str = "Interface";

/// Port table.
pub const PORT_TABLE_NAME: &str = "Port";

/// Subsystem table.
pub const SUBSYSTEM_TABLE_NAME: &str = "Subsystem";

/// System table.
pub const SYSTEM_TABLE_NAME: &str = "System";

/// Subsystem whose `other_info` carries the maximum MTU.
pub const DEFAULT_SUBSYSTEM: &str = "base";

/// Name of the store lock held while writing.
pub const DEFAULT_LOCK_NAME: &str = "ops_intfd";

/// Smallest MTU accepted from the user and written to hardware.
pub const MIN_MTU: u32 = 576;

/// MTU applied when the user did not configure one.
pub const DEFAULT_MTU: u32 = 1500;

/// Maximum number of entries in a speed list.
pub const MAX_SPEEDS: usize = 10;

/// Maximum number of split children of a splittable interface.
pub const MAX_SPLIT_COUNT: usize = 4;

/// Speeds in Mb/s.
pub mod speed {
    pub const SPEED_1G: u32 = 1_000;
    pub const SPEED_10G: u32 = 10_000;
    pub const SPEED_25G: u32 = 25_000;
    pub const SPEED_40G: u32 = 40_000;
    pub const SPEED_50G: u32 = 50_000;
    pub const SPEED_100G: u32 = 100_000;
}

/// Keys of `Interface.user_config`.
pub mod user_config {
    pub const ADMIN: &str = "admin";
    pub const AUTONEG: &str = "autoneg";
    pub const SPEEDS: &str = "speeds";
    pub const MTU: &str = "mtu";
    pub const PAUSE: &str = "pause";
    pub const DUPLEX: &str = "duplex";
    pub const LANE_SPLIT: &str = "lane_split";
}

/// Keys of `Interface.hw_intf_info`.
pub mod hw_intf_info {
    pub const PLUGGABLE: &str = "pluggable";
    pub const CONNECTOR: &str = "connector";
    pub const SPEEDS: &str = "speeds";
    pub const MAX_SPEED: &str = "max_speed";
    pub const SPLIT_4: &str = "split_4";
}

/// Keys of `Interface.pm_info`.
pub mod pm_info {
    pub const CONNECTOR: &str = "connector";
    pub const CONNECTOR_STATUS: &str = "connector_status";
    pub const SUPPORTED_SPEEDS: &str = "supported_speeds";
}

/// Keys of `Interface.hw_intf_config`.
pub mod hw_intf_config {
    pub const ENABLE: &str = "enable";
    pub const AUTONEG: &str = "autoneg";
    pub const DUPLEX: &str = "duplex";
    pub const PAUSE: &str = "pause";
    pub const MTU: &str = "mtu";
    pub const SPEEDS: &str = "speeds";
    pub const INTERFACE_TYPE: &str = "interface_type";
}

/// Keys of `Interface.forwarding_state`.
pub mod forwarding_state {
    /// Overall forwarding permission of the interface.
    pub const FORWARDING: &str = "forwarding";
    pub const AGGREGATION_FORWARDING: &str = "interface_aggregation_forwarding";
    pub const AGGREGATION_BLOCKED_REASON: &str = "interface_aggregation_blocked_reason";
}

/// Keys of `Interface.bond_status`.
pub mod bond_status {
    pub const STATE: &str = "state";
}

/// Keys of `Interface.hw_status`.
pub mod hw_status {
    pub const READY: &str = "ready";
}

/// Keys of `Subsystem.other_info`.
pub mod other_info {
    pub const MAX_TRANSMISSION_UNIT: &str = "max_transmission_unit";
}

/// Common column values.
pub mod values {
    pub const TRUE: &str = "true";
    pub const FALSE: &str = "false";
    pub const UP: &str = "up";
    pub const DOWN: &str = "down";
    pub const ON: &str = "on";
    pub const OFF: &str = "off";
}
