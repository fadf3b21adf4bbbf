//! Config normalizer.
//!
//! Parses the raw string maps of an interface row into typed values with
//! documented defaults. Parsing never fails: unknown values fall back to
//! the default and rejected lists or MTUs become the invalid sentinel, which
//! the derivation engine later reports as a disable reason.

use tracing::{debug, warn};

use sonic_intfd_store::{ColumnMap, SubsystemRow};

use crate::capability::{CapabilityFlags, Connector, ConnectorStatus, HwConnector};
use crate::tables::{self, hw_intf_info, other_info, pm_info, user_config, values};
use crate::types::{
    AdminState, AutonegPreference, Duplex, InterfaceType, LaneSplit, Mtu, PauseMode, SpeedList,
};

/// Declarative per-interface configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserConfig {
    pub admin: AdminState,
    pub autoneg: AutonegPreference,
    pub pause: PauseMode,
    pub duplex: Duplex,
    /// User speeds; empty means "not specified".
    pub speeds: SpeedList,
    pub mtu: Mtu,
    pub lane_split: LaneSplit,
}

impl UserConfig {
    /// Parses `user_config`, validating speeds against the hardware and the
    /// MTU against the subsystem maximum.
    pub fn parse(map: &ColumnMap, hw: &HardwareInfo, max_mtu: u32) -> Self {
        let admin = match map.get(user_config::ADMIN).map(String::as_str) {
            Some(values::UP) => AdminState::Up,
            _ => AdminState::Down,
        };

        let autoneg = map
            .get(user_config::AUTONEG)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        let pause = map
            .get(user_config::PAUSE)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        let duplex = match map.get(user_config::DUPLEX).map(String::as_str) {
            Some("half") => Duplex::Half,
            _ => Duplex::Full,
        };

        let speeds = map
            .get(user_config::SPEEDS)
            .map(|v| validate_user_speeds(parse_speeds(v), &hw.speeds))
            .unwrap_or_default();

        let mtu = map
            .get(user_config::MTU)
            .map_or(Mtu::Unset, |v| parse_mtu(v, max_mtu));

        let lane_split = match map.get(user_config::LANE_SPLIT).map(String::as_str) {
            Some("split") => LaneSplit::Split,
            _ => LaneSplit::NoSplit,
        };

        Self {
            admin,
            autoneg,
            pause,
            duplex,
            speeds,
            mtu,
            lane_split,
        }
    }
}

/// Static hardware description of an interface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HardwareInfo {
    pub pluggable: bool,
    pub connector: HwConnector,
    /// Speeds the cage supports.
    pub speeds: SpeedList,
    pub max_speed: u32,
    pub split_4: bool,
    /// Capability bits summarising the fields above.
    pub capabilities: CapabilityFlags,
}

impl HardwareInfo {
    /// Parses `hw_intf_info`.
    pub fn parse(map: &ColumnMap) -> Self {
        let pluggable = is_true(map.get(hw_intf_info::PLUGGABLE));

        let connector = map
            .get(hw_intf_info::CONNECTOR)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        let speeds = map
            .get(hw_intf_info::SPEEDS)
            .map(|v| parse_speeds(v))
            .unwrap_or_default();
        if speeds.first().is_none() {
            warn!("value for speeds not set in hardware description");
        }

        let max_speed = map
            .get(hw_intf_info::MAX_SPEED)
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        if max_speed == 0 {
            warn!("value for max_speed not set in hardware description");
        }

        let split_4 = is_true(map.get(hw_intf_info::SPLIT_4));
        let capabilities =
            CapabilityFlags::from_hardware(pluggable, speeds.speeds().unwrap_or_default(), split_4);

        Self {
            pluggable,
            connector,
            speeds,
            max_speed,
            split_4,
            capabilities,
        }
    }
}

/// What the module-detection daemon reported for a cage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleReport {
    pub connector: Connector,
    pub status: ConnectorStatus,
    /// Raw `supported_speeds` value, consulted when splitting.
    pub supported_speeds: Option<String>,
}

impl ModuleReport {
    /// Parses `pm_info`.
    pub fn parse(map: &ColumnMap) -> Self {
        let status = match map.get(pm_info::CONNECTOR_STATUS).map(String::as_str) {
            Some("supported") => ConnectorStatus::Supported,
            Some("unsupported") => ConnectorStatus::Unsupported,
            _ => ConnectorStatus::Unrecognized,
        };

        let connector = map
            .get(pm_info::CONNECTOR)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        Self {
            connector,
            status,
            supported_speeds: map.get(pm_info::SUPPORTED_SPEEDS).cloned(),
        }
    }
}

/// Parses a comma-separated speed list.
///
/// Empty tokens are skipped. Any non-numeric token, or more than
/// [`tables::MAX_SPEEDS`] entries, makes the list invalid.
pub fn parse_speeds(value: &str) -> SpeedList {
    let mut speeds = Vec::new();
    for token in value.split(',').filter(|t| !t.is_empty()) {
        if speeds.len() == tables::MAX_SPEEDS {
            debug!("speed list {:?} has more than {} entries", value, tables::MAX_SPEEDS);
            return SpeedList::Invalid;
        }
        match parse_number(token) {
            Some(speed) => speeds.push(speed),
            None => {
                debug!("speed {:?} is not a number", token);
                return SpeedList::Invalid;
            }
        }
    }
    SpeedList::Valid(speeds)
}

/// Checks a user speed list against the hardware-advertised list.
///
/// The user list may not be longer than the hardware list and every entry
/// must appear in it.
pub fn validate_user_speeds(user: SpeedList, hw: &SpeedList) -> SpeedList {
    let Some(user_speeds) = user.speeds() else {
        return SpeedList::Invalid;
    };
    if user_speeds.is_empty() {
        return user;
    }
    let hw_speeds = hw.speeds().unwrap_or_default();
    if user_speeds.len() > hw_speeds.len() {
        debug!("more user speeds than hardware speeds");
        return SpeedList::Invalid;
    }
    if let Some(bad) = user_speeds.iter().find(|s| !hw_speeds.contains(s)) {
        debug!("speed {} not supported by hardware", bad);
        return SpeedList::Invalid;
    }
    user
}

/// Parses a user MTU against the subsystem maximum.
pub fn parse_mtu(value: &str, max_mtu: u32) -> Mtu {
    // An empty string counts as zero, which is below the minimum.
    let mtu = if value.is_empty() {
        Some(0)
    } else {
        parse_number(value)
    };
    match mtu {
        Some(mtu) if (tables::MIN_MTU..=max_mtu).contains(&mtu) => Mtu::Value(mtu),
        _ => {
            debug!("mtu {:?} outside {}..={}", value, tables::MIN_MTU, max_mtu);
            Mtu::Invalid
        }
    }
}

/// Parses the `type` column; unknown types are treated as physical.
pub fn parse_interface_type(value: &str) -> InterfaceType {
    value.parse().unwrap_or_else(|e| {
        debug!("{}, treating as system", e);
        InterfaceType::System
    })
}

/// Parses a port's `admin` column. An unset column means up.
pub fn parse_port_admin(admin: Option<&str>) -> AdminState {
    match admin {
        None | Some(values::UP) => AdminState::Up,
        Some(_) => AdminState::Down,
    }
}

/// Reads the maximum MTU from a subsystem row (zero when absent).
pub fn parse_max_mtu(subsystem: &SubsystemRow) -> u32 {
    let max_mtu = subsystem
        .other_info
        .get(other_info::MAX_TRANSMISSION_UNIT)
        .and_then(|v| parse_number(v))
        .unwrap_or(0);
    if max_mtu < tables::MIN_MTU {
        warn!(
            "Subsystem {} max MTU {} is below the minimum {}",
            subsystem.name,
            max_mtu,
            tables::MIN_MTU
        );
    }
    max_mtu
}

fn parse_number(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn is_true(value: Option<&String>) -> bool {
    value.map(String::as_str) == Some(values::TRUE)
}
