//! Value types shared by the normalizer, the derivation engine and the
//! hardware-config writer.

use std::fmt;
use std::str::FromStr;

/// Administrative state of an interface or port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AdminState {
    /// Administratively up.
    Up,
    /// Administratively down.
    #[default]
    Down,
}

impl fmt::Display for AdminState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

impl FromStr for AdminState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(format!("Unknown admin state: {}", s)),
        }
    }
}

/// User preference for autonegotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AutonegPreference {
    /// Not configured; the hardware capability decides.
    #[default]
    Unset,
    /// Autonegotiation requested.
    On,
    /// Autonegotiation refused.
    Off,
}

impl fmt::Display for AutonegPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "default"),
            Self::On => write!(f, "on"),
            Self::Off => write!(f, "off"),
        }
    }
}

impl FromStr for AutonegPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "default" => Ok(Self::Unset),
            _ => Err(format!("Unknown autoneg value: {}", s)),
        }
    }
}

/// Flow-control (pause frame) mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PauseMode {
    /// No pause frames.
    #[default]
    None,
    /// Receive only.
    Rx,
    /// Transmit only.
    Tx,
    /// Receive and transmit.
    RxTx,
}

impl fmt::Display for PauseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Rx => write!(f, "rx"),
            Self::Tx => write!(f, "tx"),
            Self::RxTx => write!(f, "rxtx"),
        }
    }
}

impl FromStr for PauseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "rx" => Ok(Self::Rx),
            "tx" => Ok(Self::Tx),
            "rxtx" => Ok(Self::RxTx),
            _ => Err(format!("Unknown pause mode: {}", s)),
        }
    }
}

/// Link duplex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Duplex {
    /// Full duplex.
    #[default]
    Full,
    /// Half duplex.
    Half,
}

impl fmt::Display for Duplex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Half => write!(f, "half"),
        }
    }
}

impl FromStr for Duplex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "half" => Ok(Self::Half),
            _ => Err(format!("Unknown duplex: {}", s)),
        }
    }
}

/// Lane-split configuration of a splittable interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LaneSplit {
    /// Lanes are bundled into the parent interface.
    #[default]
    NoSplit,
    /// Lanes are split into the child interfaces.
    Split,
}

impl fmt::Display for LaneSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSplit => write!(f, "no-split"),
            Self::Split => write!(f, "split"),
        }
    }
}

impl FromStr for LaneSplit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "split" => Ok(Self::Split),
            "no-split" => Ok(Self::NoSplit),
            _ => Err(format!("Unknown lane split value: {}", s)),
        }
    }
}

/// Interface type as stored in the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterfaceType {
    /// Physical front-panel interface.
    #[default]
    System,
    /// Internal (routed VLAN) interface.
    Internal,
    /// VLAN sub-interface.
    VlanSubint,
    /// Loopback interface.
    Loopback,
}

impl InterfaceType {
    /// Returns true for logical types that have no transceiver or lanes.
    pub fn is_logical(&self) -> bool {
        !matches!(self, Self::System)
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Internal => write!(f, "internal"),
            Self::VlanSubint => write!(f, "vlansubint"),
            Self::Loopback => write!(f, "loopback"),
        }
    }
}

impl FromStr for InterfaceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "system" => Ok(Self::System),
            "internal" => Ok(Self::Internal),
            "vlansubint" => Ok(Self::VlanSubint),
            "loopback" => Ok(Self::Loopback),
            _ => Err(format!("Unknown interface type: {}", s)),
        }
    }
}

/// An MTU setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mtu {
    /// Not configured.
    #[default]
    Unset,
    /// A validated value.
    Value(u32),
    /// Configured but rejected.
    Invalid,
}

impl Mtu {
    /// Returns true if the setting was rejected.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// Returns the value, if any.
    pub fn value(&self) -> Option<u32> {
        match self {
            Self::Value(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Mtu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "unset"),
            Self::Value(v) => write!(f, "{}", v),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// An ordered list of speeds in Mb/s, or the invalid sentinel.
///
/// An empty valid list means "not specified".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpeedList {
    /// Validated speeds.
    Valid(Vec<u32>),
    /// Rejected list.
    Invalid,
}

impl Default for SpeedList {
    fn default() -> Self {
        Self::Valid(Vec::new())
    }
}

impl SpeedList {
    /// Returns true if this is the invalid sentinel.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// Returns true for an empty valid list.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Valid(v) if v.is_empty())
    }

    /// Returns the speeds of a valid list.
    pub fn speeds(&self) -> Option<&[u32]> {
        match self {
            Self::Valid(v) => Some(v),
            Self::Invalid => None,
        }
    }

    /// Returns the number of speeds (zero for the invalid sentinel).
    pub fn len(&self) -> usize {
        self.speeds().map_or(0, <[u32]>::len)
    }

    /// Returns the first speed, if any.
    pub fn first(&self) -> Option<u32> {
        self.speeds().and_then(|s| s.first().copied())
    }

    /// Returns the highest speed, if any.
    pub fn highest(&self) -> Option<u32> {
        self.speeds().and_then(|s| s.iter().copied().max())
    }
}

impl fmt::Display for SpeedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(speeds) => {
                let joined: Vec<String> = speeds.iter().map(u32::to_string).collect();
                write!(f, "{}", joined.join(","))
            }
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// Why an interface is not enabled in hardware.
///
/// Variants are listed in the order the derivation engine evaluates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisableReason {
    /// Not derived yet.
    #[default]
    Uninitialized,
    /// Parent interface whose lanes are split.
    LanesSplit,
    /// Child interface whose parent is not split.
    LanesNotSplit,
    /// Interface administratively down.
    AdminDown,
    /// No pluggable module present.
    ModuleMissing,
    /// Pluggable module not recognized.
    ModuleUnrecognized,
    /// Pluggable module not supported.
    ModuleUnsupported,
    /// Configured MTU rejected.
    InvalidMtu,
    /// Configured speeds rejected.
    InvalidSpeeds,
    /// Autonegotiation requested but the medium cannot negotiate.
    AutonegNotSupported,
    /// Autonegotiation refused but the medium requires it.
    AutonegRequired,
    /// Owning port administratively down (or no owning port).
    PortAdminDown,
    /// Enabled.
    Ok,
}

impl DisableReason {
    /// Returns the string written to the `error` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::LanesSplit => "lanes_split",
            Self::LanesNotSplit => "lanes_not_split",
            Self::AdminDown => "admin_down",
            Self::ModuleMissing => "module_missing",
            Self::ModuleUnrecognized => "module_unrecognized",
            Self::ModuleUnsupported => "module_unsupported",
            Self::InvalidMtu => "invalid_mtu",
            Self::InvalidSpeeds => "invalid_speeds",
            Self::AutonegNotSupported => "autoneg_not_supported",
            Self::AutonegRequired => "autoneg_required",
            Self::PortAdminDown => "port_admin_down",
            Self::Ok => "ok",
        }
    }
}

impl fmt::Display for DisableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the attached medium can, must, or must not autonegotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AutonegCapability {
    /// The medium cannot autonegotiate.
    Unsupported,
    /// The medium must autonegotiate.
    #[default]
    Required,
    /// The medium may autonegotiate.
    Optional,
}

impl fmt::Display for AutonegCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "unsupported"),
            Self::Required => write!(f, "required"),
            Self::Optional => write!(f, "optional"),
        }
    }
}

/// Resolved autonegotiation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AutonegState {
    /// Autonegotiation off.
    #[default]
    Disabled,
    /// Autonegotiation on.
    Enabled,
    /// User preference conflicts with the medium.
    Invalid,
}

impl fmt::Display for AutonegState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Enabled => write!(f, "enabled"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trip_strings() {
        assert_eq!("up".parse::<AdminState>().unwrap(), AdminState::Up);
        assert_eq!("rxtx".parse::<PauseMode>().unwrap().to_string(), "rxtx");
        assert_eq!("no-split".parse::<LaneSplit>().unwrap(), LaneSplit::NoSplit);
        assert_eq!("".parse::<InterfaceType>().unwrap(), InterfaceType::System);
        assert!("UP".parse::<AdminState>().is_err());
        assert!("bogus".parse::<Duplex>().is_err());
    }

    #[test]
    fn test_interface_type_logical() {
        assert!(!InterfaceType::System.is_logical());
        assert!(InterfaceType::Internal.is_logical());
        assert!(InterfaceType::VlanSubint.is_logical());
        assert!(InterfaceType::Loopback.is_logical());
    }

    #[test]
    fn test_speed_list_helpers() {
        let speeds = SpeedList::Valid(vec![1000, 40000, 10000]);
        assert_eq!(speeds.first(), Some(1000));
        assert_eq!(speeds.highest(), Some(40000));
        assert_eq!(speeds.len(), 3);
        assert_eq!(speeds.to_string(), "1000,40000,10000");

        assert!(SpeedList::default().is_empty());
        assert!(!SpeedList::Invalid.is_empty());
        assert_eq!(SpeedList::Invalid.len(), 0);
        assert_eq!(SpeedList::Invalid.first(), None);
    }

    #[test]
    fn test_disable_reason_strings() {
        assert_eq!(DisableReason::PortAdminDown.as_str(), "port_admin_down");
        assert_eq!(DisableReason::AutonegRequired.to_string(), "autoneg_required");
        assert_eq!(DisableReason::default(), DisableReason::Uninitialized);
    }

    #[test]
    fn test_mtu_helpers() {
        assert_eq!(Mtu::Value(9000).value(), Some(9000));
        assert!(Mtu::Invalid.is_invalid());
        assert_eq!(Mtu::Unset.value(), None);
    }
}
