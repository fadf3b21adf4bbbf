//! Hardware capability resolution.
//!
//! Maps a detected connector identity to a connector flag set, an
//! interface-type tag, an autonegotiation capability class and the medium's
//! default speed. Split children reinterpret the parent's quad-lane module
//! as the equivalent single-lane connector.

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use tracing::debug;

use crate::normalizer::{HardwareInfo, ModuleReport};
use crate::tables::speed::{SPEED_100G, SPEED_10G, SPEED_1G, SPEED_25G, SPEED_40G, SPEED_50G};
use crate::types::AutonegCapability;

/// Connector family of the physical cage, from the hardware description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HwConnector {
    /// Fixed copper RJ45 port.
    Rj45,
    /// SFP+ cage.
    SfpPlus,
    /// QSFP+ cage.
    QsfpPlus,
    /// QSFP28 cage.
    Qsfp28,
    /// Anything else (midplane, backplane).
    #[default]
    Unknown,
}

impl fmt::Display for HwConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rj45 => write!(f, "RJ45"),
            Self::SfpPlus => write!(f, "SFP_PLUS"),
            Self::QsfpPlus => write!(f, "QSFP_PLUS"),
            Self::Qsfp28 => write!(f, "QSFP28"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for HwConnector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RJ45" => Ok(Self::Rj45),
            "SFP_PLUS" => Ok(Self::SfpPlus),
            "QSFP_PLUS" => Ok(Self::QsfpPlus),
            "QSFP28" => Ok(Self::Qsfp28),
            _ => Err(format!("Unknown hardware connector: {}", s)),
        }
    }
}

/// Identity of the detected pluggable module (or fixed medium).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Connector {
    Qsfp28Clr4,
    Qsfp28Cr4,
    Qsfp28Psm4,
    Qsfp28Cwdm4,
    Qsfp28Lr4,
    Qsfp28Sr4,
    Sfp28Cr,
    Sfp28Lr,
    Sfp28Sr,
    QsfpCr4,
    QsfpLr4,
    QsfpSr4,
    SfpCx,
    SfpDac,
    SfpFc,
    SfpLr,
    SfpLrm,
    SfpEr,
    SfpLx,
    SfpRj45,
    SfpSr,
    SfpSx,
    /// No module in the cage.
    Absent,
    /// Module present but not identified.
    #[default]
    Unknown,
}

const CONNECTOR_NAMES: &[(Connector, &str)] = &[
    (Connector::Qsfp28Clr4, "QSFP28_CLR4"),
    (Connector::Qsfp28Cr4, "QSFP28_CR4"),
    (Connector::Qsfp28Psm4, "QSFP28_PSM4"),
    (Connector::Qsfp28Cwdm4, "QSFP28_CWDM4"),
    (Connector::Qsfp28Lr4, "QSFP28_LR4"),
    (Connector::Qsfp28Sr4, "QSFP28_SR4"),
    (Connector::Sfp28Cr, "SFP28_CR"),
    (Connector::Sfp28Lr, "SFP28_LR"),
    (Connector::Sfp28Sr, "SFP28_SR"),
    (Connector::QsfpCr4, "QSFP_CR4"),
    (Connector::QsfpLr4, "QSFP_LR4"),
    (Connector::QsfpSr4, "QSFP_SR4"),
    (Connector::SfpCx, "SFP_CX"),
    (Connector::SfpDac, "SFP_DAC"),
    (Connector::SfpFc, "SFP_FC"),
    (Connector::SfpLr, "SFP_LR"),
    (Connector::SfpLrm, "SFP_LRM"),
    (Connector::SfpEr, "SFP_ER"),
    (Connector::SfpLx, "SFP_LX"),
    (Connector::SfpRj45, "SFP_RJ45"),
    (Connector::SfpSr, "SFP_SR"),
    (Connector::SfpSx, "SFP_SX"),
    (Connector::Absent, "absent"),
    (Connector::Unknown, "unknown"),
];

impl Connector {
    /// Returns the schema string for this connector.
    pub fn as_str(&self) -> &'static str {
        CONNECTOR_NAMES
            .iter()
            .find(|(c, _)| c == self)
            .map_or("unknown", |(_, name)| name)
    }

    /// Returns the connector flag set.
    pub fn flags(&self) -> ConnectorFlags {
        match self {
            Self::SfpRj45 | Self::SfpSx => ConnectorFlags::SFP,
            Self::SfpSr | Self::SfpLr | Self::SfpEr | Self::SfpLrm | Self::SfpDac => {
                ConnectorFlags::SFP_PLUS
            }
            Self::Sfp28Sr | Self::Sfp28Lr | Self::Sfp28Cr => ConnectorFlags::SFP28,
            Self::QsfpCr4 | Self::QsfpSr4 | Self::QsfpLr4 => ConnectorFlags::QSFP_PLUS,
            Self::Qsfp28Sr4
            | Self::Qsfp28Lr4
            | Self::Qsfp28Cr4
            | Self::Qsfp28Clr4
            | Self::Qsfp28Psm4
            | Self::Qsfp28Cwdm4 => ConnectorFlags::QSFP28,
            Self::SfpLx | Self::SfpCx | Self::SfpFc | Self::Absent | Self::Unknown => {
                ConnectorFlags::empty()
            }
        }
    }

    /// Returns the interface-type tag written to hardware.
    pub fn phy_interface_type(&self) -> PhyInterfaceType {
        match self {
            Self::SfpSx => PhyInterfaceType::Base1gSx,
            Self::SfpRj45 => PhyInterfaceType::Base1gT,
            Self::SfpDac => PhyInterfaceType::Base10gCr,
            Self::SfpSr => PhyInterfaceType::Base10gSr,
            Self::SfpLr => PhyInterfaceType::Base10gLr,
            Self::SfpEr => PhyInterfaceType::Base10gEr,
            Self::QsfpCr4 => PhyInterfaceType::Base40gCr4,
            Self::QsfpSr4 => PhyInterfaceType::Base40gSr4,
            Self::QsfpLr4 => PhyInterfaceType::Base40gLr4,
            Self::Sfp28Cr => PhyInterfaceType::Base25gCr,
            Self::Sfp28Sr => PhyInterfaceType::Base25gSr,
            Self::Sfp28Lr => PhyInterfaceType::Base25gLr,
            Self::Qsfp28Cr4 => PhyInterfaceType::Base100gCr4,
            Self::Qsfp28Sr4 => PhyInterfaceType::Base100gSr4,
            Self::Qsfp28Lr4 => PhyInterfaceType::Base100gLr4,
            Self::Qsfp28Clr4 => PhyInterfaceType::Base100gClr4,
            Self::Qsfp28Psm4 => PhyInterfaceType::Base100gPsm4,
            Self::Qsfp28Cwdm4 => PhyInterfaceType::Base100gCwdm4,
            _ => PhyInterfaceType::Unknown,
        }
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Connector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CONNECTOR_NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(c, _)| *c)
            .ok_or_else(|| format!("Unknown connector: {}", s))
    }
}

/// Result of module detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectorStatus {
    /// Module identified and supported.
    Supported,
    /// Module identified but not supported.
    Unsupported,
    /// Module not identified.
    #[default]
    Unrecognized,
}

impl fmt::Display for ConnectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supported => write!(f, "supported"),
            Self::Unsupported => write!(f, "unsupported"),
            Self::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

impl FromStr for ConnectorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supported" => Ok(Self::Supported),
            "unsupported" => Ok(Self::Unsupported),
            "unrecognized" => Ok(Self::Unrecognized),
            _ => Err(format!("Unknown connector status: {}", s)),
        }
    }
}

/// Connector flag bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConnectorFlags(u32);

impl ConnectorFlags {
    pub const SUPPORTED: Self = Self(0x0010);
    pub const SFP_FAMILY: Self = Self(0x0020);
    pub const SFP_PLUS_10G: Self = Self(0x0040);
    pub const SFP28_25G: Self = Self(0x0080);
    pub const QSFP_FAMILY: Self = Self(0x0100);
    pub const QSFP_PLUS_40G: Self = Self(0x0200);
    pub const QSFP28_100G: Self = Self(0x0400);

    /// 1G SFP modules.
    pub const SFP: Self = Self(Self::SUPPORTED.0 | Self::SFP_FAMILY.0);
    /// 10G SFP+ modules.
    pub const SFP_PLUS: Self = Self(Self::SFP.0 | Self::SFP_PLUS_10G.0);
    /// 25G SFP28 modules.
    pub const SFP28: Self = Self(Self::SFP.0 | Self::SFP28_25G.0);
    /// 40G QSFP+ modules.
    pub const QSFP_PLUS: Self = Self(Self::SUPPORTED.0 | Self::QSFP_FAMILY.0 | Self::QSFP_PLUS_40G.0);
    /// 100G QSFP28 modules.
    pub const QSFP28: Self = Self(Self::SUPPORTED.0 | Self::QSFP_FAMILY.0 | Self::QSFP28_100G.0);

    /// The empty set (unsupported).
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns true if no flag is set.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if every flag of `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if the module is any SFP-family module.
    pub const fn is_sfp_family(&self) -> bool {
        self.contains(Self::SFP_FAMILY)
    }

    /// Returns true if the module is any QSFP-family module.
    pub const fn is_qsfp_family(&self) -> bool {
        self.contains(Self::QSFP_FAMILY)
    }
}

impl BitOr for ConnectorFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for ConnectorFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Interface capability bitset, derived from the hardware description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapabilityFlags(u32);

impl CapabilityFlags {
    pub const PLUGGABLE: Self = Self(0x01);
    pub const ENET_1G: Self = Self(0x02);
    pub const ENET_10G: Self = Self(0x04);
    pub const ENET_25G: Self = Self(0x08);
    pub const ENET_40G: Self = Self(0x10);
    pub const ENET_50G: Self = Self(0x20);
    pub const ENET_100G: Self = Self(0x40);
    pub const SPLIT_4: Self = Self(0x80);

    /// Builds the capability set of an interface.
    pub fn from_hardware(pluggable: bool, speeds: &[u32], split_4: bool) -> Self {
        let mut bits = 0;
        if pluggable {
            bits |= Self::PLUGGABLE.0;
        }
        for speed in speeds {
            bits |= match *speed {
                SPEED_1G => Self::ENET_1G.0,
                SPEED_10G => Self::ENET_10G.0,
                SPEED_25G => Self::ENET_25G.0,
                SPEED_40G => Self::ENET_40G.0,
                SPEED_50G => Self::ENET_50G.0,
                SPEED_100G => Self::ENET_100G.0,
                _ => 0,
            };
        }
        if split_4 {
            bits |= Self::SPLIT_4.0;
        }
        Self(bits)
    }

    /// Returns true if every flag of `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CapabilityFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Interface-type tag written to `hw_intf_config:interface_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PhyInterfaceType {
    Base1gSx,
    Base1gT,
    Base10gCr,
    Base10gSr,
    Base10gLr,
    Base10gEr,
    Base25gCr,
    Base25gSr,
    Base25gLr,
    Base40gCr4,
    Base40gSr4,
    Base40gLr4,
    Base100gCr4,
    Base100gSr4,
    Base100gLr4,
    Base100gClr4,
    Base100gPsm4,
    Base100gCwdm4,
    #[default]
    Unknown,
}

impl fmt::Display for PhyInterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Base1gSx => "1GBASE_SX",
            Self::Base1gT => "1GBASE_T",
            Self::Base10gCr => "10GBASE_CR",
            Self::Base10gSr => "10GBASE_SR",
            Self::Base10gLr => "10GBASE_LR",
            Self::Base10gEr => "10GBASE_ER",
            Self::Base25gCr => "25GBASE_CR",
            Self::Base25gSr => "25GBASE_SR",
            Self::Base25gLr => "25GBASE_LR",
            Self::Base40gCr4 => "40GBASE_CR4",
            Self::Base40gSr4 => "40GBASE_SR4",
            Self::Base40gLr4 => "40GBASE_LR4",
            Self::Base100gCr4 => "100GBASE_CR4",
            Self::Base100gSr4 => "100GBASE_SR4",
            Self::Base100gLr4 => "100GBASE_LR4",
            Self::Base100gClr4 => "100GBASE_CLR4",
            Self::Base100gPsm4 => "100GBASE_PSM4",
            Self::Base100gCwdm4 => "100GBASE_CWDM4",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Resolved transceiver facts of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TransceiverInfo {
    /// Connector identity in effect for this interface.
    pub connector: Connector,
    /// Detection status.
    pub status: ConnectorStatus,
    /// Connector flag set.
    pub flags: ConnectorFlags,
    /// Interface-type tag.
    pub intf_type: PhyInterfaceType,
}

impl TransceiverInfo {
    fn new(connector: Connector, status: ConnectorStatus) -> Self {
        Self {
            connector,
            status,
            flags: connector.flags(),
            intf_type: connector.phy_interface_type(),
        }
    }
}

/// Autonegotiation class and default speeds of a medium.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediumProfile {
    /// Autonegotiation capability class.
    pub capability: AutonegCapability,
    /// Speeds used when the user gives none.
    pub default_speeds: Vec<u32>,
}

/// Resolves the transceiver of an interface from its own module report.
///
/// Fixed (non-pluggable) ports ignore the module report: an RJ45 cage is a
/// 1G copper medium, anything else is unknown.
pub fn resolve_transceiver(hw: &HardwareInfo, module: &ModuleReport) -> TransceiverInfo {
    if !hw.pluggable {
        return if hw.connector == HwConnector::Rj45 {
            TransceiverInfo::new(Connector::SfpRj45, ConnectorStatus::Supported)
        } else {
            TransceiverInfo::new(Connector::Unknown, ConnectorStatus::Unrecognized)
        };
    }
    TransceiverInfo::new(module.connector, module.status)
}

/// Resolves the transceiver of a split child from its parent's module report.
pub fn resolve_split_child(parent_module: &ModuleReport) -> TransceiverInfo {
    let status = parent_module.status;
    let connector = match parent_module.connector {
        Connector::Qsfp28Cwdm4
        | Connector::Qsfp28Psm4
        | Connector::Qsfp28Clr4
        | Connector::Qsfp28Lr4 => Connector::Sfp28Lr,
        Connector::Qsfp28Cr4 => {
            // A 40G DAC in a QSFP28 cage breaks out into 10G copper.
            if parent_module.supported_speeds.as_deref() == Some("40000") {
                Connector::SfpDac
            } else {
                Connector::Sfp28Cr
            }
        }
        Connector::Qsfp28Sr4 => Connector::Sfp28Sr,
        Connector::QsfpCr4 => Connector::SfpDac,
        Connector::QsfpLr4 => Connector::SfpLr,
        Connector::QsfpSr4 => Connector::SfpSr,
        Connector::Absent => Connector::Absent,
        other => {
            debug!("Connector {} cannot be split, marking child unsupported", other);
            return TransceiverInfo::new(Connector::Unknown, ConnectorStatus::Unsupported);
        }
    };
    TransceiverInfo::new(connector, status)
}

/// Returns the autonegotiation class and default speeds of a medium.
pub fn medium_profile(transceiver: &TransceiverInfo) -> MediumProfile {
    let flags = transceiver.flags;
    let connector = transceiver.connector;

    let (capability, default_speed) = if flags.is_sfp_family()
        && flags.contains(ConnectorFlags::SFP_PLUS_10G)
    {
        (AutonegCapability::Unsupported, Some(SPEED_10G))
    } else if flags.is_sfp_family() && flags.contains(ConnectorFlags::SFP28_25G) {
        (required_if(connector == Connector::Sfp28Cr), Some(SPEED_25G))
    } else if flags.is_sfp_family() {
        (AutonegCapability::Required, Some(SPEED_1G))
    } else if flags.is_qsfp_family() && flags.contains(ConnectorFlags::QSFP_PLUS_40G) {
        (required_if(connector == Connector::QsfpCr4), Some(SPEED_40G))
    } else if flags.is_qsfp_family() && flags.contains(ConnectorFlags::QSFP28_100G) {
        (required_if(connector == Connector::Qsfp28Cr4), Some(SPEED_100G))
    } else {
        // Midplane links are KR/KR2 and always negotiate.
        (AutonegCapability::Required, None)
    };

    MediumProfile {
        capability,
        default_speeds: default_speed.into_iter().collect(),
    }
}

fn required_if(copper: bool) -> AutonegCapability {
    if copper {
        AutonegCapability::Required
    } else {
        AutonegCapability::Unsupported
    }
}
