//! State derivation engine.
//!
//! Turns an interface's normalized inputs into its operational state:
//! MTU resolution, the autonegotiation/speed decision table, and the
//! prioritized disable-reason chain. Everything here is pure; the same
//! inputs always produce the same [`OperState`].

use tracing::debug;

use crate::capability;
use crate::registry::{InterfaceEntity, OperState};
use crate::tables;
use crate::types::{
    AdminState, AutonegCapability, AutonegPreference, AutonegState, DisableReason, LaneSplit, Mtu,
    SpeedList,
};

/// Outcome of the autonegotiation/speed decision table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutonegDecision {
    pub state: AutonegState,
    /// Set when `state` is invalid.
    pub reason: Option<DisableReason>,
    pub speeds: SpeedList,
}

impl AutonegDecision {
    fn new(state: AutonegState, speeds: Vec<u32>) -> Self {
        Self {
            state,
            reason: None,
            speeds: SpeedList::Valid(speeds),
        }
    }

    fn invalid(reason: DisableReason, speeds: Vec<u32>) -> Self {
        Self {
            state: AutonegState::Invalid,
            reason: Some(reason),
            speeds: SpeedList::Valid(speeds),
        }
    }
}

/// Resolves the operational MTU: unset becomes the default, invalid stays
/// invalid.
pub fn resolve_mtu(user: Mtu) -> Mtu {
    match user {
        Mtu::Unset => Mtu::Value(tables::DEFAULT_MTU),
        other => other,
    }
}

/// Applies the autonegotiation/speed decision table.
///
/// `default_speeds` are the medium's speeds used when the user gives none;
/// `hw_speeds` are consulted only for an optional-AN medium with AN off.
pub fn decide_autoneg(
    capability: AutonegCapability,
    preference: AutonegPreference,
    user_speeds: &[u32],
    default_speeds: &[u32],
    hw_speeds: &SpeedList,
) -> AutonegDecision {
    use AutonegCapability::{Optional, Required, Unsupported};
    use AutonegPreference::{Off, On, Unset};

    let defaults = default_speeds.to_vec();
    let first_user = || user_speeds.iter().take(1).copied().collect::<Vec<_>>();

    match (preference, user_speeds.is_empty()) {
        (On, true) => match capability {
            Unsupported => AutonegDecision::invalid(DisableReason::AutonegNotSupported, defaults),
            Required | Optional => AutonegDecision::new(AutonegState::Enabled, defaults),
        },
        (Off, true) => match capability {
            Required => AutonegDecision::invalid(DisableReason::AutonegRequired, defaults),
            Optional => {
                let speeds = hw_speeds.highest().map_or(defaults, |s| vec![s]);
                AutonegDecision::new(AutonegState::Disabled, speeds)
            }
            Unsupported => AutonegDecision::new(AutonegState::Disabled, defaults),
        },
        (Unset, false) => match capability {
            Unsupported => AutonegDecision::new(AutonegState::Disabled, first_user()),
            Required | Optional => {
                AutonegDecision::new(AutonegState::Enabled, user_speeds.to_vec())
            }
        },
        (On, false) => match capability {
            Required | Optional => {
                AutonegDecision::new(AutonegState::Enabled, user_speeds.to_vec())
            }
            Unsupported => AutonegDecision::invalid(DisableReason::AutonegNotSupported, defaults),
        },
        (Off, false) => match capability {
            Required => AutonegDecision::invalid(DisableReason::AutonegRequired, defaults),
            Optional | Unsupported => AutonegDecision::new(AutonegState::Disabled, first_user()),
        },
        (Unset, true) => match capability {
            Unsupported => AutonegDecision::new(AutonegState::Disabled, defaults),
            Required | Optional => AutonegDecision::new(AutonegState::Enabled, defaults),
        },
    }
}

/// Derives the full operational state of an interface.
///
/// `parent_lane_split` is the lane-split setting of the resolved split
/// parent, or `None` when the interface has no (present) parent.
pub fn derive(entity: &InterfaceEntity, parent_lane_split: Option<LaneSplit>) -> OperState {
    let user = &entity.user;
    let profile = capability::medium_profile(&entity.transceiver);

    let mut oper = OperState {
        mtu: resolve_mtu(user.mtu),
        autoneg_capability: profile.capability,
        ..Default::default()
    };

    match user.speeds.speeds() {
        None => oper.speeds = SpeedList::Invalid,
        Some(_) if oper.mtu.is_invalid() => {}
        Some(user_speeds) => {
            let decision = decide_autoneg(
                profile.capability,
                user.autoneg,
                user_speeds,
                &profile.default_speeds,
                &entity.hw.speeds,
            );
            oper.autoneg_state = decision.state;
            oper.autoneg_reason = decision.reason;
            oper.speeds = decision.speeds;
        }
    }

    oper.reason = disable_reason(entity, parent_lane_split, &oper);
    oper.enabled = oper.reason == DisableReason::Ok;
    if oper.enabled {
        oper.pause = user.pause;
        oper.duplex = user.duplex;
    }

    debug!(
        "Derived {}: enabled={} reason={} autoneg={} speeds={}",
        entity.name, oper.enabled, oper.reason, oper.autoneg_state, oper.speeds
    );
    oper
}

/// Evaluates the disable-reason chain; the first matching reason wins.
fn disable_reason(
    entity: &InterfaceEntity,
    parent_lane_split: Option<LaneSplit>,
    oper: &OperState,
) -> DisableReason {
    let user = &entity.user;
    let transceiver = &entity.transceiver;

    if entity.intf_type.is_logical() {
        return if user.admin == AdminState::Down {
            DisableReason::AdminDown
        } else if entity.port_admin == AdminState::Down {
            DisableReason::PortAdminDown
        } else {
            DisableReason::Ok
        };
    }

    if entity.is_split_parent() && user.lane_split == LaneSplit::Split {
        DisableReason::LanesSplit
    } else if parent_lane_split == Some(LaneSplit::NoSplit) {
        DisableReason::LanesNotSplit
    } else if user.admin == AdminState::Down {
        DisableReason::AdminDown
    } else if transceiver.connector == capability::Connector::Absent {
        DisableReason::ModuleMissing
    } else if transceiver.status == capability::ConnectorStatus::Unrecognized {
        DisableReason::ModuleUnrecognized
    } else if transceiver.status == capability::ConnectorStatus::Unsupported
        || transceiver.flags.is_empty()
    {
        DisableReason::ModuleUnsupported
    } else if oper.mtu.is_invalid() {
        DisableReason::InvalidMtu
    } else if oper.speeds.is_invalid() {
        DisableReason::InvalidSpeeds
    } else if oper.autoneg_state == AutonegState::Invalid {
        oper.autoneg_reason.unwrap_or(DisableReason::Uninitialized)
    } else if entity.port_admin == AdminState::Down {
        DisableReason::PortAdminDown
    } else {
        DisableReason::Ok
    }
}
