//! Forwarding-state arbiter.
//!
//! Each interface walks an ordered list of forwarding layers, outward from
//! the medium. A layer is blocked when the layer below it is blocked, when
//! the interface is not enabled, or when one of its protocols asserts block.
//! The protocol with the lowest id that asserted block owns the layer and
//! is reported as the blocking reason.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use sonic_intfd_store::ColumnMap;

use crate::registry::InterfaceEntity;
use crate::tables::{forwarding_state, values};

/// Protocols that can block a forwarding layer.
///
/// The discriminant is the precedence: lower ids win ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProtocolId {
    Lacp = 0,
}

impl ProtocolId {
    /// Returns the name written as the blocking reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolId::Lacp => "lacp",
        }
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lacp" => Ok(ProtocolId::Lacp),
            _ => Err(format!("Unknown forwarding protocol: {}", s)),
        }
    }
}

/// What a protocol wants for a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolSignal {
    Forward,
    Block,
}

/// Arbitration state of one layer of one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerState {
    pub owner: Option<ProtocolId>,
    pub blocked: bool,
}

impl LayerState {
    fn block_unowned(&mut self) {
        self.blocked = true;
        self.owner = None;
    }
}

/// A protocol participating in a forwarding layer.
pub trait Protocol: fmt::Debug + Send + Sync {
    /// Identity and precedence.
    fn id(&self) -> ProtocolId;

    /// Reads the protocol's signal from the interface.
    fn get_state(&self, entity: &InterfaceEntity) -> ProtocolSignal;

    /// Applies this protocol's signal to the layer. Returns true if the
    /// protocol asserted block.
    fn run(&self, entity: &InterfaceEntity, layer: &mut LayerState) -> bool {
        let id = self.id();
        match self.get_state(entity) {
            ProtocolSignal::Block => {
                if layer.blocked {
                    if layer.owner.map_or(true, |owner| id < owner) {
                        debug!("{} takes ownership of blocked layer on {}", id, entity.name);
                        layer.owner = Some(id);
                    }
                } else {
                    debug!("{} blocks layer on {}", id, entity.name);
                    layer.blocked = true;
                    layer.owner = Some(id);
                }
                true
            }
            ProtocolSignal::Forward => {
                if layer.blocked && layer.owner == Some(id) {
                    debug!("{} releases layer on {}", id, entity.name);
                    layer.blocked = false;
                    layer.owner = None;
                }
                false
            }
        }
    }
}

/// Link aggregation: blocks unless the bond member state is absent or up.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lacp;

impl Protocol for Lacp {
    fn id(&self) -> ProtocolId {
        ProtocolId::Lacp
    }

    fn get_state(&self, entity: &InterfaceEntity) -> ProtocolSignal {
        match entity.bond_state.as_deref() {
            None | Some(values::UP) => ProtocolSignal::Forward,
            Some(_) => ProtocolSignal::Block,
        }
    }
}

/// Forwarding layers, outward from the medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerId {
    Aggregation,
}

impl LayerId {
    /// Key holding the layer's forwarding state.
    pub fn forwarding_key(&self) -> &'static str {
        match self {
            LayerId::Aggregation => forwarding_state::AGGREGATION_FORWARDING,
        }
    }

    /// Key holding the name of the protocol blocking the layer.
    pub fn blocked_reason_key(&self) -> &'static str {
        match self {
            LayerId::Aggregation => forwarding_state::AGGREGATION_BLOCKED_REASON,
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerId::Aggregation => write!(f, "interface_aggregation"),
        }
    }
}

/// A layer and its protocols in precedence order.
#[derive(Debug)]
pub struct ForwardingLayer {
    pub id: LayerId,
    pub protocols: Vec<Box<dyn Protocol>>,
}

impl ForwardingLayer {
    /// Creates a layer with no protocols.
    pub fn new(id: LayerId) -> Self {
        Self {
            id,
            protocols: Vec::new(),
        }
    }

    /// Adds a protocol after the ones already registered.
    pub fn with_protocol(mut self, protocol: impl Protocol + 'static) -> Self {
        self.protocols.push(Box::new(protocol));
        self
    }
}

/// Runs the layer chain for interfaces and renders the forwarding map.
#[derive(Debug)]
pub struct Arbiter {
    layers: Vec<ForwardingLayer>,
    require_hw_ready: bool,
}

impl Default for Arbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Arbiter {
    /// Creates the arbiter with the aggregation layer driven by LACP.
    pub fn new() -> Self {
        Self::with_layers(vec![
            ForwardingLayer::new(LayerId::Aggregation).with_protocol(Lacp)
        ])
    }

    /// Creates an arbiter over an explicit layer chain.
    pub fn with_layers(layers: Vec<ForwardingLayer>) -> Self {
        Self {
            layers,
            require_hw_ready: false,
        }
    }

    /// Also blocks every layer while the hardware is not ready.
    pub fn with_hw_ready_gate(mut self, enabled: bool) -> Self {
        self.require_hw_ready = enabled;
        self
    }

    /// Rebuilds layer state from a previously written forwarding map.
    pub fn seed(&self, map: &ColumnMap) -> Vec<LayerState> {
        self.layers
            .iter()
            .map(|layer| LayerState {
                blocked: map.get(layer.id.forwarding_key()).map(String::as_str)
                    == Some(values::FALSE),
                owner: map
                    .get(layer.id.blocked_reason_key())
                    .and_then(|name| name.parse().ok()),
            })
            .collect()
    }

    /// Runs every layer for the interface, updating its layer state, and
    /// returns the forwarding map to write.
    ///
    /// Keys this arbiter does not manage are carried over from the
    /// interface's current map.
    pub fn evaluate(&self, entity: &mut InterfaceEntity) -> ColumnMap {
        let mut states = std::mem::take(&mut entity.layers);
        if states.len() != self.layers.len() {
            states = self.seed(&entity.forwarding_state);
        }

        let mut map = entity.forwarding_state.clone();
        let mut prev_blocked = false;
        for (layer, state) in self.layers.iter().zip(states.iter_mut()) {
            self.run_layer(layer, entity, state, prev_blocked);
            write_layer(&mut map, layer.id, state);
            prev_blocked = state.blocked;
        }

        let forwarding = match states.last() {
            Some(last) => state_value(last.blocked),
            None => values::TRUE,
        };
        map.insert(forwarding_state::FORWARDING.to_string(), forwarding.to_string());

        entity.layers = states;
        map
    }

    fn run_layer(
        &self,
        layer: &ForwardingLayer,
        entity: &InterfaceEntity,
        state: &mut LayerState,
        prev_blocked: bool,
    ) {
        if prev_blocked {
            debug!("Blocking {} on {}: previous layer blocked", layer.id, entity.name);
            state.block_unowned();
            return;
        }
        if !entity.oper.enabled {
            if !state.blocked {
                debug!("Blocking {} on {}: interface disabled", layer.id, entity.name);
            }
            state.block_unowned();
            return;
        }
        if self.require_hw_ready && !entity.hw_ready {
            if !state.blocked {
                debug!("Blocking {} on {}: hardware not ready", layer.id, entity.name);
            }
            state.block_unowned();
            return;
        }

        if layer.protocols.iter().any(|p| p.run(entity, state)) {
            return;
        }
        state.blocked = false;
        state.owner = None;
    }
}

fn state_value(blocked: bool) -> &'static str {
    if blocked {
        values::FALSE
    } else {
        values::TRUE
    }
}

fn write_layer(map: &mut ColumnMap, id: LayerId, state: &LayerState) {
    let key = id.forwarding_key().to_string();
    let owner_key = id.blocked_reason_key();
    match state.owner {
        Some(owner) => {
            map.insert(key, state_value(state.blocked).to_string());
            map.insert(owner_key.to_string(), owner.to_string());
        }
        None if state.blocked => {
            map.remove(&key);
            map.remove(owner_key);
        }
        None => {
            map.insert(key, values::TRUE.to_string());
            map.remove(owner_key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DisableReason;
    use pretty_assertions::assert_eq;

    fn entity(enabled: bool, bond: Option<&str>) -> InterfaceEntity {
        let mut entity = InterfaceEntity {
            name: "1".to_string(),
            bond_state: bond.map(str::to_string),
            ..Default::default()
        };
        entity.oper.enabled = enabled;
        entity.oper.reason = if enabled {
            DisableReason::Ok
        } else {
            DisableReason::AdminDown
        };
        entity
    }

    fn map(pairs: &[(&str, &str)]) -> ColumnMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_enabled_bond_up_forwards() {
        let arbiter = Arbiter::new();
        let mut entity = entity(true, Some("up"));

        let out = arbiter.evaluate(&mut entity);
        assert_eq!(
            out,
            map(&[
                ("forwarding", "true"),
                ("interface_aggregation_forwarding", "true"),
            ])
        );
        assert_eq!(entity.layers, vec![LayerState::default()]);
    }

    #[test]
    fn test_enabled_bond_down_blocked_by_lacp() {
        let arbiter = Arbiter::new();
        let mut entity = entity(true, Some("down"));

        let out = arbiter.evaluate(&mut entity);
        assert_eq!(
            out,
            map(&[
                ("forwarding", "false"),
                ("interface_aggregation_blocked_reason", "lacp"),
                ("interface_aggregation_forwarding", "false"),
            ])
        );
        assert_eq!(
            entity.layers,
            vec![LayerState {
                owner: Some(ProtocolId::Lacp),
                blocked: true,
            }]
        );
    }

    #[test]
    fn test_disabled_interface_blocks_without_owner() {
        let arbiter = Arbiter::new();
        let mut entity = entity(false, Some("down"));
        entity.forwarding_state = map(&[
            ("interface_aggregation_forwarding", "false"),
            ("interface_aggregation_blocked_reason", "lacp"),
        ]);

        let out = arbiter.evaluate(&mut entity);
        assert_eq!(out, map(&[("forwarding", "false")]));
        assert_eq!(entity.layers[0].owner, None);
    }

    #[test]
    fn test_owner_releases_when_forwarding() {
        let arbiter = Arbiter::new();
        let mut entity = entity(true, Some("down"));
        arbiter.evaluate(&mut entity);

        entity.bond_state = None;
        let out = arbiter.evaluate(&mut entity);
        assert_eq!(out.get("forwarding").map(String::as_str), Some("true"));
        assert!(!out.contains_key("interface_aggregation_blocked_reason"));
    }

    #[test]
    fn test_seed_from_existing_map() {
        let arbiter = Arbiter::new();
        let seeded = arbiter.seed(&map(&[
            ("interface_aggregation_forwarding", "false"),
            ("interface_aggregation_blocked_reason", "lacp"),
        ]));
        assert_eq!(
            seeded,
            vec![LayerState {
                owner: Some(ProtocolId::Lacp),
                blocked: true,
            }]
        );
        assert_eq!(arbiter.seed(&ColumnMap::new()), vec![LayerState::default()]);
    }

    #[test]
    fn test_hw_ready_gate() {
        let arbiter = Arbiter::new().with_hw_ready_gate(true);
        let mut entity = entity(true, None);

        let out = arbiter.evaluate(&mut entity);
        assert_eq!(out, map(&[("forwarding", "false")]));

        entity.hw_ready = true;
        let out = arbiter.evaluate(&mut entity);
        assert_eq!(out.get("forwarding").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_no_layers_always_forwarding() {
        let arbiter = Arbiter::with_layers(Vec::new());
        let mut entity = entity(false, Some("down"));
        let out = arbiter.evaluate(&mut entity);
        assert_eq!(out, map(&[("forwarding", "true")]));
    }

    #[test]
    fn test_blocked_previous_layer_blocks_next() {
        let arbiter = Arbiter::with_layers(vec![
            ForwardingLayer::new(LayerId::Aggregation).with_protocol(Lacp),
            ForwardingLayer::new(LayerId::Aggregation),
        ]);
        let mut entity = entity(true, Some("down"));
        arbiter.evaluate(&mut entity);
        assert_eq!(entity.layers[1], LayerState { owner: None, blocked: true });
    }

    #[derive(Debug)]
    struct AlwaysBlock(ProtocolId);

    impl Protocol for AlwaysBlock {
        fn id(&self) -> ProtocolId {
            self.0
        }

        fn get_state(&self, _: &InterfaceEntity) -> ProtocolSignal {
            ProtocolSignal::Block
        }
    }

    #[test]
    fn test_blocking_protocol_takes_unowned_blocked_layer() {
        let entity = entity(true, None);
        let mut state = LayerState {
            owner: None,
            blocked: true,
        };
        assert!(AlwaysBlock(ProtocolId::Lacp).run(&entity, &mut state));
        assert_eq!(state.owner, Some(ProtocolId::Lacp));
    }

    #[test]
    fn test_protocol_id_roundtrip_name() {
        assert_eq!("lacp".parse::<ProtocolId>(), Ok(ProtocolId::Lacp));
        assert!("stp".parse::<ProtocolId>().is_err());
    }
}
