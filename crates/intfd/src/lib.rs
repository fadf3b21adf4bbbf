//! Interface reconciliation daemon for SONiC.
//!
//! This crate implements `intfd`, which turns declarative per-interface
//! configuration and observed transceiver facts into the hardware
//! configuration and forwarding permission of every interface.
//!
//! # Responsibilities
//!
//! - Normalize `user_config`, `hw_intf_info` and `pm_info` into typed values
//! - Resolve the transceiver and autonegotiation class of each interface
//! - Track split parents and children, and port membership
//! - Derive the operational state and its disable reason
//! - Arbitrate the per-layer forwarding state (LACP today)
//! - Write `error`, `hw_intf_config` and `forwarding_state` back in one
//!   transaction per pass
//!
//! # Tables
//!
//! | Table | Read | Written |
//! |-------|------|---------|
//! | Interface | `user_config`, `hw_intf_info`, `pm_info`, `type`, `split_parent`, `split_children`, `bond_status`, `hw_status` | `error`, `hw_intf_config`, `forwarding_state` |
//! | Port | `admin`, `interfaces` | |
//! | Subsystem | `other_info:max_transmission_unit` | |
//! | System | `cur_cfg` | |
//!
//! # Example
//!
//! ```ignore
//! use sonic_intfd::{IntfMgr, IntfdConfig};
//! use sonic_intfd_store::MemoryStore;
//!
//! let mut store = MemoryStore::load_snapshot("intfd.json")?;
//! let mut mgr = IntfMgr::new(IntfdConfig::default());
//! mgr.run(&mut store, async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

pub mod arbiter;
pub mod capability;
pub mod config;
pub mod derivation;
mod driver;
mod dump;
mod error;
pub mod hierarchy;
pub mod hw_config;
pub mod normalizer;
pub mod registry;
pub mod tables;
pub mod types;

pub use arbiter::{Arbiter, LayerState, ProtocolId};
pub use config::{IntfdConfig, LogFormat};
pub use driver::{IntfMgr, PassOutcome};
pub use error::{IntfdError, IntfdResult};
pub use registry::{InterfaceEntity, OperState, PortEntity, Registry};
pub use types::DisableReason;
