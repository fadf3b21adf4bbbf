//! IntfMgr - the reconciliation driver.
//!
//! One pass waits for a change batch, folds it into the registry, re-derives
//! every affected interface, runs the arbiter and commits whatever changed
//! as a single transaction.

use std::collections::BTreeSet;
use std::future::Future;

use tracing::{debug, error, info, instrument, warn};

use sonic_intfd_store::{
    ChangeBatch, InterfaceRow, LockState, PendingChanges, PortRow, RowChange, Store,
    SubsystemRow, Transaction,
};

use crate::arbiter::Arbiter;
use crate::config::IntfdConfig;
use crate::derivation;
use crate::dump;
use crate::error::IntfdResult;
use crate::hierarchy;
use crate::hw_config;
use crate::normalizer::{self, HardwareInfo, ModuleReport, UserConfig};
use crate::registry::{InterfaceEntity, PortEntity, Registry};
use crate::tables::{bond_status, hw_status, values};

/// What a single pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// The lock is not held; nothing was processed.
    NotLeader,
    /// The system has not finished its initial configuration.
    SystemNotReady,
    /// Changes were processed but nothing needed writing.
    Idle,
    /// A transaction touching this many interfaces was committed.
    Committed(usize),
    /// The transaction was rejected by the store.
    CommitFailed,
}

/// Interface reconciliation manager.
#[derive(Debug)]
pub struct IntfMgr {
    config: IntfdConfig,
    registry: Registry,
    arbiter: Arbiter,
    /// Maximum MTU from the configured subsystem; zero until seen.
    max_mtu: u32,
    /// Latched once `System.cur_cfg` is positive.
    system_ready: bool,
    /// Set while a lock contention episode has been reported.
    contention_logged: bool,
    /// Changes received while the lock was not held or the system not ready,
    /// folded per key.
    deferred: PendingChanges,
}

impl IntfMgr {
    /// Creates a manager with the given configuration.
    pub fn new(config: IntfdConfig) -> Self {
        let arbiter = Arbiter::new().with_hw_ready_gate(config.arbiter.require_hw_ready);
        Self {
            config,
            registry: Registry::new(),
            arbiter,
            max_mtu: 0,
            system_ready: false,
            contention_logged: false,
            deferred: PendingChanges::new(),
        }
    }

    /// Returns the registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the configuration.
    pub fn config(&self) -> &IntfdConfig {
        &self.config
    }

    /// Returns the maximum MTU currently in effect.
    pub fn max_mtu(&self) -> u32 {
        self.max_mtu
    }

    /// Returns true once the system reported its initial configuration.
    pub fn is_system_ready(&self) -> bool {
        self.system_ready
    }

    /// Returns the number of row changes waiting for the next reconcile.
    pub fn deferred_changes(&self) -> usize {
        self.deferred.pending_count()
    }

    /// Renders the debug dump for one interface or all of them.
    pub fn debug_dump(&self, name: Option<&str>) -> String {
        dump::render(&self.registry, name)
    }

    /// Runs passes until `shutdown` resolves.
    ///
    /// Retryable store errors are logged and the loop continues; anything
    /// else ends the loop.
    pub async fn run<S, F>(&mut self, store: &mut S, shutdown: F) -> IntfdResult<()>
    where
        S: Store,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("intfd reconciliation loop started");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, leaving reconciliation loop");
                    return Ok(());
                }
                result = self.run_once(store) => match result {
                    Ok(_) => {}
                    Err(e) if e.is_retryable() => warn!("Transient store error: {}", e),
                    Err(e) => {
                        error!("Store error: {}", e);
                        return Err(e);
                    }
                },
            }
        }
    }

    /// Runs one reconciliation pass against the store.
    pub async fn run_once<S: Store>(&mut self, store: &mut S) -> IntfdResult<PassOutcome> {
        let batch = store.wait_for_changes(self.config.poll_timeout()).await?;
        if !batch.is_empty() {
            self.deferred.merge(batch);
        }

        match store.lock_state() {
            LockState::Contended => {
                if !self.contention_logged {
                    error!(
                        "Another intfd instance holds lock {}",
                        self.config.store.lock_name
                    );
                    self.contention_logged = true;
                }
                return Ok(PassOutcome::NotLeader);
            }
            LockState::Pending => {
                debug!("Waiting for lock {}", self.config.store.lock_name);
                return Ok(PassOutcome::NotLeader);
            }
            LockState::Held => {
                if self.contention_logged {
                    info!("Acquired lock {}", self.config.store.lock_name);
                    self.contention_logged = false;
                }
            }
        }

        if !self.system_ready {
            let ready = self
                .deferred
                .system()
                .is_some_and(|system| system.cur_cfg > 0);
            if !ready {
                return Ok(PassOutcome::SystemNotReady);
            }
            info!("System configuration complete, starting reconciliation");
            self.system_ready = true;
        }

        let mut txn = Transaction::new();
        let batch = self.deferred.take();
        self.reconcile(batch, &mut txn);
        if txn.is_empty() {
            return Ok(PassOutcome::Idle);
        }

        let count = txn.len();
        match store.commit(txn).await {
            Ok(()) => {
                debug!("Committed updates for {} interfaces", count);
                Ok(PassOutcome::Committed(count))
            }
            Err(e) => {
                error!("Failed to commit interface updates: {}", e);
                Ok(PassOutcome::CommitFailed)
            }
        }
    }

    /// Folds one change batch into the registry and queues the resulting
    /// writes into `txn`.
    pub fn reconcile(&mut self, batch: ChangeBatch, txn: &mut Transaction) {
        let mut dirty = BTreeSet::new();

        self.apply_subsystems(&batch.subsystems, &mut dirty);

        let (deleted, updated): (Vec<_>, Vec<_>) =
            batch.interfaces.into_iter().partition(|c| c.op.is_del());
        for change in &deleted {
            self.delete_interface(&change.key, &mut dirty);
        }

        let mut inserted = Vec::new();
        let mut modified = Vec::new();
        for change in updated {
            let Some(row) = change.row else { continue };
            if self.registry.contains_interface(&row.name) {
                modified.push(row);
            } else if self.insert_interface(&row) {
                inserted.push(row.name);
            }
        }

        self.apply_ports(&batch.ports, &mut dirty);

        for name in inserted {
            dirty.extend(hierarchy::link(&mut self.registry, &name));
            dirty.insert(name);
        }
        for row in &modified {
            self.modify_interface(row, &mut dirty);
        }

        for name in &dirty {
            self.derive_interface(name, txn);
        }
        self.arbitrate(txn);
    }

    fn apply_subsystems(&mut self, changes: &[RowChange<SubsystemRow>], dirty: &mut BTreeSet<String>) {
        let subsystem = self.config.system.subsystem.as_str();
        for change in changes.iter().filter(|c| c.key == subsystem) {
            let Some(row) = &change.row else {
                warn!("Subsystem {} deleted, keeping max MTU {}", subsystem, self.max_mtu);
                continue;
            };
            let max_mtu = normalizer::parse_max_mtu(row);
            if max_mtu == self.max_mtu {
                continue;
            }
            info!("Max MTU changed from {} to {}", self.max_mtu, max_mtu);
            self.max_mtu = max_mtu;
            for entity in self.registry.interfaces_mut() {
                let user = UserConfig::parse(&entity.user_config_map, &entity.hw, max_mtu);
                if user != entity.user {
                    entity.user = user;
                    dirty.insert(entity.name.clone());
                }
            }
        }
    }

    #[instrument(skip(self, dirty))]
    fn delete_interface(&mut self, name: &str, dirty: &mut BTreeSet<String>) {
        let Some(entity) = self.registry.remove_interface(name) else {
            debug!("Delete for unknown interface {}", name);
            return;
        };
        dirty.remove(name);
        info!("Interface {} removed", name);

        for child in &entity.split_children {
            if self.registry.contains_interface(child) {
                hierarchy::refresh_transceiver(&mut self.registry, child);
                dirty.insert(child.clone());
            }
        }
    }

    #[instrument(skip(self, row), fields(interface = %row.name))]
    fn insert_interface(&mut self, row: &InterfaceRow) -> bool {
        let mut entity = InterfaceEntity::from_row(row, self.max_mtu);
        entity.port_admin = self.registry.port_admin_of(&row.name);
        entity.layers = self.arbiter.seed(&entity.forwarding_state);
        match self.registry.insert_interface(entity) {
            Ok(()) => {
                info!("Interface {} added", row.name);
                true
            }
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    #[instrument(skip(self, row, dirty), fields(interface = %row.name))]
    fn modify_interface(&mut self, row: &InterfaceRow, dirty: &mut BTreeSet<String>) {
        let max_mtu = self.max_mtu;
        let Ok(entity) = self.registry.require_interface_mut(&row.name) else {
            return;
        };

        let hw = HardwareInfo::parse(&row.hw_intf_info);
        let user = UserConfig::parse(&row.user_config, &hw, max_mtu);
        let module = ModuleReport::parse(&row.pm_info);

        let module_changed = entity.module != module;
        let lane_split_changed = entity.user.lane_split != user.lane_split;
        let links_changed = entity.split_parent != row.split_parent
            || entity.split_children != row.split_children;

        entity.intf_type = normalizer::parse_interface_type(&row.intf_type);
        entity.user_config_map = row.user_config.clone();
        entity.user = user;
        entity.hw = hw;
        entity.module = module;
        entity.split_parent = row.split_parent.clone();
        entity.split_children = row.split_children.clone();
        entity.bond_state = row.bond_status.get(bond_status::STATE).cloned();
        entity.hw_ready =
            row.hw_status.get(hw_status::READY).map(String::as_str) == Some(values::TRUE);
        entity.hw_intf_config = row.hw_intf_config.clone();
        entity.error = row.error.clone();
        entity.forwarding_state = row.forwarding_state.clone();
        let is_parent = entity.is_split_parent();

        if links_changed {
            dirty.extend(hierarchy::link(&mut self.registry, &row.name));
        }
        hierarchy::refresh_transceiver(&mut self.registry, &row.name);

        if is_parent && module_changed {
            debug!("Module of {} changed, refreshing split children", row.name);
            dirty.extend(hierarchy::refresh_children(&mut self.registry, &row.name));
        }
        if is_parent && lane_split_changed {
            debug!("Lane split of {} changed, re-deriving split children", row.name);
            dirty.extend(hierarchy::refresh_children(&mut self.registry, &row.name));
        }
        dirty.insert(row.name.clone());
    }

    fn apply_ports(&mut self, changes: &[RowChange<PortRow>], dirty: &mut BTreeSet<String>) {
        let mut affected = BTreeSet::new();

        for change in changes {
            match &change.row {
                None => match self.registry.remove_port(&change.key) {
                    Some(old) => {
                        info!("Port {} removed", change.key);
                        affected.extend(old.members);
                    }
                    None => debug!("Delete for unknown port {}", change.key),
                },
                Some(row) => {
                    let port = PortEntity::from_row(row);
                    affected.extend(port.members.iter().cloned());
                    let result = if self.registry.port(&port.name).is_some() {
                        self.registry.replace_port(port).map(|old| {
                            affected.extend(old.members);
                        })
                    } else {
                        self.registry.insert_port(port)
                    };
                    if let Err(e) = result {
                        warn!("{}", e);
                    }
                }
            }
        }

        for name in affected {
            let admin = self.registry.port_admin_of(&name);
            match self.registry.interface_mut(&name) {
                Some(entity) => {
                    if entity.port_admin != admin {
                        debug!("Port admin of {} is now {}", name, admin);
                    }
                    entity.port_admin = admin;
                    dirty.insert(name);
                }
                None => debug!("Port member {} not present", name),
            }
        }
    }

    fn derive_interface(&mut self, name: &str, txn: &mut Transaction) {
        let parent_lane_split = hierarchy::parent_lane_split(&self.registry, name);
        let Some(entity) = self.registry.interface_mut(name) else {
            return;
        };

        entity.oper = derivation::derive(entity, parent_lane_split);

        let config = hw_config::build(entity);
        if config != entity.hw_intf_config {
            txn.set_hw_intf_config(name, config.clone());
            entity.hw_intf_config = config;
        }
        let error = hw_config::error_value(entity);
        if error != entity.error {
            txn.set_error(name, error.clone());
            entity.error = error;
        }
    }

    fn arbitrate(&mut self, txn: &mut Transaction) {
        for entity in self.registry.interfaces_mut() {
            let state = self.arbiter.evaluate(entity);
            if state != entity.forwarding_state {
                debug!("Forwarding state of {} changed", entity.name);
                txn.set_forwarding_state(&entity.name, state.clone());
                entity.forwarding_state = state;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonic_intfd_store::{ColumnMap, MemoryStore, SystemRow};

    fn row_with(name: &str, user: &[(&str, &str)]) -> InterfaceRow {
        let mut row = InterfaceRow::new(name);
        row.user_config = user
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<ColumnMap>();
        row
    }

    fn ready_batch() -> ChangeBatch {
        ChangeBatch {
            system: Some(SystemRow { cur_cfg: 1 }),
            ..Default::default()
        }
    }

    #[test]
    fn test_reconcile_admin_down_interface() {
        let mut mgr = IntfMgr::new(IntfdConfig::default());
        let mut batch = ready_batch();
        batch
            .interfaces
            .push(RowChange::set("1", row_with("1", &[("admin", "down")])));

        let mut txn = Transaction::new();
        mgr.reconcile(batch, &mut txn);

        let update = txn.get("1").unwrap();
        assert_eq!(update.error, Some(Some("admin_down".to_string())));
        let entity = mgr.registry().interface("1").unwrap();
        assert!(!entity.oper.enabled);
        assert_eq!(
            entity.forwarding_state.get("forwarding").map(String::as_str),
            Some("false")
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut mgr = IntfMgr::new(IntfdConfig::default());
        let mut batch = ready_batch();
        batch
            .interfaces
            .push(RowChange::set("1", row_with("1", &[("admin", "up")])));
        let mut txn = Transaction::new();
        mgr.reconcile(batch.clone(), &mut txn);
        assert!(!txn.is_empty());

        let row = {
            let entity = mgr.registry().interface("1").unwrap();
            let mut row = row_with("1", &[("admin", "up")]);
            row.hw_intf_config = entity.hw_intf_config.clone();
            row.error = entity.error.clone();
            row.forwarding_state = entity.forwarding_state.clone();
            row
        };
        let mut again = ChangeBatch::default();
        again.interfaces.push(RowChange::set("1", row));
        let mut txn = Transaction::new();
        mgr.reconcile(again, &mut txn);
        assert!(txn.is_empty());
    }

    #[test]
    fn test_subsystem_mtu_change_renormalizes() {
        let mut mgr = IntfMgr::new(IntfdConfig::default());
        let mut batch = ready_batch();
        batch
            .interfaces
            .push(RowChange::set("1", row_with("1", &[("mtu", "9000")])));
        mgr.reconcile(batch, &mut Transaction::new());
        assert!(mgr.registry().interface("1").unwrap().user.mtu.is_invalid());

        let subsystem = SubsystemRow {
            name: "base".to_string(),
            other_info: ColumnMap::from([(
                "max_transmission_unit".to_string(),
                "9216".to_string(),
            )]),
        };
        let mut batch = ChangeBatch::default();
        batch.subsystems.push(RowChange::set("base", subsystem));
        mgr.reconcile(batch, &mut Transaction::new());

        assert_eq!(mgr.max_mtu(), 9216);
        assert_eq!(
            mgr.registry().interface("1").unwrap().user.mtu.value(),
            Some(9000)
        );
    }

    #[tokio::test]
    async fn test_run_once_waits_for_system_ready() {
        let mut store = MemoryStore::new();
        store.upsert_interface(row_with("1", &[("admin", "up")]));
        let mut mgr = IntfMgr::new(IntfdConfig::default());

        let outcome = mgr.run_once(&mut store).await.unwrap();
        assert_eq!(outcome, PassOutcome::SystemNotReady);
        assert_eq!(mgr.registry().interface_count(), 0);

        store.set_cur_cfg(1);
        let outcome = mgr.run_once(&mut store).await.unwrap();
        assert!(matches!(outcome, PassOutcome::Committed(1)));
        assert!(mgr.is_system_ready());
    }

    #[tokio::test]
    async fn test_contended_updates_fold_per_row() {
        let mut store = MemoryStore::new();
        store.set_cur_cfg(1);
        store.set_lock_state(LockState::Contended);
        let mut mgr = IntfMgr::new(IntfdConfig {
            store: crate::config::StoreConfig {
                poll_timeout_ms: 1,
                ..Default::default()
            },
            ..Default::default()
        });

        for mtu in 1000..1100 {
            let mtu = mtu.to_string();
            store.upsert_interface(row_with("1", &[("admin", "up"), ("mtu", mtu.as_str())]));
            let outcome = mgr.run_once(&mut store).await.unwrap();
            assert_eq!(outcome, PassOutcome::NotLeader);
        }
        // The System row and a single Interface change.
        assert_eq!(mgr.deferred_changes(), 2);

        store.set_lock_state(LockState::Held);
        let outcome = mgr.run_once(&mut store).await.unwrap();
        assert!(matches!(outcome, PassOutcome::Committed(1)));
        assert_eq!(mgr.deferred_changes(), 0);
        let entity = mgr.registry().interface("1").unwrap();
        assert_eq!(entity.user_config_map.get("mtu").map(String::as_str), Some("1099"));
    }

    #[test]
    fn test_run_stops_on_shutdown() {
        let mut store = MemoryStore::new();
        let mut mgr = IntfMgr::new(IntfdConfig::default());
        let result = tokio_test::block_on(mgr.run(&mut store, std::future::ready(())));
        assert!(result.is_ok());
    }
}
