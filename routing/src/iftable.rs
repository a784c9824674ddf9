// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Attached router-interface table.

use crate::RoutingError;
use crate::populator::RulePopulator;
use openstack::{PortId, RouterId, RouterInterface};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// The registry of currently attached router interfaces, keyed by the
/// attachment port.
///
/// The table is mutated from lane workers and from direct control-surface
/// calls; all access goes through one mutex, held only for the insert,
/// remove or scan, and never across a call into the [`RulePopulator`].
pub struct RouterInterfaceRegistry {
    populator: Arc<dyn RulePopulator>,
    interfaces: Mutex<HashMap<PortId, RouterInterface>>,
}

impl RouterInterfaceRegistry {
    /// Build an empty registry. `populator` is invoked on detach to tear
    /// down the detached interface's external rules.
    #[must_use]
    pub fn new(populator: Arc<dyn RulePopulator>) -> RouterInterfaceRegistry {
        RouterInterfaceRegistry {
            populator,
            interfaces: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attached interface.
    ///
    /// At most one interface is live per attachment port: an attach for a
    /// port that already has one keeps the first-seen record.
    pub fn attach(&self, interface: RouterInterface) {
        let mut interfaces = self.interfaces.lock().unwrap();
        match interfaces.entry(interface.port_id.clone()) {
            std::collections::hash_map::Entry::Vacant(entry) => {
                debug!(
                    "attached interface {} (router {}, port {})",
                    interface.id, interface.router_id, interface.port_id
                );
                entry.insert(interface);
            }
            std::collections::hash_map::Entry::Occupied(_) => {
                debug!(
                    "port {} already has an attached interface; keeping the first-seen record",
                    interface.port_id
                );
            }
        }
    }

    /// Remove the interface attached through `interface`'s port, tearing
    /// down its external rules.
    ///
    /// Detaching a port with no attached interface is a no-op. For a known
    /// interface the entry is removed unconditionally and
    /// [`RulePopulator::remove_external_rules`] runs exactly once, on the
    /// record the registry held (not the caller's copy).
    ///
    /// # Errors
    ///
    /// Propagates the populator's failure; the entry stays removed.
    pub fn detach(&self, interface: &RouterInterface) -> Result<(), RoutingError> {
        let removed = self.interfaces.lock().unwrap().remove(&interface.port_id);
        let Some(known) = removed else {
            debug!("no attached interface for port {}; nothing to detach", interface.port_id);
            return Ok(());
        };
        debug!(
            "detached interface {} (router {}, port {})",
            known.id, known.router_id, known.port_id
        );
        self.populator.remove_external_rules(&known)?;
        Ok(())
    }

    /// All currently attached interfaces of `router`.
    ///
    /// Linear scan; interface cardinality per controller instance is tens to
    /// low hundreds.
    #[must_use]
    pub fn interfaces_of(&self, router: &RouterId) -> Vec<RouterInterface> {
        self.interfaces
            .lock()
            .unwrap()
            .values()
            .filter(|interface| &interface.router_id == router)
            .cloned()
            .collect()
    }

    /// Number of attached interfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interfaces.lock().unwrap().len()
    }

    /// Whether no interface is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
