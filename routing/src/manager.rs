// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The routing engine: service surface, lifecycle and packet entry point.

use crate::RoutingError;
use crate::classify::{LaneEvent, PacketClassifier};
use crate::config::RoutingConfig;
use crate::connectivity::ExternalConnectivityChecker;
use crate::handlers::EventDispatcher;
use crate::iftable::RouterInterfaceRegistry;
use crate::lanes::LaneStats;
use crate::source::PacketProcessor;
use nat::PortAllocator;
use net::packet::PacketContext;
use openstack::{FloatingIp, FloatingIpId, OpenstackRouter, RouterId, RouterInterface};
use std::sync::Arc;
#[allow(unused)]
use tracing::{debug, error, info, warn};

/// Service contract exposed to external callers (e.g. a REST layer) for
/// control-plane events about routers, router interfaces and floating IPs.
pub trait RoutingControl {
    /// A floating IP was created. Handled by the floating-IP subsystem; no
    /// routing-core behavior.
    fn create_floating_ip(&self, floating_ip: &FloatingIp);

    /// A floating IP was updated. Handled by the floating-IP subsystem; no
    /// routing-core behavior.
    fn update_floating_ip(&self, floating_ip: &FloatingIp);

    /// A floating IP was deleted. Handled by the floating-IP subsystem; no
    /// routing-core behavior.
    fn delete_floating_ip(&self, id: &FloatingIpId);

    /// A router was created: set up external connectivity for the
    /// interfaces already known for it.
    ///
    /// # Errors
    ///
    /// Fails when an interface cannot be resolved or rule installation
    /// fails.
    fn create_router(&self, router: &OpenstackRouter) -> Result<(), RoutingError>;

    /// A router was updated. Same behavior as [`RoutingControl::create_router`].
    ///
    /// # Errors
    ///
    /// Fails when an interface cannot be resolved or rule installation
    /// fails.
    fn update_router(&self, router: &OpenstackRouter) -> Result<(), RoutingError>;

    /// A router was deleted. Declared surface; teardown is driven
    /// per-interface through [`RoutingControl::remove_router_interface`].
    fn delete_router(&self, id: &RouterId);

    /// An interface was attached to (or updated on) a router: record it and
    /// set up external connectivity for it.
    ///
    /// # Errors
    ///
    /// Fails with [`RoutingError::NoRouterForTenant`] when the provider
    /// knows no router for the interface's tenant; the interface stays
    /// recorded and is picked up by a later router create/update.
    fn update_router_interface(&self, interface: &RouterInterface) -> Result<(), RoutingError>;

    /// An interface was detached: tear down its external rules and forget
    /// it. Detaching an unknown interface is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates rule-removal failures.
    fn remove_router_interface(&self, interface: &RouterInterface) -> Result<(), RoutingError>;
}

// The engine's registration with the packet pipeline: classify, then hand
// the event to its lane. Never blocks.
struct InternalPacketProcessor {
    classifier: PacketClassifier,
    icmp: crate::lanes::LaneSender<crate::classify::IcmpEvent>,
    pnat: crate::lanes::LaneSender<crate::classify::PnatEvent>,
}

impl PacketProcessor for InternalPacketProcessor {
    fn process(&self, ctx: &Arc<PacketContext>) {
        match self.classifier.classify(ctx) {
            Ok(None) => {}
            Ok(Some(LaneEvent::Icmp(event))) => {
                if let Err(e) = self.icmp.submit(event) {
                    warn!("icmp event not queued: {e}");
                }
            }
            Ok(Some(LaneEvent::Pnat(event))) => {
                if let Err(e) = self.pnat.submit(event) {
                    warn!("pnat event not queued: {e}");
                }
            }
            Err(e) => {
                // Data-plane path: nothing upstream to signal, log and move on.
                warn!("packet on {} not classified: {e}", ctx.device());
            }
        }
    }
}

// Live state between start() and stop().
struct Running {
    dispatcher: EventDispatcher,
    processor: Arc<dyn PacketProcessor>,
}

/// Populates flow rules for the L3 functionality of OpenStack VMs.
///
/// The manager owns the port pool and the interface registry, implements
/// [`RoutingControl`], and between [`RoutingManager::start`] and
/// [`RoutingManager::stop`] processes inbound packets from the configured
/// [`crate::PacketSource`].
pub struct RoutingManager {
    config: RoutingConfig,
    allocator: Arc<PortAllocator>,
    registry: Arc<RouterInterfaceRegistry>,
    checker: ExternalConnectivityChecker,
    running: Option<Running>,
}

impl RoutingManager {
    /// Build a stopped manager from its collaborator set.
    #[must_use]
    pub fn new(config: RoutingConfig) -> RoutingManager {
        let allocator = Arc::new(PortAllocator::new());
        let registry = Arc::new(RouterInterfaceRegistry::new(Arc::clone(&config.populator)));
        let checker = ExternalConnectivityChecker::new(
            Arc::clone(&config.provider),
            Arc::clone(&config.populator),
        );
        RoutingManager {
            config,
            allocator,
            registry,
            checker,
            running: None,
        }
    }

    /// Spawn the lane workers and register with the packet pipeline.
    ///
    /// # Errors
    ///
    /// Fails if the manager is already started or a worker cannot be
    /// spawned.
    pub fn start(&mut self) -> Result<(), RoutingError> {
        if self.running.is_some() {
            return Err(RoutingError::Internal("engine already started"));
        }

        let dispatcher = EventDispatcher::start(
            Arc::clone(&self.config.icmp_responder),
            Arc::clone(&self.config.populator),
        )?;

        let processor: Arc<dyn PacketProcessor> = Arc::new(InternalPacketProcessor {
            classifier: PacketClassifier::new(
                Arc::clone(&self.config.provider),
                Arc::clone(&self.allocator),
            ),
            icmp: dispatcher.icmp_sender(),
            pnat: dispatcher.pnat_sender(),
        });
        self.config.packet_source.add_processor(Arc::clone(&processor));

        self.running = Some(Running {
            dispatcher,
            processor,
        });
        info!("l3 routing engine started");
        Ok(())
    }

    /// Unregister from the packet pipeline, drain the lanes and join their
    /// workers.
    ///
    /// # Errors
    ///
    /// Fails if the manager is not started or a worker cannot be joined.
    pub fn stop(&mut self) -> Result<(), RoutingError> {
        let mut running = self
            .running
            .take()
            .ok_or(RoutingError::Internal("engine is not started"))?;

        // No new submissions once the pipeline forgets us; then drain.
        self.config.packet_source.remove_processor(&running.processor);
        running.dispatcher.finish()?;
        info!("l3 routing engine stopped");
        Ok(())
    }

    /// Whether the lanes are up and the engine is registered for packets.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// The engine's port pool.
    #[must_use]
    pub fn allocator(&self) -> &PortAllocator {
        &self.allocator
    }

    /// Counters of the ICMP lane, when running.
    #[must_use]
    pub fn icmp_stats(&self) -> Option<Arc<LaneStats>> {
        self.running.as_ref().map(|r| r.dispatcher.icmp_stats())
    }

    /// Counters of the L3/PNAT lane, when running.
    #[must_use]
    pub fn pnat_stats(&self) -> Option<Arc<LaneStats>> {
        self.running.as_ref().map(|r| r.dispatcher.pnat_stats())
    }

    pub(crate) fn registry(&self) -> &RouterInterfaceRegistry {
        &self.registry
    }
}

impl Drop for RoutingManager {
    fn drop(&mut self) {
        if self.running.is_some() {
            let _ = self.stop();
        }
    }
}

impl RoutingControl for RoutingManager {
    fn create_floating_ip(&self, _floating_ip: &FloatingIp) {}

    fn update_floating_ip(&self, _floating_ip: &FloatingIp) {}

    fn delete_floating_ip(&self, _id: &FloatingIpId) {}

    fn create_router(&self, router: &OpenstackRouter) -> Result<(), RoutingError> {
        let interfaces = self.registry.interfaces_of(&router.id);
        self.checker.check(router, &interfaces)
    }

    fn update_router(&self, router: &OpenstackRouter) -> Result<(), RoutingError> {
        let interfaces = self.registry.interfaces_of(&router.id);
        self.checker.check(router, &interfaces)
    }

    fn delete_router(&self, _id: &RouterId) {}

    fn update_router_interface(&self, interface: &RouterInterface) -> Result<(), RoutingError> {
        self.registry.attach(interface.clone());
        let router = self
            .config
            .provider
            .router_for_tenant(&interface.tenant_id)
            .ok_or_else(|| RoutingError::NoRouterForTenant(interface.tenant_id.clone()))?;
        self.checker.check(&router, std::slice::from_ref(interface))
    }

    fn remove_router_interface(&self, interface: &RouterInterface) -> Result<(), RoutingError> {
        self.registry.detach(interface)
    }
}
