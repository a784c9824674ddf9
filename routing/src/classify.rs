// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Inbound packet classification.

use crate::RoutingError;
use nat::{FlowKey, PnatPort, PortAllocator};
use net::Mac;
use net::ip::IpProtocol;
use net::packet::PacketContext;
use openstack::{OpenstackData, OpenstackPort};
use std::net::Ipv4Addr;
use std::sync::Arc;

/// A unit of work bound for the ICMP lane.
#[derive(Debug)]
pub struct IcmpEvent {
    /// The packet the event is about.
    pub ctx: Arc<PacketContext>,
}

/// A unit of work bound for the L3/PNAT lane.
#[derive(Debug)]
pub struct PnatEvent {
    /// The packet the event is about.
    pub ctx: Arc<PacketContext>,
    /// Ephemeral source port allocated for the flow.
    pub pnat_port: PnatPort,
    /// The VM port the flow originates from.
    pub vm_port: OpenstackPort,
}

/// The lane an inbound packet was assigned to, with the context the lane's
/// handler needs. Lives for one dispatch cycle.
#[derive(Debug)]
pub enum LaneEvent {
    /// Needs ICMP handling.
    Icmp(IcmpEvent),
    /// Outbound flow needing PNAT.
    Pnat(PnatEvent),
}

/// Inspects each inbound packet and decides which event lane, if any, it
/// belongs on.
///
/// Classification never blocks: it performs lookups, a port allocation and
/// nothing else, leaving all rule-installation work to the lane workers so
/// the controller's packet-dispatch path is never stalled.
pub struct PacketClassifier {
    provider: Arc<dyn OpenstackData>,
    allocator: Arc<PortAllocator>,
}

impl PacketClassifier {
    /// Build a classifier over the given provider and port pool.
    #[must_use]
    pub fn new(provider: Arc<dyn OpenstackData>, allocator: Arc<PortAllocator>) -> PacketClassifier {
        PacketClassifier {
            provider,
            allocator,
        }
    }

    /// Classify one inbound packet.
    ///
    /// Packets already claimed by a higher-priority processor, and non-IPv4
    /// frames, yield `Ok(None)` with no side effect. ICMP goes to the ICMP
    /// lane as-is. Any other IPv4 packet is an outbound flow needing PNAT: a
    /// port is bound to (source mac, source IP) and the originating VM port
    /// is resolved through the provider. The context is marked handled
    /// exactly when an event is produced.
    ///
    /// # Errors
    ///
    /// Fails on pool exhaustion, or with [`RoutingError::UnknownVmPort`]
    /// when no VM port matches the packet's source; in the latter case the
    /// just-allocated port is released again.
    pub fn classify(&self, ctx: &Arc<PacketContext>) -> Result<Option<LaneEvent>, RoutingError> {
        if ctx.is_handled() {
            return Ok(None);
        }
        let Some(ipv4) = ctx.frame().try_ipv4() else {
            return Ok(None);
        };

        if ipv4.protocol == IpProtocol::Icmp {
            ctx.mark_handled();
            return Ok(Some(LaneEvent::Icmp(IcmpEvent {
                ctx: Arc::clone(ctx),
            })));
        }

        let src_mac = ctx.frame().source();
        let pnat_port = self.allocator.allocate(FlowKey::new(src_mac, ipv4.source))?;
        let Some(vm_port) = self.resolve_vm_port(src_mac, ipv4.source) else {
            // Nothing downstream will ever see this binding; give it back.
            let _ = self.allocator.release(pnat_port);
            return Err(RoutingError::UnknownVmPort(src_mac));
        };

        ctx.mark_handled();
        Ok(Some(LaneEvent::Pnat(PnatEvent {
            ctx: Arc::clone(ctx),
            pnat_port,
            vm_port,
        })))
    }

    // The VM port the flow originates from: matched by source mac, confirmed
    // by a fixed IP equal to the packet's source address.
    fn resolve_vm_port(&self, mac: Mac, addr: Ipv4Addr) -> Option<OpenstackPort> {
        self.provider
            .port_by_mac(mac)
            .filter(|port| port.has_fixed_ip(addr))
    }
}
