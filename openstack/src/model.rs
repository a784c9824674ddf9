// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The OpenStack networking objects the routing engine reads.

use crate::id::{FloatingIpId, InterfaceId, NetworkId, PortId, RouterId, SubnetId, TenantId};
use net::Mac;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// A neutron port: the attachment point of a VM (or router interface) to a
/// tenant network.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OpenstackPort {
    /// Port identifier.
    pub id: PortId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Network the port attaches to.
    pub network_id: NetworkId,
    /// Mac address of the port.
    pub mac: Mac,
    /// Fixed IPv4 addresses of the port, keyed by subnet.
    pub fixed_ips: BTreeMap<SubnetId, Ipv4Addr>,
}

impl OpenstackPort {
    /// Whether any of the port's fixed IPs equals `addr`.
    #[must_use]
    pub fn has_fixed_ip(&self, addr: Ipv4Addr) -> bool {
        self.fixed_ips.values().any(|ip| *ip == addr)
    }
}

/// A neutron network, carrying the dataplane segment id of its overlay.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OpenstackNetwork {
    /// Network identifier.
    pub id: NetworkId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Segment (VNI) in the decimal string form the provider supplies it in.
    pub segment_id: String,
}

/// A router's attachment to a provider/external network.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ExternalGateway {
    /// Fixed IP on each external network the router is attached to.
    pub external_fixed_ips: BTreeMap<NetworkId, Ipv4Addr>,
    /// Whether outbound flows are source-NATed through the gateway.
    pub enable_pnat: bool,
}

impl ExternalGateway {
    /// Any one of the configured external fixed IPs.
    ///
    /// When a router attaches to several external networks the choice among
    /// them is unspecified; callers must not depend on which one they get.
    #[must_use]
    pub fn any_external_ip(&self) -> Option<Ipv4Addr> {
        self.external_fixed_ips.values().next().copied()
    }
}

/// A neutron router. Supplied by the provider, read-only to the engine.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OpenstackRouter {
    /// Router identifier.
    pub id: RouterId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Human-readable name.
    pub name: String,
    /// External gateway info. An absent gateway is modeled as the default
    /// (no external IPs, PNAT disabled).
    pub gateway: ExternalGateway,
}

/// An interface attaching a router to a tenant network through a port.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RouterInterface {
    /// Interface identifier.
    pub id: InterfaceId,
    /// The router this interface belongs to.
    pub router_id: RouterId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// The port the interface attaches through. At most one live interface
    /// exists per port.
    pub port_id: PortId,
}

/// A floating IP association. Modeled for the service surface; all behavior
/// belongs to the floating-IP subsystem.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FloatingIp {
    /// Floating IP identifier.
    pub id: FloatingIpId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// The publicly routable address.
    pub address: Ipv4Addr,
    /// The tenant port the address maps to, when associated.
    pub port_id: Option<PortId>,
}
