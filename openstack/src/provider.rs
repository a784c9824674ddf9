// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Read-only query interface onto the OpenStack networking provider.

use crate::id::{NetworkId, PortId, TenantId};
use crate::model::{OpenstackNetwork, OpenstackPort, OpenstackRouter};
use net::Mac;

/// The networking data provider.
///
/// Implementations front the controller's OpenStack (neutron) state. The
/// engine queries live on every operation and holds no results across calls,
/// so answers may change between two queries of the same object.
pub trait OpenstackData: Send + Sync {
    /// The port with the given id, if known.
    fn port(&self, id: &PortId) -> Option<OpenstackPort>;

    /// The port with the given mac address, if known.
    fn port_by_mac(&self, mac: Mac) -> Option<OpenstackPort>;

    /// The network with the given id, if known.
    fn network(&self, id: &NetworkId) -> Option<OpenstackNetwork>;

    /// All routers known to the provider.
    fn routers(&self) -> Vec<OpenstackRouter>;

    /// The first router owned by `tenant`, if any.
    fn router_for_tenant(&self, tenant: &TenantId) -> Option<OpenstackRouter> {
        self.routers().into_iter().find(|r| &r.tenant_id == tenant)
    }
}
