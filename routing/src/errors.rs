// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The error results used by this library.

use crate::populator::PopulatorError;
use nat::AllocatorError;
use net::Mac;
use openstack::{NetworkId, PortId, TenantId};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RoutingError {
    #[error("no router found for tenant {0}")]
    NoRouterForTenant(TenantId),

    #[error("no port {0} in the networking provider")]
    UnknownPort(PortId),

    #[error("no network {0} in the networking provider")]
    UnknownNetwork(NetworkId),

    #[error("network {network} has unusable segment id '{segment}'")]
    BadSegmentId { network: NetworkId, segment: String },

    #[error("no VM port with mac {0} and a matching fixed IP")]
    UnknownVmPort(Mac),

    #[error(transparent)]
    PortAllocation(#[from] AllocatorError),

    #[error(transparent)]
    RuleInstallation(#[from] PopulatorError),

    #[error("internal error: {0}")]
    Internal(&'static str),
}
