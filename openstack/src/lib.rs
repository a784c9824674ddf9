// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]

//! OpenStack networking data model for the L3 gateway engine.
//!
//! The controller's OpenStack networking provider is the source of truth for
//! ports, networks and routers. This crate models the slice of that data the
//! routing engine consumes, plus the [`OpenstackData`] query trait through
//! which the engine reads it. The data is read-only to the engine and is
//! re-queried on every operation, never cached.

mod id;
mod model;
mod provider;

pub use id::{
    FloatingIpId, Id, InterfaceId, NetworkId, PortId, RouterId, SubnetId, Tenant, TenantId,
};
pub use model::{
    ExternalGateway, FloatingIp, OpenstackNetwork, OpenstackPort, OpenstackRouter, RouterInterface,
};
pub use provider::OpenstackData;
