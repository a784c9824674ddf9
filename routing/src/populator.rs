// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The rule-installation collaborator.

use nat::PnatPort;
use net::Vni;
use net::packet::PacketContext;
use openstack::{OpenstackPort, OpenstackRouter, RouterInterface};

/// Error reported by the rule-installation subsystem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rule installation failed: {0}")]
pub struct PopulatorError(String);

impl PopulatorError {
    /// Build an error from the subsystem's message.
    pub fn new(msg: impl Into<String>) -> PopulatorError {
        PopulatorError(msg.into())
    }
}

/// Compiles and programs forwarding rules onto network devices.
///
/// All operations are synchronous and side-effecting; the engine never
/// retries them. Implementations front the controller's flow-objective
/// compiler and device drivers.
pub trait RulePopulator: Send + Sync {
    /// Install the rules giving `interface`'s network (dataplane segment
    /// `vni`) external connectivity through `router`'s gateway.
    fn populate_external_rules(
        &self,
        vni: Vni,
        router: &OpenstackRouter,
        interface: &RouterInterface,
    ) -> Result<(), PopulatorError>;

    /// Remove the external-connectivity rules installed for `interface`.
    fn remove_external_rules(&self, interface: &RouterInterface) -> Result<(), PopulatorError>;

    /// Install the PNAT rewrite rules for one outbound flow: traffic from
    /// `vm_port` described by `ctx` leaves through ephemeral source port
    /// `pnat_port`.
    fn populate_pnat_rules(
        &self,
        ctx: &PacketContext,
        pnat_port: PnatPort,
        vm_port: &OpenstackPort,
    ) -> Result<(), PopulatorError>;
}
