// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Engine configuration: the collaborators a [`crate::RoutingManager`] needs.

use crate::handlers::IcmpResponder;
use crate::populator::RulePopulator;
use crate::source::PacketSource;
use derive_builder::Builder;
use openstack::OpenstackData;
use std::sync::Arc;

/// The collaborator set of the engine. N.B. we derive a builder type
/// `RoutingConfigBuilder`; every collaborator is required.
#[derive(Builder, Clone)]
#[builder(pattern = "owned")]
pub struct RoutingConfig {
    /// Live query interface onto the OpenStack networking state.
    pub provider: Arc<dyn OpenstackData>,

    /// The rule-installation subsystem.
    pub populator: Arc<dyn RulePopulator>,

    /// The pipeline delivering inbound packets.
    pub packet_source: Arc<dyn PacketSource>,

    /// Responder invoked from the ICMP lane.
    pub icmp_responder: Arc<dyn IcmpResponder>,
}
