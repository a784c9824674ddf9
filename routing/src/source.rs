// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Packet pipeline traits: where inbound packets come from.

use net::packet::PacketContext;
use std::sync::Arc;

/// A processor of inbound packets, invoked by the pipeline for every packet
/// in priority order.
pub trait PacketProcessor: Send + Sync {
    /// Look at one inbound packet. Must not block: the pipeline dispatches
    /// packets to every processor from its dispatch path.
    fn process(&self, ctx: &Arc<PacketContext>);
}

/// The controller's packet pipeline, as seen by this engine.
///
/// The engine registers its processor on start and removes it on stop;
/// everything between a wire and a [`PacketContext`] is the pipeline's
/// concern.
pub trait PacketSource: Send + Sync {
    /// Register a processor for inbound packets.
    fn add_processor(&self, processor: Arc<dyn PacketProcessor>);

    /// Remove a previously registered processor. Removing a processor that
    /// is not registered is a no-op.
    fn remove_processor(&self, processor: &Arc<dyn PacketProcessor>);
}
