// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Lane handlers and the event dispatcher that runs them.

use crate::RoutingError;
use crate::classify::{IcmpEvent, PnatEvent};
use crate::lanes::{Lane, LaneSender, LaneStats};
use crate::populator::RulePopulator;
use std::sync::Arc;
use tracing::debug;

/// Worker thread name of the ICMP lane.
pub const ICMP_LANE: &str = "icmp-event";
/// Worker thread name of the L3/PNAT lane.
pub const L3_LANE: &str = "l3-event";

/// Responds to ICMP traffic addressed to router gateways.
///
/// ICMP handling (crafting echo replies, emitting them back through the
/// pipeline) lives in its own subsystem; the engine only owns getting the
/// packets there in order.
pub trait IcmpResponder: Send + Sync {
    /// Handle one ICMP packet. Invoked from the ICMP lane worker, strictly
    /// in packet order.
    ///
    /// # Errors
    ///
    /// A failure drops the event at the lane boundary; it is never retried.
    fn respond(&self, event: &IcmpEvent) -> Result<(), RoutingError>;
}

// The L3 lane's handler: install the PNAT rewrite for one outbound flow.
struct PnatRuleTrigger {
    populator: Arc<dyn RulePopulator>,
}

impl PnatRuleTrigger {
    fn trigger(&self, event: &PnatEvent) -> Result<(), RoutingError> {
        debug!(
            "installing pnat rules for port {} (vm port {})",
            event.pnat_port, event.vm_port.id
        );
        self.populator
            .populate_pnat_rules(&event.ctx, event.pnat_port, &event.vm_port)?;
        Ok(())
    }
}

/// The two ordered lanes of the engine and their workers.
///
/// Lanes run concurrently with respect to each other; within a lane events
/// are handled strictly in submission order by a single worker. Handler
/// failures never terminate a worker.
pub struct EventDispatcher {
    icmp: Lane<IcmpEvent>,
    pnat: Lane<PnatEvent>,
}

impl EventDispatcher {
    /// Spawn both lane workers.
    ///
    /// # Errors
    ///
    /// Fails if a worker thread cannot be spawned.
    pub fn start(
        icmp_responder: Arc<dyn IcmpResponder>,
        populator: Arc<dyn RulePopulator>,
    ) -> Result<EventDispatcher, RoutingError> {
        let icmp = Lane::start(ICMP_LANE, move |event: IcmpEvent| {
            icmp_responder.respond(&event)
        })?;

        let trigger = PnatRuleTrigger { populator };
        let pnat = Lane::start(L3_LANE, move |event: PnatEvent| trigger.trigger(&event))?;

        Ok(EventDispatcher { icmp, pnat })
    }

    /// Submission handle for the ICMP lane.
    #[must_use]
    pub fn icmp_sender(&self) -> LaneSender<IcmpEvent> {
        self.icmp.sender()
    }

    /// Submission handle for the L3/PNAT lane.
    #[must_use]
    pub fn pnat_sender(&self) -> LaneSender<PnatEvent> {
        self.pnat.sender()
    }

    /// Counters of the ICMP lane.
    #[must_use]
    pub fn icmp_stats(&self) -> Arc<LaneStats> {
        self.icmp.stats()
    }

    /// Counters of the L3/PNAT lane.
    #[must_use]
    pub fn pnat_stats(&self) -> Arc<LaneStats> {
        self.pnat.stats()
    }

    /// Drain both lanes and join their workers.
    ///
    /// # Errors
    ///
    /// Reports the first lane that could not be stopped; the other lane is
    /// still stopped.
    pub fn finish(&mut self) -> Result<(), RoutingError> {
        let icmp = self.icmp.finish();
        let pnat = self.pnat.finish();
        icmp.and(pnat)
    }
}
