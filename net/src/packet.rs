// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Per-packet context shared with the controller's packet pipeline.

use crate::eth::EthFrame;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

/// Identifier of the network device a packet arrived on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Build a device id from its string form.
    pub fn new(id: impl Into<String>) -> DeviceId {
        DeviceId(id.into())
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context for one inbound packet, shared across the processors of the wider
/// packet pipeline.
///
/// The pipeline dispatches each context to every registered processor in
/// priority order; the `handled` flag enforces the single-handler-per-packet
/// discipline. A processor that takes ownership of a packet must mark the
/// context handled so lower-priority processors skip it.
#[derive(Debug)]
pub struct PacketContext {
    device: DeviceId,
    frame: EthFrame,
    handled: AtomicBool,
}

impl PacketContext {
    /// Build a context for a frame received on `device`.
    #[must_use]
    pub fn new(device: DeviceId, frame: EthFrame) -> PacketContext {
        PacketContext {
            device,
            frame,
            handled: AtomicBool::new(false),
        }
    }

    /// The device the packet arrived on.
    #[must_use]
    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    /// The parsed frame.
    #[must_use]
    pub fn frame(&self) -> &EthFrame {
        &self.frame
    }

    /// Whether a higher-priority processor already took ownership.
    #[must_use]
    pub fn is_handled(&self) -> bool {
        self.handled.load(Ordering::Acquire)
    }

    /// Take ownership of the packet. Returns true iff this call made the
    /// transition, false if the context was already handled.
    pub fn mark_handled(&self) -> bool {
        !self.handled.swap(true, Ordering::AcqRel)
    }
}
