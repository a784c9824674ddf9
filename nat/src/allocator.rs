// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! First-fit allocator over the ephemeral PNAT port range.

use crate::port::PnatPort;
use net::Mac;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::net::Ipv4Addr;
use std::sync::Mutex;
use tracing::trace;

/// The flow a PNAT port is bound to: the source mac of the VM's frames plus
/// the source IPv4 address of the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowKey {
    /// Source mac address.
    pub src_mac: Mac,
    /// Source IPv4 address.
    pub addr: Ipv4Addr,
}

impl FlowKey {
    /// Build a flow key.
    #[must_use]
    pub fn new(src_mac: Mac, addr: Ipv4Addr) -> FlowKey {
        FlowKey { src_mac, addr }
    }
}

impl Display for FlowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.src_mac, self.addr)
    }
}

/// Errors returned by the [`PortAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum AllocatorError {
    /// Every port in the pool is bound.
    #[error("PNAT port pool exhausted")]
    PoolExhausted,
    /// The port is not currently bound.
    #[error("port {0} is not allocated")]
    NotAllocated(PnatPort),
}

#[derive(Debug)]
struct PoolState {
    free: BTreeSet<u16>,
    bound: HashMap<u16, FlowKey>,
}

/// The ephemeral port pool.
///
/// Allocation is first-fit over ascending port numbers among unbound entries
/// and binds the chosen port to the caller's flow key; a port is bound to at
/// most one flow key at a time. The pool state lives under a single mutex
/// held only for the scan/bind or unbind, so concurrent allocate calls can
/// never observe and bind the same entry.
#[derive(Debug)]
pub struct PortAllocator {
    state: Mutex<PoolState>,
}

impl PortAllocator {
    /// Number of ports the pool covers.
    pub const CAPACITY: usize = (PnatPort::MAX - PnatPort::MIN) as usize + 1;

    /// Build a pool with the whole ephemeral range free.
    #[must_use]
    pub fn new() -> PortAllocator {
        PortAllocator {
            state: Mutex::new(PoolState {
                free: (PnatPort::MIN..=PnatPort::MAX).collect(),
                bound: HashMap::new(),
            }),
        }
    }

    /// Bind the lowest free port to `key` and return it.
    ///
    /// Allocation does not deduplicate by key: a second call with the same
    /// key binds a further port. Callers that want one port per flow must
    /// release the previous binding first.
    ///
    /// # Errors
    ///
    /// Returns [`AllocatorError::PoolExhausted`] when no port is free.
    pub fn allocate(&self, key: FlowKey) -> Result<PnatPort, AllocatorError> {
        let mut state = self.state.lock().unwrap();
        let port = *state
            .free
            .iter()
            .next()
            .ok_or(AllocatorError::PoolExhausted)?;
        state.free.remove(&port);
        state.bound.insert(port, key);
        trace!("bound port {port} to flow {key}");
        // The range invariant holds for every member of the free set.
        Ok(PnatPort::new_checked(port).unwrap_or_else(|_| unreachable!()))
    }

    /// Unbind `port` and return it to the pool, yielding the flow key it was
    /// bound to.
    ///
    /// # Errors
    ///
    /// Returns [`AllocatorError::NotAllocated`] if the port is not bound, so
    /// double releases surface instead of passing silently.
    pub fn release(&self, port: PnatPort) -> Result<FlowKey, AllocatorError> {
        let mut state = self.state.lock().unwrap();
        let key = state
            .bound
            .remove(&port.as_u16())
            .ok_or(AllocatorError::NotAllocated(port))?;
        state.free.insert(port.as_u16());
        trace!("released port {port} from flow {key}");
        Ok(key)
    }

    /// The flow key currently bound to `port`, if any.
    #[must_use]
    pub fn binding(&self, port: PnatPort) -> Option<FlowKey> {
        self.state.lock().unwrap().bound.get(&port.as_u16()).copied()
    }

    /// Number of currently bound ports.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.state.lock().unwrap().bound.len()
    }
}

impl Default for PortAllocator {
    fn default() -> Self {
        PortAllocator::new()
    }
}
