// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]
#![deny(rustdoc::all)]

//! Ephemeral port pool for outbound PNAT.
//!
//! Outbound flows of VMs without a floating IP share their router's single
//! external address; what distinguishes them on the wire is the source port
//! this pool hands out. The pool covers the ephemeral range `[1024, 65535)`,
//! binds each allocated port to the flow key using it, and takes the port
//! back on release.
//!
//! # Example
//!
//! ```
//! use l3gw_nat::{FlowKey, PortAllocator};
//! use net::Mac;
//! use std::net::Ipv4Addr;
//!
//! let allocator = PortAllocator::new();
//! let key = FlowKey::new(Mac([2, 0, 0, 0, 0, 1]), Ipv4Addr::new(10, 0, 0, 5));
//! let port = allocator.allocate(key).unwrap();
//! assert_eq!(allocator.release(port).unwrap(), key);
//! ```

mod allocator;
mod port;

pub use allocator::{AllocatorError, FlowKey, PortAllocator};
pub use port::{PnatPort, PnatPortError};
