// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]
#![deny(rustdoc::all)]

//! Ground network types for the L3 gateway engine.
//!
//! The engine does not parse wire bytes itself: frames arrive from the
//! controller's packet pipeline already parsed, and this crate models that
//! parsed view: ethernet frames, the IPv4 metadata the classifier needs,
//! VXLAN network identifiers, and the per-packet context shared with the
//! rest of the pipeline.

pub mod eth;
pub mod ip;
pub mod packet;
pub mod vni;

pub use eth::mac::Mac;
pub use vni::Vni;
