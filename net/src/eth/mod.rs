// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Ethernet frame view: addresses, ethertype and the parsed payload.

pub mod mac;

use crate::ip::Ipv4Meta;
use mac::Mac;
use std::fmt::Display;

/// An [EtherType] as found in the 802.3 header.
///
/// [EtherType]: https://en.wikipedia.org/wiki/EtherType
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct EtherType(pub u16);

impl EtherType {
    /// IPv4 (0x0800)
    pub const IPV4: EtherType = EtherType(0x0800);
    /// ARP (0x0806)
    pub const ARP: EtherType = EtherType(0x0806);
    /// IPv6 (0x86DD)
    pub const IPV6: EtherType = EtherType(0x86DD);
}

impl Display for EtherType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// Payload of a parsed [`EthFrame`].
///
/// A non-IPv4 frame cannot carry IPv4 metadata: the pipeline only hands us a
/// parsed [`Ipv4Meta`] when the ethertype was IPv4.
#[derive(Debug, Clone)]
pub enum EthPayload {
    /// An IPv4 payload with the fields the classifier needs.
    Ipv4(Ipv4Meta),
    /// Any other ethertype. The payload is opaque to this engine.
    Unparsed(EtherType),
}

/// The parsed view of an inbound ethernet frame.
#[derive(Debug, Clone)]
pub struct EthFrame {
    source: Mac,
    destination: Mac,
    payload: EthPayload,
}

impl EthFrame {
    /// Build a frame view with an IPv4 payload.
    #[must_use]
    pub fn ipv4(source: Mac, destination: Mac, meta: Ipv4Meta) -> EthFrame {
        EthFrame {
            source,
            destination,
            payload: EthPayload::Ipv4(meta),
        }
    }

    /// Build a frame view for a non-IPv4 ethertype.
    #[must_use]
    pub fn unparsed(source: Mac, destination: Mac, ethertype: EtherType) -> EthFrame {
        EthFrame {
            source,
            destination,
            payload: EthPayload::Unparsed(ethertype),
        }
    }

    /// Source mac of the frame.
    #[must_use]
    pub fn source(&self) -> Mac {
        self.source
    }

    /// Destination mac of the frame.
    #[must_use]
    pub fn destination(&self) -> Mac {
        self.destination
    }

    /// The IPv4 metadata, if this frame carried an IPv4 payload.
    #[must_use]
    pub fn try_ipv4(&self) -> Option<&Ipv4Meta> {
        match &self.payload {
            EthPayload::Ipv4(meta) => Some(meta),
            EthPayload::Unparsed(_) => None,
        }
    }
}
