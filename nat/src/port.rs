// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! PNAT port: a type to represent L4 ports usable as ephemeral PNAT sources.

use std::fmt::Display;

/// Errors which can occur when building a [`PnatPort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum PnatPortError {
    /// The value lies outside the ephemeral range.
    #[error("port {0} is outside the PNAT range [1024, 65535)")]
    OutOfRange(u16),
}

/// An L4 port drawn from the ephemeral PNAT range `[1024, 65535)`.
///
/// The well-known range below 1024 and port 65535 are never used for PNAT,
/// so a `PnatPort` cannot represent them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PnatPort(u16);

impl PnatPort {
    /// Lowest usable PNAT port.
    pub const MIN: u16 = 1024;
    /// Highest usable PNAT port.
    pub const MAX: u16 = 65534;

    /// Build a `PnatPort`, checking the range.
    ///
    /// # Errors
    ///
    /// Returns [`PnatPortError::OutOfRange`] for values outside `[1024, 65535)`.
    pub fn new_checked(port: u16) -> Result<PnatPort, PnatPortError> {
        if !(Self::MIN..=Self::MAX).contains(&port) {
            return Err(PnatPortError::OutOfRange(port));
        }
        Ok(PnatPort(port))
    }

    /// The port number.
    #[must_use]
    pub fn as_u16(self) -> u16 {
        self.0
    }
}

impl Display for PnatPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for PnatPort {
    type Error = PnatPortError;

    fn try_from(port: u16) -> Result<Self, Self::Error> {
        PnatPort::new_checked(port)
    }
}

impl From<PnatPort> for u16 {
    fn from(port: PnatPort) -> u16 {
        port.as_u16()
    }
}
