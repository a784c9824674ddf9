// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Typed identifiers for OpenStack objects.
//!
//! OpenStack hands the controller opaque string identifiers (UUID-shaped, but
//! the format is not ours to rely on). Wrapping them in a type tagged with
//! the identified kind prevents conflating, say, a port id with a network id
//! at compile time, at no runtime cost beyond the `Arc<str>`.

use core::fmt::{Debug, Formatter};
use std::cmp::Ordering;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

/// An abstract, typed identifier.
///
/// The type parameter `T` only tags the id with the kind of object it
/// identifies; it consumes no space. Two `Id`s of different kinds do not
/// compare, assign, or hash interchangeably.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent, bound = "")]
pub struct Id<T: ?Sized>(Arc<str>, PhantomData<T>);

impl<T: ?Sized> Id<T> {
    /// Wrap a provider-supplied identifier string.
    pub fn new(id: impl AsRef<str>) -> Id<T> {
        Id(Arc::from(id.as_ref()), PhantomData)
    }

    /// The identifier in its string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: ?Sized> Clone for Id<T> {
    fn clone(&self) -> Self {
        Id(Arc::clone(&self.0), PhantomData)
    }
}

impl<T: ?Sized> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T: ?Sized> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: ?Sized> Eq for Id<T> {}

impl<T: ?Sized> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T: ?Sized> Display for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <_ as Display>::fmt(&self.0, f)
    }
}

impl<T: ?Sized> Debug for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <_ as Debug>::fmt(&self.0, f)
    }
}

impl<T: ?Sized> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Id::new(value)
    }
}

/// Marker for tenant (project) identifiers, which identify no model type of
/// their own.
#[derive(Debug, Clone, Copy)]
pub struct Tenant;

/// Identifier of an [`crate::OpenstackPort`].
pub type PortId = Id<crate::OpenstackPort>;
/// Identifier of an [`crate::OpenstackNetwork`].
pub type NetworkId = Id<crate::OpenstackNetwork>;
/// Identifier of an [`crate::OpenstackRouter`].
pub type RouterId = Id<crate::OpenstackRouter>;
/// Identifier of a [`crate::RouterInterface`].
pub type InterfaceId = Id<crate::RouterInterface>;
/// Identifier of a [`crate::FloatingIp`].
pub type FloatingIpId = Id<crate::FloatingIp>;
/// Identifier of a tenant (project).
pub type TenantId = Id<Tenant>;
/// Identifier of a subnet. Subnets are opaque to this engine; the id only
/// keys a port's fixed-IP map.
pub type SubnetId = Id<str>;
