//! FlowId - identity of one measured sender
//!
//! A flow is keyed by the client address reported by the measurement tool.
//! Backed by `Arc<str>` because the same identity is cloned into every
//! snapshot the consumer takes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Flow identity (usually the client IP address as printed by iperf).
///
/// # Examples
/// ```
/// use contracts::FlowId;
///
/// let id: FlowId = "10.0.0.2".into();
/// assert_eq!(id, "10.0.0.2");
/// assert_eq!(id.clone().as_str(), "10.0.0.2");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowId(Arc<str>);

impl FlowId {
    /// Create a new identity from an address string.
    #[inline]
    pub fn new(address: &str) -> Self {
        Self(Arc::from(address.trim()))
    }

    /// Borrow the address.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FlowId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FlowId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FlowId {
    #[inline]
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for FlowId {
    #[inline]
    fn from(address: String) -> Self {
        Self::new(&address)
    }
}

impl PartialEq<str> for FlowId {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for FlowId {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlowId({})", self.0)
    }
}

impl Serialize for FlowId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FlowId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let address = String::deserialize(deserializer)?;
        Ok(Self::from(address))
    }
}
