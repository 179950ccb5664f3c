//! # Request identity: [`RequestType`] and [`RequestId`].
//!
//! A request type is an open, string-keyed identifier such as
//! `"message_response"` or `"custom_prompt"`. Each type owns its own
//! concurrency limit and FIFO lane inside the engine.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Identifier of a class of requests sharing one per-type concurrency budget.
///
/// Cheap to clone (`Arc<str>` inside), ordered, and serialised as a plain string
/// so it can be used directly as a JSON object key in telemetry snapshots.
///
/// ## Example
/// ```rust
/// use slotvisor::RequestType;
///
/// let ty = RequestType::new("custom_prompt");
/// assert_eq!(ty.as_str(), "custom_prompt");
/// assert_eq!(ty, RequestType::from("custom_prompt"));
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestType(Arc<str>);

impl RequestType {
    /// Creates a request type from any string-like value.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Returns the type name.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl From<&str> for RequestType {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for RequestType {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&RequestType> for RequestType {
    fn from(ty: &RequestType) -> Self {
        ty.clone()
    }
}

impl Borrow<str> for RequestType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for RequestType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Engine-assigned identifier of one submission.
///
/// Ids are unique per engine and increase with submission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub(crate) u64);

impl RequestId {
    /// Returns the raw numeric id.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(RequestType::from("image_analysis"), 3usize);
        assert_eq!(map.get("image_analysis"), Some(&3));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&RequestType::new("message_response")).unwrap();
        assert_eq!(json, "\"message_response\"");
    }

    #[test]
    fn test_request_id_display() {
        assert_eq!(RequestId(42).to_string(), "#42");
        assert_eq!(RequestId(42).get(), 42);
    }
}
