//! Pluggable serialization and lazy deserialization.
//!
//! The core never decodes bytes itself; it carries them in a
//! [`DeserializableValue`] together with the [`Serialization`] that produced
//! them, and decodes on first access. This keeps the hot receive path free of
//! codec work for proxied calls that are forwarded without ever looking at
//! their arguments.

use std::any::Any;
use std::sync::Arc;

use crate::CoreError;

/// An opaque call value.
///
/// Arguments, results, and service objects all travel as `Value`. Cloning a
/// `Value` shares the underlying object by reference, so cloning a request
/// shares its argument values with the clone.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Wrap a concrete value as a [`Value`].
pub fn value_of<T: Any + Send + Sync>(v: T) -> Value {
    Arc::new(v)
}

/// A wire codec, identified by a name and a small numeric id.
///
/// Implementations live outside the core and are resolved by name (or id)
/// through the extension factory. The `*_multi` variants encode and decode a
/// whole argument list as one payload.
pub trait Serialization: Send + Sync {
    /// The codec's numeric id as it appears in wire headers.
    fn serial_num(&self) -> i32;

    fn serialize(&self, value: &Value) -> Result<Vec<u8>, CoreError>;

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, CoreError>;

    fn serialize_multi(&self, values: &[Value]) -> Result<Vec<u8>, CoreError>;

    fn deserialize_multi(&self, bytes: &[u8]) -> Result<Vec<Value>, CoreError>;
}

/// Raw bytes plus the codec that can decode them, read-only after
/// construction.
///
/// A request received from the wire carries its argument payload as a single
/// `DeserializableValue` until someone asks for the real arguments; a
/// response does the same for its result value.
pub struct DeserializableValue {
    serialization: Option<Arc<dyn Serialization>>,
    body: Vec<u8>,
}

impl DeserializableValue {
    pub fn new(serialization: Option<Arc<dyn Serialization>>, body: Vec<u8>) -> Self {
        Self {
            serialization,
            body,
        }
    }

    /// The raw payload bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decode the payload as a single value.
    ///
    /// Fails with [`CoreError::MissingSerialization`] when no codec was
    /// attached at construction.
    pub fn deserialize(&self) -> Result<Value, CoreError> {
        match &self.serialization {
            Some(s) => s.deserialize(&self.body),
            None => Err(CoreError::MissingSerialization),
        }
    }

    /// Decode the payload as an argument list.
    pub fn deserialize_multi(&self) -> Result<Vec<Value>, CoreError> {
        match &self.serialization {
            Some(s) => s.deserialize_multi(&self.body),
            None => Err(CoreError::MissingSerialization),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_without_codec_fails() {
        let dv = DeserializableValue::new(None, b"payload".to_vec());
        assert!(matches!(
            dv.deserialize(),
            Err(CoreError::MissingSerialization)
        ));
        assert!(matches!(
            dv.deserialize_multi(),
            Err(CoreError::MissingSerialization)
        ));
        assert_eq!(dv.body(), b"payload");
    }

    #[test]
    fn value_downcasts_to_concrete_type() {
        let v = value_of("hello".to_string());
        assert_eq!(
            v.downcast_ref::<String>().map(String::as_str),
            Some("hello")
        );
        assert!(v.downcast_ref::<i64>().is_none());
    }
}
