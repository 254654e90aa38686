//! Serialization of fitted parameters.
//!
//! Fitted components expose their learned state as plain parameter structs
//! (vocabularies, tree nodes, class lists) that round-trip through bytes
//! without carrying lookup tables or other derived state.

use std::error::Error;

/// A trait for parameter representations that can be serialized to and from bytes.
///
/// Implementors should contain only plain data (e.g. `Vec<String>`, `Vec<f32>`,
/// scalars), not caches that can be rebuilt from it.
pub trait SerializableParams: Sized {
    /// The error type returned during (de)serialization.
    type Error: Error + Send + Sync + 'static;

    /// Serialize the parameters into a byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error>;

    /// Deserialize the parameters from a byte buffer.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Vocabulary {
        values: Vec<String>,
        width: usize,
    }

    #[test]
    fn test_params_roundtrip_through_bytes() {
        let params = Vocabulary {
            values: vec!["a".to_string(), "b".to_string()],
            width: 2,
        };
        let bytes = params.to_bytes().unwrap();
        let restored = Vocabulary::from_bytes(&bytes).unwrap();
        assert_eq!(restored, params);
    }

    #[test]
    fn test_from_bytes_rejects_truncated_input() {
        let result = Vocabulary::from_bytes(&[0x01, 0x02]);
        assert!(result.is_err());
    }
}
