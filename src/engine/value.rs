//! Native value representation understood by every engine.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;

/// A value in the engine's native encoding.
///
/// Engines persist whichever variant they are given and hand the same
/// variant back; they never convert between variants. Floats serialize as
/// their IEEE-754 bit patterns so NaN, infinities and `-0.0` survive text
/// formats such as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(#[serde(with = "f32_bits")] f32),
    Float64(#[serde(with = "f64_bits")] f64),
    String(String),
    Bytes(Vec<u8>),
    StringSet(BTreeSet<String>),
    /// Structured value stored as a tree rather than opaque bytes.
    Structured(serde_json::Value),
}

impl Value {
    /// Short name of the variant, used in mismatch errors.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Float32(_) => "float32",
            Self::Float64(_) => "float64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::StringSet(_) => "string_set",
            Self::Structured(_) => "structured",
        }
    }
}

mod f32_bits {
    use super::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(value.to_bits())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        u32::deserialize(deserializer).map(f32::from_bits)
    }
}

mod f64_bits {
    use super::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.to_bits())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        u64::deserialize(deserializer).map(f64::from_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_round_trip(value: &Value) -> Value {
        let bytes = serde_json::to_vec(value).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_non_finite_floats_survive_json() {
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.0, f64::MIN_POSITIVE] {
            let Value::Float64(back) = json_round_trip(&Value::Float64(v)) else {
                panic!("expected float64");
            };
            assert_eq!(back.to_bits(), v.to_bits());
        }
        for v in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, -0.0] {
            let Value::Float32(back) = json_round_trip(&Value::Float32(v)) else {
                panic!("expected float32");
            };
            assert_eq!(back.to_bits(), v.to_bits());
        }
    }

    #[test]
    fn test_variant_is_kept() {
        let value = Value::Int64(-7);
        assert_eq!(json_round_trip(&value), value);
        assert_eq!(value.type_name(), "int64");
    }
}
