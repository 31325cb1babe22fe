//! Serialization adapter.
//!
//! Every stored value belongs to one [`Kind`]. Callers name the kind they
//! want back; bytes are never sniffed. Primitives, string sets and
//! structured values map onto native engine [`Value`] variants. Generic
//! objects are turned into a `serde_json::Value` graph and handed to a
//! pluggable [`ObjectCodec`], which produces the opaque bytes actually
//! stored.

use crate::engine::Value;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

/// Kind tag selecting how a key is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Reads always yield nothing.
    None,
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Bytes,
    StringSet,
    Structured,
    Object,
}

impl Kind {
    /// Lowercase name used in errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::StringSet => "string_set",
            Self::Structured => "structured",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded value of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    StringSet(BTreeSet<String>),
    Structured(serde_json::Value),
    Object(serde_json::Value),
}

impl Data {
    /// The kind this value is stored and read back as.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Bool(_) => Kind::Bool,
            Self::Int32(_) => Kind::Int32,
            Self::Int64(_) => Kind::Int64,
            Self::Float32(_) => Kind::Float32,
            Self::Float64(_) => Kind::Float64,
            Self::String(_) => Kind::String,
            Self::Bytes(_) => Kind::Bytes,
            Self::StringSet(_) => Kind::StringSet,
            Self::Structured(_) => Kind::Structured,
            Self::Object(_) => Kind::Object,
        }
    }
}

/// Encoding and decoding failures.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CodecError {
    /// The stored value is not of the requested kind.
    #[error("expected {expected}, found {found}")]
    Mismatch { expected: Kind, found: &'static str },

    /// `Kind::None` cannot be encoded or decoded.
    #[error("kind 'none' carries no data")]
    NoneKind,

    /// The object codec rejected the bytes or the graph.
    #[error("{codec} codec: {reason}")]
    Object { codec: &'static str, reason: String },

    /// A graph could not be converted to or from a Rust type.
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
}

impl CodecError {
    fn mismatch(expected: Kind, found: &Value) -> Self {
        Self::Mismatch {
            expected,
            found: found.type_name(),
        }
    }
}

/// Binary codec for object graphs with no native representation.
pub trait ObjectCodec: Send + Sync + 'static {
    /// Short identifier used in errors and logs.
    fn name(&self) -> &'static str;

    /// Serializes a graph to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph cannot be represented.
    fn encode(&self, graph: &serde_json::Value) -> Result<Vec<u8>, CodecError>;

    /// Parses bytes produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns an error for corrupt or foreign bytes.
    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value, CodecError>;
}

/// Default object codec writing compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ObjectCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, graph: &serde_json::Value) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(graph).map_err(|e| CodecError::Object {
            codec: self.name(),
            reason: e.to_string(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Object {
            codec: self.name(),
            reason: e.to_string(),
        })
    }
}

/// Maps [`Data`] to engine [`Value`]s and back.
#[derive(Clone)]
pub struct Adapter {
    codec: Arc<dyn ObjectCodec>,
}

impl Default for Adapter {
    fn default() -> Self {
        Self::new(Arc::new(JsonCodec))
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("codec", &self.codec.name())
            .finish()
    }
}

impl Adapter {
    /// Creates an adapter using `codec` for the object arm.
    pub fn new(codec: Arc<dyn ObjectCodec>) -> Self {
        Self { codec }
    }

    /// Encodes `data` into its native engine value.
    ///
    /// # Errors
    ///
    /// Returns an error if the object codec rejects the graph.
    pub fn encode(&self, data: &Data) -> Result<Value, CodecError> {
        let value = match data {
            Data::Bool(v) => Value::Bool(*v),
            Data::Int32(v) => Value::Int32(*v),
            Data::Int64(v) => Value::Int64(*v),
            Data::Float32(v) => Value::Float32(*v),
            Data::Float64(v) => Value::Float64(*v),
            Data::String(v) => Value::String(v.clone()),
            Data::Bytes(v) => Value::Bytes(v.clone()),
            Data::StringSet(v) => Value::StringSet(v.clone()),
            Data::Structured(v) => Value::Structured(v.clone()),
            Data::Object(graph) => Value::Bytes(self.codec.encode(graph)?),
        };
        Ok(value)
    }

    /// Decodes `value` as `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Mismatch`] when the stored variant does not
    /// belong to `kind`, and a codec error for corrupt object bytes.
    pub fn decode(&self, value: Value, kind: Kind) -> Result<Data, CodecError> {
        let data = match (kind, value) {
            (Kind::None, _) => return Err(CodecError::NoneKind),
            (Kind::Bool, Value::Bool(v)) => Data::Bool(v),
            (Kind::Int32, Value::Int32(v)) => Data::Int32(v),
            (Kind::Int64, Value::Int64(v)) => Data::Int64(v),
            (Kind::Float32, Value::Float32(v)) => Data::Float32(v),
            (Kind::Float64, Value::Float64(v)) => Data::Float64(v),
            (Kind::String, Value::String(v)) => Data::String(v),
            (Kind::Bytes, Value::Bytes(v)) => Data::Bytes(v),
            (Kind::StringSet, Value::StringSet(v)) => Data::StringSet(v),
            (Kind::Structured, Value::Structured(v)) => Data::Structured(v),
            (Kind::Object, Value::Bytes(bytes)) => Data::Object(self.codec.decode(&bytes)?),
            (kind, other) => return Err(CodecError::mismatch(kind, &other)),
        };
        Ok(data)
    }
}

/// Rust types that can be stored and read back through a store.
pub trait StoreData: Sized {
    /// Kind used when reading this type.
    const KIND: Kind;

    /// Converts the value into tagged data.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as a graph.
    fn into_data(self) -> Result<Data, CodecError>;

    /// Extracts the value from tagged data of [`Self::KIND`].
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is of another kind or the graph does not
    /// match the type.
    fn from_data(data: Data) -> Result<Self, CodecError>;
}

macro_rules! native_store_data {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl StoreData for $ty {
                const KIND: Kind = Kind::$variant;

                fn into_data(self) -> Result<Data, CodecError> {
                    Ok(Data::$variant(self))
                }

                fn from_data(data: Data) -> Result<Self, CodecError> {
                    match data {
                        Data::$variant(v) => Ok(v),
                        other => Err(CodecError::Mismatch {
                            expected: Kind::$variant,
                            found: other.kind().as_str(),
                        }),
                    }
                }
            }
        )*
    };
}

native_store_data! {
    bool => Bool,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    String => String,
    Vec<u8> => Bytes,
    BTreeSet<String> => StringSet,
}

impl StoreData for HashSet<String> {
    const KIND: Kind = Kind::StringSet;

    fn into_data(self) -> Result<Data, CodecError> {
        Ok(Data::StringSet(self.into_iter().collect()))
    }

    fn from_data(data: Data) -> Result<Self, CodecError> {
        BTreeSet::<String>::from_data(data).map(|set| set.into_iter().collect())
    }
}

/// Stores `T` as a native structured value.
#[derive(Debug, Clone, PartialEq)]
pub struct Structured<T>(pub T);

/// Stores `T` as an opaque object-codec byte blob.
#[derive(Debug, Clone, PartialEq)]
pub struct Object<T>(pub T);

impl<T: Serialize + DeserializeOwned> StoreData for Structured<T> {
    const KIND: Kind = Kind::Structured;

    fn into_data(self) -> Result<Data, CodecError> {
        Ok(Data::Structured(serde_json::to_value(&self.0)?))
    }

    fn from_data(data: Data) -> Result<Self, CodecError> {
        match data {
            Data::Structured(graph) => Ok(Self(serde_json::from_value(graph)?)),
            other => Err(CodecError::Mismatch {
                expected: Kind::Structured,
                found: other.kind().as_str(),
            }),
        }
    }
}

impl<T: Serialize + DeserializeOwned> StoreData for Object<T> {
    const KIND: Kind = Kind::Object;

    fn into_data(self) -> Result<Data, CodecError> {
        Ok(Data::Object(serde_json::to_value(&self.0)?))
    }

    fn from_data(data: Data) -> Result<Self, CodecError> {
        match data {
            Data::Object(graph) => Ok(Self(serde_json::from_value(graph)?)),
            other => Err(CodecError::Mismatch {
                expected: Kind::Object,
                found: other.kind().as_str(),
            }),
        }
    }
}
