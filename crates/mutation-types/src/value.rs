//! Tagged field values and their decoding into native scalars.
//!
//! The upstream wire format carries every field as a type tag plus a byte
//! payload. Numeric payloads are 8 bytes, little-endian. Booleans use the low
//! bit of the first byte. Strings and binary payloads are passed through
//! verbatim.

use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::DecodeError;

/// Wire type tag of a [`FieldValue`].
///
/// Unrecognized tag numbers are preserved as [`DataType::Unknown`] and decode
/// to raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Binary,
    String,
    Uint64,
    Int64,
    Float64,
    Unknown(i32),
}

impl DataType {
    /// Map a wire tag number to a data type.
    pub fn from_tag(tag: i32) -> Self {
        match tag {
            0 => Self::Boolean,
            1 => Self::Binary,
            2 => Self::String,
            3 => Self::Uint64,
            4 => Self::Int64,
            5 => Self::Float64,
            other => Self::Unknown(other),
        }
    }

    /// Wire tag number of this data type.
    pub fn tag(&self) -> i32 {
        match self {
            Self::Boolean => 0,
            Self::Binary => 1,
            Self::String => 2,
            Self::Uint64 => 3,
            Self::Int64 => 4,
            Self::Float64 => 5,
            Self::Unknown(tag) => *tag,
        }
    }

    /// Name used in the JSON record form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Boolean => "boolean",
            Self::Binary => "binary",
            Self::String => "string",
            Self::Uint64 => "uint64",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Unknown(_) => "unknown",
        }
    }

    fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "boolean" | "bool" => Self::Boolean,
            "binary" | "bytes" => Self::Binary,
            "string" => Self::String,
            "uint64" => Self::Uint64,
            "int64" => Self::Int64,
            "float64" => Self::Float64,
            _ => Self::Unknown(-1),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(tag) => write!(f, "unknown({tag})"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unknown(tag) => serializer.serialize_i32(*tag),
            other => serializer.serialize_str(other.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Tag(i32),
            Name(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Tag(tag) => Self::from_tag(tag),
            Repr::Name(name) => Self::from_name(&name),
        })
    }
}

/// A field value as delivered on the wire: type tag plus payload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(with = "base64_payload")]
    pub value: Vec<u8>,
}

impl FieldValue {
    pub fn new(data_type: DataType, value: Vec<u8>) -> Self {
        Self { data_type, value }
    }

    /// Build a value from a base64-encoded payload.
    pub fn from_base64(data_type: DataType, payload: &str) -> Result<Self, DecodeError> {
        let value = base64::engine::general_purpose::STANDARD.decode(payload)?;
        Ok(Self { data_type, value })
    }

    pub fn from_f64(v: f64) -> Self {
        Self::new(DataType::Float64, v.to_bits().to_le_bytes().to_vec())
    }

    pub fn from_i64(v: i64) -> Self {
        Self::new(DataType::Int64, v.to_le_bytes().to_vec())
    }

    pub fn from_u64(v: u64) -> Self {
        Self::new(DataType::Uint64, v.to_le_bytes().to_vec())
    }

    pub fn from_bool(v: bool) -> Self {
        Self::new(DataType::Boolean, vec![u8::from(v)])
    }

    pub fn from_string(v: impl Into<String>) -> Self {
        Self::new(DataType::String, v.into().into_bytes())
    }

    pub fn from_bytes(v: impl Into<Vec<u8>>) -> Self {
        Self::new(DataType::Binary, v.into())
    }

    /// Decode into a native scalar. See [`decode`].
    pub fn decode(&self) -> Scalar {
        decode(self)
    }
}

/// Native scalar produced by decoding a [`FieldValue`].
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Float64(f64),
    Int64(i64),
    Uint64(u64),
    Boolean(bool),
    Text(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float64(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Uint64(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

/// Decode a tagged field value.
///
/// Total: unknown tags and non-UTF-8 strings come back as [`Scalar::Bytes`].
/// Numeric payloads shorter than 8 bytes are zero-extended and longer ones are
/// read from their first 8 bytes.
pub fn decode(value: &FieldValue) -> Scalar {
    match value.data_type {
        DataType::Float64 => Scalar::Float64(f64::from_bits(read_u64_le(&value.value))),
        DataType::Int64 => Scalar::Int64(read_u64_le(&value.value) as i64),
        DataType::Uint64 => Scalar::Uint64(read_u64_le(&value.value)),
        DataType::Boolean => {
            Scalar::Boolean(value.value.first().map(|b| b & 1 == 1).unwrap_or(false))
        }
        DataType::String => match String::from_utf8(value.value.clone()) {
            Ok(s) => Scalar::Text(s),
            Err(e) => Scalar::Bytes(e.into_bytes()),
        },
        DataType::Binary | DataType::Unknown(_) => Scalar::Bytes(value.value.clone()),
    }
}

fn read_u64_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    let len = bytes.len().min(8);
    buf[..len].copy_from_slice(&bytes[..len]);
    u64::from_le_bytes(buf)
}

mod base64_payload {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
