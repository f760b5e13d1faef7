//! Field types, values and the binary codec for leaf records.
//!
//! Records are encoded the way Solidity's `abi.encode` lays out static
//! types: every field occupies one 32-byte word, integers are big-endian and
//! left-padded, booleans are a word holding 0 or 1. [`encode_packed`] mirrors
//! `abi.encodePacked` instead, where each field keeps its declared width.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;

use crate::common::Hash;
use crate::error::{Error, Result};

/// Solidity type of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bytes32,
    /// Unsigned integer of the given bit width (8..=256, multiple of 8).
    Uint(u16),
    Bool,
}

impl FieldType {
    /// Number of bytes the field takes in packed encoding.
    pub fn packed_width(&self) -> usize {
        match self {
            FieldType::Bytes32 => 32,
            FieldType::Uint(bits) => usize::from(*bits / 8),
            FieldType::Bool => 1,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bytes32 => write!(f, "bytes32"),
            FieldType::Uint(bits) => write!(f, "uint{bits}"),
            FieldType::Bool => write!(f, "bool"),
        }
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bytes32" => Ok(FieldType::Bytes32),
            "bool" => Ok(FieldType::Bool),
            "uint" => Ok(FieldType::Uint(256)),
            other => {
                let bits = other
                    .strip_prefix("uint")
                    .and_then(|width| width.parse::<u16>().ok())
                    .filter(|bits| *bits > 0 && *bits <= 256 && bits % 8 == 0)
                    .ok_or_else(|| Error::Argument(format!("unsupported field type '{other}'")))?;
                Ok(FieldType::Uint(bits))
            }
        }
    }
}

/// Ordered list of field types a record is encoded against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema(Vec<FieldType>);

impl Schema {
    pub fn new(fields: Vec<FieldType>) -> Self {
        Self(fields)
    }

    /// Builds a schema from Solidity type names, e.g. `["bytes32", "uint256"]`.
    pub fn parse(types: &[&str]) -> Result<Self> {
        types
            .iter()
            .map(|ty| ty.parse())
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn fields(&self) -> &[FieldType] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Value of one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bytes32(Hash),
    Uint(BigUint),
    Bool(bool),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Bytes32(_) => "bytes32",
            Value::Uint(_) => "uint",
            Value::Bool(_) => "bool",
        }
    }
}

impl From<Hash> for Value {
    fn from(value: Hash) -> Self {
        Value::Bytes32(value)
    }
}

impl From<BigUint> for Value {
    fn from(value: BigUint) -> Self {
        Value::Uint(value)
    }
}

impl From<u128> for Value {
    fn from(value: u128) -> Self {
        Value::Uint(BigUint::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

#[derive(Clone, Copy)]
enum Packing {
    Words,
    Packed,
}

/// Encodes `record` against `schema` in ABI word layout.
///
/// # Errors
/// Returns [`Error::Encoding`] if the record and schema lengths differ, a
/// value does not match its field type, or an integer overflows its width.
pub fn encode(record: &[Value], schema: &Schema) -> Result<Vec<u8>> {
    encode_with(record, schema, Packing::Words)
}

/// Encodes `record` against `schema` with every field at its declared width.
pub fn encode_packed(record: &[Value], schema: &Schema) -> Result<Vec<u8>> {
    encode_with(record, schema, Packing::Packed)
}

fn encode_with(record: &[Value], schema: &Schema, packing: Packing) -> Result<Vec<u8>> {
    if record.len() != schema.len() {
        return Err(Error::encoding(
            record.len().min(schema.len()),
            format!(
                "record has {} fields but schema {} declares {}",
                record.len(),
                schema,
                schema.len()
            ),
        ));
    }

    let mut out = Vec::with_capacity(schema.len() * 32);
    for (field, (ty, value)) in schema.fields().iter().zip(record).enumerate() {
        let width = match packing {
            Packing::Words => 32,
            Packing::Packed => ty.packed_width(),
        };
        match (ty, value) {
            (FieldType::Bytes32, Value::Bytes32(bytes)) => out.extend_from_slice(bytes),
            (FieldType::Uint(bits), Value::Uint(n)) => {
                if *bits == 0 || *bits > 256 || bits % 8 != 0 {
                    return Err(Error::encoding(
                        field,
                        format!("invalid integer width {bits}"),
                    ));
                }
                if n.bits() > u64::from(*bits) {
                    return Err(Error::encoding(
                        field,
                        format!("value {n} does not fit in {ty}"),
                    ));
                }
                let bytes = n.to_bytes_be();
                // `to_bytes_be` yields a single zero byte for zero.
                let significant = if n.bits() == 0 { &[][..] } else { &bytes[..] };
                out.resize(out.len() + width - significant.len(), 0);
                out.extend_from_slice(significant);
            }
            (FieldType::Bool, Value::Bool(flag)) => {
                out.resize(out.len() + width - 1, 0);
                out.push(u8::from(*flag));
            }
            (ty, value) => {
                return Err(Error::encoding(
                    field,
                    format!("expected {ty}, got {}", value.kind()),
                ));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(types: &[&str]) -> Schema {
        Schema::parse(types).unwrap()
    }

    #[test]
    fn test_parse_field_types() {
        assert_eq!("bytes32".parse::<FieldType>().unwrap(), FieldType::Bytes32);
        assert_eq!("uint128".parse::<FieldType>().unwrap(), FieldType::Uint(128));
        assert_eq!("uint".parse::<FieldType>().unwrap(), FieldType::Uint(256));
        assert_eq!("bool".parse::<FieldType>().unwrap(), FieldType::Bool);
        assert!("uint7".parse::<FieldType>().is_err());
        assert!("uint264".parse::<FieldType>().is_err());
        assert!("address".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_schema_display() {
        let schema = schema(&["bytes32", "uint128", "bool"]);
        assert_eq!(schema.to_string(), "[bytes32, uint128, bool]");
    }

    #[test]
    fn test_encode_words() {
        let schema = schema(&["bytes32", "uint128", "bool"]);
        let record = vec![
            Value::from([0xaa; 32]),
            Value::from(0xa000_0000_0000_0000_0000_0000_0000_0000u128),
            Value::from(true),
        ];

        let encoded = encode(&record, &schema).unwrap();
        assert_eq!(encoded.len(), 96);
        assert_eq!(encoded[..32], [0xaa; 32]);
        assert_eq!(encoded[32..48], [0u8; 16]);
        assert_eq!(encoded[48], 0xa0);
        assert_eq!(encoded[49..64], [0u8; 15]);
        assert_eq!(encoded[64..95], [0u8; 31]);
        assert_eq!(encoded[95], 1);
    }

    #[test]
    fn test_encode_packed() {
        let schema = schema(&["uint128", "bool", "uint8"]);
        let record = vec![Value::from(1u128), Value::from(false), Value::from(7u128)];

        let encoded = encode_packed(&record, &schema).unwrap();
        let mut expected = vec![0u8; 15];
        expected.extend_from_slice(&[1, 0, 7]);
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_encode_zero_uint() {
        let schema = schema(&["uint256"]);
        let encoded = encode(&[Value::from(0u128)], &schema).unwrap();
        assert_eq!(encoded, vec![0u8; 32]);
    }

    #[test]
    fn test_encode_max_width_uint() {
        let schema = schema(&["uint256"]);
        let max = BigUint::from_bytes_be(&[0xff; 32]);
        let encoded = encode(&[Value::from(max)], &schema).unwrap();
        assert_eq!(encoded, vec![0xff; 32]);
    }

    #[test]
    fn test_encode_uint_overflow() {
        let schema = schema(&["uint8"]);
        let result = encode(&[Value::from(256u128)], &schema);
        assert!(matches!(result, Err(Error::Encoding { field: 0, .. })));

        let schema = self::schema(&["bytes32", "uint256"]);
        let too_big = BigUint::from(1u8) << 256u32;
        let result = encode(&[Value::from([0u8; 32]), Value::from(too_big)], &schema);
        assert!(matches!(result, Err(Error::Encoding { field: 1, .. })));
    }

    #[test]
    fn test_encode_rejects_invalid_uint_width() {
        let schema = Schema::new(vec![FieldType::Uint(12)]);
        let result = encode_packed(&[Value::from(4095u128)], &schema);
        assert!(matches!(result, Err(Error::Encoding { field: 0, .. })));

        let schema = Schema::new(vec![FieldType::Bool, FieldType::Uint(512)]);
        let huge = BigUint::from(1u8) << 300u32;
        let result = encode(&[Value::from(true), Value::from(huge)], &schema);
        assert!(matches!(result, Err(Error::Encoding { field: 1, .. })));

        let schema = Schema::new(vec![FieldType::Uint(0)]);
        assert!(encode(&[Value::from(0u128)], &schema).is_err());
    }

    #[test]
    fn test_encode_kind_mismatch() {
        let schema = schema(&["bytes32", "bool"]);
        let record = vec![Value::from([0u8; 32]), Value::from(1u128)];
        let result = encode(&record, &schema);
        assert!(matches!(result, Err(Error::Encoding { field: 1, .. })));
    }

    #[test]
    fn test_encode_length_mismatch() {
        let schema = schema(&["bytes32", "bool"]);
        let result = encode(&[Value::from([0u8; 32])], &schema);
        assert!(matches!(result, Err(Error::Encoding { field: 1, .. })));

        let record = vec![Value::from(true), Value::from(true), Value::from(true)];
        assert!(encode(&record, &schema).is_err());
    }

    #[test]
    fn test_encoding_is_injective_over_fixed_widths() {
        let schema = schema(&["uint128", "uint128"]);
        let a = encode(&[Value::from(1u128), Value::from(0u128)], &schema).unwrap();
        let b = encode(&[Value::from(0u128), Value::from(1u128)], &schema).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), b.len());
    }
}
