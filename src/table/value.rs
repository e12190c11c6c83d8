//! Column types and cell values.
//!
//! The pipeline decides a tagged [`ColumnType`] per column once, at
//! schema-read time, and every later stage dispatches on that tag instead of
//! re-inspecting SQL type strings. [`ColumnValue`] is the runtime cell
//! value; [`PrimaryKey`] is the hashable subset of values usable as a row
//! key.

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Column data type, decided at schema-read time.
///
/// [`ColumnType::from_sql`] recognises the PostgreSQL spellings; anything
/// unrecognised is treated as opaque bytes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColumnType {
    Int32,
    Int64,
    Bool,
    F32,
    F64,
    Text,
    Bytes,
    Json,
    /// Arbitrary-precision numeric, with the declared `(precision, scale)`
    /// when the type string carried one.
    Numeric { precision: Option<(u16, u16)> },
}

impl ColumnType {
    /// Maps a SQL type name onto a tag.
    pub fn from_sql(name: &str) -> Self {
        let upper = name.trim().to_uppercase();
        match upper.as_str() {
            "BIGINT" | "INT8" | "BIGSERIAL" | "SERIAL8" => ColumnType::Int64,
            "INTEGER" | "INT" | "INT4" | "SERIAL" | "SERIAL4" | "SMALLINT" | "INT2" => {
                ColumnType::Int32
            }
            "BYTEA" | "VARBIT" => ColumnType::Bytes,
            "BOOLEAN" | "BOOL" => ColumnType::Bool,
            "DOUBLE PRECISION" | "FLOAT8" => ColumnType::F64,
            "REAL" | "FLOAT4" => ColumnType::F32,
            "TEXT" => ColumnType::Text,
            "JSON" => ColumnType::Json,
            _ if upper.contains("CHAR") => ColumnType::Text,
            _ if upper.contains("NUMERIC") || upper.contains("DECIMAL") => ColumnType::Numeric {
                precision: parse_precision(&upper),
            },
            _ => ColumnType::Bytes,
        }
    }

    /// The SQL spelling used when re-emitting the column in a schema.
    pub fn sql_name(&self) -> String {
        match self {
            ColumnType::Int32 => "INTEGER".into(),
            ColumnType::Int64 => "BIGINT".into(),
            ColumnType::Bool => "BOOLEAN".into(),
            ColumnType::F32 => "REAL".into(),
            ColumnType::F64 => "DOUBLE PRECISION".into(),
            ColumnType::Text => "TEXT".into(),
            ColumnType::Bytes => "BYTEA".into(),
            ColumnType::Json => "JSON".into(),
            ColumnType::Numeric { precision: None } => "NUMERIC".into(),
            ColumnType::Numeric {
                precision: Some((p, s)),
            } => format!("NUMERIC({p}, {s})"),
        }
    }

    /// Byte width bounding point-mode plaintexts of this type: 4 bytes for
    /// the 32-bit types, 8 otherwise.
    pub fn dl_byte_width(&self) -> u32 {
        match self {
            ColumnType::Int32 | ColumnType::F32 => 4,
            _ => 8,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            ColumnType::Int32 => "int32",
            ColumnType::Int64 => "int64",
            ColumnType::Bool => "bool",
            ColumnType::F32 => "f32",
            ColumnType::F64 => "f64",
            ColumnType::Text => "text",
            ColumnType::Bytes => "bytes",
            ColumnType::Json => "json",
            ColumnType::Numeric { .. } => "numeric",
        }
    }
}

fn parse_precision(upper: &str) -> Option<(u16, u16)> {
    let open = upper.find('(')?;
    let close = upper.rfind(')')?;
    let inner = upper.get(open + 1..close)?;
    let mut parts = inner.split(',').map(str::trim);
    let precision = parts.next()?.parse().ok()?;
    let scale = parts.next().map_or(Some(0), |s| s.parse().ok())?;
    Some((precision, scale))
}

/// A runtime cell value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColumnValue {
    Int32(i32),
    Int64(i64),
    Bool(bool),
    F32(f32),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(String),
    Numeric(f64),
}

impl ColumnValue {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            ColumnValue::Int32(_) => "int32",
            ColumnValue::Int64(_) => "int64",
            ColumnValue::Bool(_) => "bool",
            ColumnValue::F32(_) => "f32",
            ColumnValue::F64(_) => "f64",
            ColumnValue::Text(_) => "text",
            ColumnValue::Bytes(_) => "bytes",
            ColumnValue::Json(_) => "json",
            ColumnValue::Numeric(_) => "numeric",
        }
    }

    /// Whether this value inhabits the given column type.
    pub fn matches(&self, ty: &ColumnType) -> bool {
        matches!(
            (self, ty),
            (ColumnValue::Int32(_), ColumnType::Int32)
                | (ColumnValue::Int64(_), ColumnType::Int64)
                | (ColumnValue::Bool(_), ColumnType::Bool)
                | (ColumnValue::F32(_), ColumnType::F32)
                | (ColumnValue::F64(_), ColumnType::F64)
                | (ColumnValue::Text(_), ColumnType::Text)
                | (ColumnValue::Bytes(_), ColumnType::Bytes)
                | (ColumnValue::Json(_), ColumnType::Json)
                | (ColumnValue::Numeric(_), ColumnType::Numeric { .. })
        )
    }

    /// Canonical byte encoding fed to the encryption modes: fixed-width
    /// big-endian for numerics (floats by their IEEE-754 bits), UTF-8 for
    /// text, raw bytes as-is, one byte for booleans.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ColumnValue::Int32(v) => v.to_be_bytes().to_vec(),
            ColumnValue::Int64(v) => v.to_be_bytes().to_vec(),
            ColumnValue::Bool(v) => vec![u8::from(*v)],
            ColumnValue::F32(v) => v.to_bits().to_be_bytes().to_vec(),
            ColumnValue::F64(v) => v.to_bits().to_be_bytes().to_vec(),
            ColumnValue::Text(s) | ColumnValue::Json(s) => s.as_bytes().to_vec(),
            ColumnValue::Bytes(b) => b.clone(),
            ColumnValue::Numeric(v) => v.to_bits().to_be_bytes().to_vec(),
        }
    }

    /// Inverse of [`to_bytes`](Self::to_bytes) for a declared column type.
    pub fn from_bytes(ty: &ColumnType, bytes: &[u8]) -> Result<Self, Error> {
        let wrong_len = |expected: usize| {
            Error::MalformedInput(format!(
                "{} cell decodes from {expected} bytes, got {}",
                ty.name(),
                bytes.len()
            ))
        };
        match ty {
            ColumnType::Int32 => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| wrong_len(4))?;
                Ok(ColumnValue::Int32(i32::from_be_bytes(arr)))
            }
            ColumnType::Int64 => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| wrong_len(8))?;
                Ok(ColumnValue::Int64(i64::from_be_bytes(arr)))
            }
            ColumnType::Bool => match bytes {
                [0] => Ok(ColumnValue::Bool(false)),
                [1] => Ok(ColumnValue::Bool(true)),
                _ => Err(wrong_len(1)),
            },
            ColumnType::F32 => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| wrong_len(4))?;
                Ok(ColumnValue::F32(f32::from_bits(u32::from_be_bytes(arr))))
            }
            ColumnType::F64 => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| wrong_len(8))?;
                Ok(ColumnValue::F64(f64::from_bits(u64::from_be_bytes(arr))))
            }
            ColumnType::Text => Ok(ColumnValue::Text(
                String::from_utf8(bytes.to_vec())
                    .map_err(|e| Error::MalformedInput(format!("invalid utf-8 text cell: {e}")))?,
            )),
            ColumnType::Json => Ok(ColumnValue::Json(
                String::from_utf8(bytes.to_vec())
                    .map_err(|e| Error::MalformedInput(format!("invalid utf-8 json cell: {e}")))?,
            )),
            ColumnType::Bytes => Ok(ColumnValue::Bytes(bytes.to_vec())),
            ColumnType::Numeric { .. } => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| wrong_len(8))?;
                Ok(ColumnValue::Numeric(f64::from_bits(u64::from_be_bytes(
                    arr,
                ))))
            }
        }
    }

    /// Unsigned integer interpretation used by point mode, checked against
    /// the column's byte width.
    ///
    /// Only fixed-width numeric values can be point-encrypted; their bit
    /// patterns are the embedded integer. Variable-length types have no
    /// bounded integer form and are rejected up front rather than producing
    /// cells no solver can recover.
    pub fn to_point_scalar(&self, width: u32) -> Result<u128, Error> {
        let value: u128 = match self {
            ColumnValue::Int32(v) => (*v as u32).into(),
            ColumnValue::Int64(v) => (*v as u64).into(),
            ColumnValue::F32(v) => v.to_bits().into(),
            ColumnValue::F64(v) | ColumnValue::Numeric(v) => v.to_bits().into(),
            other => {
                return Err(Error::MalformedInput(format!(
                    "{} cells cannot be point-mode encrypted",
                    other.type_name()
                )))
            }
        };
        if width < 16 && value >> (8 * width) != 0 {
            return Err(Error::PlaintextRange { value, width });
        }
        Ok(value)
    }

    /// Rebuilds a value from the integer a DL solver recovered.
    pub fn from_point_scalar(ty: &ColumnType, value: u128) -> Result<Self, Error> {
        let out_of_range = || {
            Error::MalformedInput(format!(
                "recovered value {value} exceeds the range of a {} cell",
                ty.name()
            ))
        };
        match ty {
            ColumnType::Int32 => {
                let bits: u32 = value.try_into().map_err(|_| out_of_range())?;
                Ok(ColumnValue::Int32(bits as i32))
            }
            ColumnType::Int64 => {
                let bits: u64 = value.try_into().map_err(|_| out_of_range())?;
                Ok(ColumnValue::Int64(bits as i64))
            }
            ColumnType::F32 => {
                let bits: u32 = value.try_into().map_err(|_| out_of_range())?;
                Ok(ColumnValue::F32(f32::from_bits(bits)))
            }
            ColumnType::F64 => {
                let bits: u64 = value.try_into().map_err(|_| out_of_range())?;
                Ok(ColumnValue::F64(f64::from_bits(bits)))
            }
            ColumnType::Numeric { .. } => {
                let bits: u64 = value.try_into().map_err(|_| out_of_range())?;
                Ok(ColumnValue::Numeric(f64::from_bits(bits)))
            }
            _ => Err(Error::MalformedInput(format!(
                "{} columns cannot hold point-mode cells",
                ty.name()
            ))),
        }
    }
}

/// A primary-key value: the hashable subset of [`ColumnValue`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimaryKey {
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
}

impl std::fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimaryKey::Int(v) => write!(f, "{v}"),
            PrimaryKey::Text(s) => write!(f, "{s}"),
            PrimaryKey::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
        }
    }
}

impl TryFrom<&ColumnValue> for PrimaryKey {
    type Error = Error;

    fn try_from(value: &ColumnValue) -> Result<Self, Error> {
        match value {
            ColumnValue::Int32(v) => Ok(PrimaryKey::Int((*v).into())),
            ColumnValue::Int64(v) => Ok(PrimaryKey::Int(*v)),
            ColumnValue::Text(s) | ColumnValue::Json(s) => Ok(PrimaryKey::Text(s.clone())),
            ColumnValue::Bytes(b) => Ok(PrimaryKey::Bytes(b.clone())),
            other => Err(Error::MalformedInput(format!(
                "{} values cannot serve as a primary key",
                other.type_name()
            ))),
        }
    }
}
