// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed property values and their canonical text codec.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Declared type of a property value.
///
/// The kind is fixed when a property is created and directs both type
/// checking on assignment and the text codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Boolean flag
    Bool,
    /// Signed 32-bit integer
    Int,
    /// Unsigned 32-bit integer
    UInt,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// UTF-8 text
    Text,
    /// 2D float vector
    Vec2,
    /// 3D float vector
    Vec3,
    /// 4D float vector
    Vec4,
    /// 2D integer vector
    IVec2,
    /// 3x3 float matrix (row major)
    Mat3,
    /// 4x4 float matrix (row major)
    Mat4,
    /// Variable-length float array
    FloatArray,
    /// Variable-length integer array
    IntArray,
    /// Raw byte blob
    Bytes,
    /// Index into an enumerated option list
    Choice,
}

/// A property value.
///
/// Variants correspond one-to-one with [`ValueKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean flag
    Bool(bool),
    /// Signed 32-bit integer
    Int(i32),
    /// Unsigned 32-bit integer
    UInt(u32),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// UTF-8 text
    Text(String),
    /// 2D float vector
    Vec2([f32; 2]),
    /// 3D float vector
    Vec3([f32; 3]),
    /// 4D float vector
    Vec4([f32; 4]),
    /// 2D integer vector
    IVec2([i32; 2]),
    /// 3x3 float matrix (row major)
    Mat3([[f32; 3]; 3]),
    /// 4x4 float matrix (row major)
    Mat4([[f32; 4]; 4]),
    /// Variable-length float array
    FloatArray(Vec<f32>),
    /// Variable-length integer array
    IntArray(Vec<i32>),
    /// Raw byte blob
    Bytes(Vec<u8>),
    /// Index into an enumerated option list
    Choice(u32),
}

/// Error decoding a value from its canonical text form.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValueParseError {
    /// The text does not parse as the expected kind
    #[error("invalid {kind:?} literal {text:?}: {reason}")]
    Malformed {
        /// Expected kind
        kind: ValueKind,
        /// Offending text
        text: String,
        /// Parser diagnostic
        reason: String,
    },
    /// A vector or matrix literal has the wrong number of components
    #[error("expected {expected} components, found {found}")]
    ComponentCount {
        /// Required component count
        expected: usize,
        /// Count found in the text
        found: usize,
    },
}

impl Value {
    /// Get the kind tag for this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::UInt(_) => ValueKind::UInt,
            Self::Float(_) => ValueKind::Float,
            Self::Double(_) => ValueKind::Double,
            Self::Text(_) => ValueKind::Text,
            Self::Vec2(_) => ValueKind::Vec2,
            Self::Vec3(_) => ValueKind::Vec3,
            Self::Vec4(_) => ValueKind::Vec4,
            Self::IVec2(_) => ValueKind::IVec2,
            Self::Mat3(_) => ValueKind::Mat3,
            Self::Mat4(_) => ValueKind::Mat4,
            Self::FloatArray(_) => ValueKind::FloatArray,
            Self::IntArray(_) => ValueKind::IntArray,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Choice(_) => ValueKind::Choice,
        }
    }

    /// Encode to the canonical text form.
    ///
    /// Booleans encode as `0`/`1`, vectors join components with `;`,
    /// matrices join rows with `|` (components within a row with `;`),
    /// arrays join elements with `|`, byte blobs use standard base64.
    /// The encoding is lossless: [`Value::decode`] with the matching
    /// kind returns an equal value.
    pub fn encode(&self) -> String {
        match self {
            Self::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Self::Int(v) => v.to_string(),
            Self::UInt(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Double(v) => v.to_string(),
            Self::Text(s) => s.clone(),
            Self::Vec2(v) => join(v, ";"),
            Self::Vec3(v) => join(v, ";"),
            Self::Vec4(v) => join(v, ";"),
            Self::IVec2(v) => join(v, ";"),
            Self::Mat3(m) => m.iter().map(|row| join(row, ";")).collect::<Vec<_>>().join("|"),
            Self::Mat4(m) => m.iter().map(|row| join(row, ";")).collect::<Vec<_>>().join("|"),
            Self::FloatArray(v) => join(v, "|"),
            Self::IntArray(v) => join(v, "|"),
            Self::Bytes(b) => base64::Engine::encode(&base64::engine::general_purpose::STANDARD, b),
            Self::Choice(v) => v.to_string(),
        }
    }

    /// Decode from the canonical text form, directed by the expected kind.
    pub fn decode(kind: ValueKind, text: &str) -> Result<Self, ValueParseError> {
        match kind {
            ValueKind::Bool => match text {
                "0" => Ok(Self::Bool(false)),
                "1" => Ok(Self::Bool(true)),
                _ => Err(malformed(kind, text, "expected 0 or 1")),
            },
            ValueKind::Int => parse_scalar(kind, text).map(Self::Int),
            ValueKind::UInt => parse_scalar(kind, text).map(Self::UInt),
            ValueKind::Float => parse_scalar(kind, text).map(Self::Float),
            ValueKind::Double => parse_scalar(kind, text).map(Self::Double),
            ValueKind::Text => Ok(Self::Text(text.to_string())),
            ValueKind::Vec2 => parse_fixed::<f32, 2>(kind, text, ";").map(Self::Vec2),
            ValueKind::Vec3 => parse_fixed::<f32, 3>(kind, text, ";").map(Self::Vec3),
            ValueKind::Vec4 => parse_fixed::<f32, 4>(kind, text, ";").map(Self::Vec4),
            ValueKind::IVec2 => parse_fixed::<i32, 2>(kind, text, ";").map(Self::IVec2),
            ValueKind::Mat3 => parse_matrix::<3>(kind, text).map(Self::Mat3),
            ValueKind::Mat4 => parse_matrix::<4>(kind, text).map(Self::Mat4),
            ValueKind::FloatArray => parse_list(kind, text, "|").map(Self::FloatArray),
            ValueKind::IntArray => parse_list(kind, text, "|").map(Self::IntArray),
            ValueKind::Bytes => {
                base64::Engine::decode(&base64::engine::general_purpose::STANDARD, text)
                    .map(Self::Bytes)
                    .map_err(|e| malformed(kind, text, &e.to_string()))
            }
            ValueKind::Choice => parse_scalar(kind, text).map(Self::Choice),
        }
    }

    /// Extract a bool, if this value holds one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract a signed integer, if this value holds one.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract an unsigned integer, if this value holds one.
    pub fn as_uint(&self) -> Option<u32> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract a 32-bit float, if this value holds one.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract a 64-bit float, if this value holds one.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract the text, if this value holds one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Extract a choice index, if this value holds one.
    pub fn as_choice(&self) -> Option<u32> {
        match self {
            Self::Choice(v) => Some(*v),
            _ => None,
        }
    }
}

fn malformed(kind: ValueKind, text: &str, reason: &str) -> ValueParseError {
    ValueParseError::Malformed {
        kind,
        text: text.to_string(),
        reason: reason.to_string(),
    }
}

fn join<T: ToString>(items: &[T], sep: &str) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(sep)
}

fn parse_scalar<T>(kind: ValueKind, text: &str) -> Result<T, ValueParseError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    text.parse::<T>().map_err(|e| malformed(kind, text, &e.to_string()))
}

fn parse_components<T>(kind: ValueKind, text: &str, sep: &str) -> Result<Vec<T>, ValueParseError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    text.split(sep)
        .map(|part| parse_scalar(kind, part))
        .collect()
}

fn parse_fixed<T, const N: usize>(
    kind: ValueKind,
    text: &str,
    sep: &str,
) -> Result<[T; N], ValueParseError>
where
    T: FromStr + Copy,
    T::Err: std::fmt::Display,
{
    let parts = parse_components::<T>(kind, text, sep)?;
    parts
        .try_into()
        .map_err(|parts: Vec<T>| ValueParseError::ComponentCount {
            expected: N,
            found: parts.len(),
        })
}

fn parse_matrix<const N: usize>(
    kind: ValueKind,
    text: &str,
) -> Result<[[f32; N]; N], ValueParseError> {
    let rows: Vec<[f32; N]> = text
        .split('|')
        .map(|row| parse_fixed::<f32, N>(kind, row, ";"))
        .collect::<Result<_, _>>()?;
    rows.try_into()
        .map_err(|rows: Vec<[f32; N]>| ValueParseError::ComponentCount {
            expected: N,
            found: rows.len(),
        })
}

fn parse_list<T>(kind: ValueKind, text: &str, sep: &str) -> Result<Vec<T>, ValueParseError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if text.is_empty() {
        return Ok(Vec::new());
    }
    parse_components(kind, text, sep)
}
