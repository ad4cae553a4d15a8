//! Telemetry channel type definitions

use serde::{Deserialize, Serialize};

use super::BitField;

/// Supported telemetry primitive types.
/// Maps to iRacing SDK's irsdk_VarType enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum VariableType {
    /// 8-bit unsigned character (irsdk_char, tag 0)
    Char,
    /// Boolean stored in one byte (irsdk_bool, tag 1)
    Bool,
    /// 32-bit signed integer (irsdk_int, tag 2)
    Int32,
    /// 32-bit unsigned bitfield (irsdk_bitField, tag 3)
    BitField,
    /// 32-bit floating point (irsdk_float, tag 4)
    Float32,
    /// 64-bit floating point (irsdk_double, tag 5)
    Float64,
}

impl VariableType {
    /// Map a raw descriptor type tag to a known type.
    ///
    /// Returns `None` for tags this decoder does not understand.
    pub const fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(VariableType::Char),
            1 => Some(VariableType::Bool),
            2 => Some(VariableType::Int32),
            3 => Some(VariableType::BitField),
            4 => Some(VariableType::Float32),
            5 => Some(VariableType::Float64),
            _ => None,
        }
    }

    /// The raw tag this type is stored as in a descriptor.
    pub const fn tag(&self) -> i32 {
        match self {
            VariableType::Char => 0,
            VariableType::Bool => 1,
            VariableType::Int32 => 2,
            VariableType::BitField => 3,
            VariableType::Float32 => 4,
            VariableType::Float64 => 5,
        }
    }

    /// Returns the size in bytes of this data type.
    /// Matches the irsdk_VarTypeBytes array from the iRacing SDK.
    pub const fn size(&self) -> usize {
        match self {
            VariableType::Char | VariableType::Bool => 1,
            VariableType::Int32 | VariableType::BitField | VariableType::Float32 => 4,
            VariableType::Float64 => 8,
        }
    }
}

/// One decoded primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum Value {
    Char(u8),
    Bool(bool),
    Int32(i32),
    BitField(BitField),
    Float32(f32),
    Float64(f64),
}

impl Value {
    /// The primitive type this value was decoded as.
    pub fn variable_type(&self) -> VariableType {
        match self {
            Value::Char(_) => VariableType::Char,
            Value::Bool(_) => VariableType::Bool,
            Value::Int32(_) => VariableType::Int32,
            Value::BitField(_) => VariableType::BitField,
            Value::Float32(_) => VariableType::Float32,
            Value::Float64(_) => VariableType::Float64,
        }
    }

    /// Widen any numeric value to `f64`. Booleans map to 0.0 / 1.0.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Char(v) => v as f64,
            Value::Bool(v) => u8::from(v) as f64,
            Value::Int32(v) => v as f64,
            Value::BitField(v) => v.value() as f64,
            Value::Float32(v) => v as f64,
            Value::Float64(v) => v,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Value::Int32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Value::Float32(v) => Some(v),
            _ => None,
        }
    }
}

/// Value of one channel at one tick.
///
/// Scalar channels (count = 1) decode to [`ChannelValue::Scalar`]; fixed-size
/// vector channels such as per-wheel or per-car arrays decode to
/// [`ChannelValue::Vector`] in storage order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(untagged)]
pub enum ChannelValue {
    Scalar(Value),
    Vector(Vec<Value>),
}

impl ChannelValue {
    /// The scalar value, or `None` for vector channels.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            ChannelValue::Scalar(value) => Some(value),
            ChannelValue::Vector(_) => None,
        }
    }

    /// The vector elements, or `None` for scalar channels.
    pub fn as_vector(&self) -> Option<&[Value]> {
        match self {
            ChannelValue::Scalar(_) => None,
            ChannelValue::Vector(values) => Some(values),
        }
    }

    /// Number of primitives held.
    pub fn len(&self) -> usize {
        match self {
            ChannelValue::Scalar(_) => 1,
            ChannelValue::Vector(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
