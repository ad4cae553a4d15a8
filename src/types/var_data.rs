//! Primitive decoding from capture bytes.
//!
//! [`decode_value`] is the dynamically typed path used by the reader: it takes
//! the channel's declared type and returns a [`Value`]. [`VarData`] is the
//! statically typed path for callers that already know which Rust type a
//! channel holds.

use super::{BitField, Value, VariableType};
use crate::{CaptureError, Result};

/// Borrow exactly `N` bytes at `offset`, or fail with a memory error.
fn read_array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    offset
        .checked_add(N)
        .and_then(|end| data.get(offset..end))
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(CaptureError::Memory { offset, len: N })
}

/// Decode one primitive of `data_type` at `offset`.
pub fn decode_value(data: &[u8], offset: usize, data_type: VariableType) -> Result<Value> {
    Ok(match data_type {
        VariableType::Char => Value::Char(read_array::<1>(data, offset)?[0]),
        VariableType::Bool => Value::Bool(read_array::<1>(data, offset)?[0] != 0),
        VariableType::Int32 => Value::Int32(i32::from_le_bytes(read_array(data, offset)?)),
        VariableType::BitField => {
            Value::BitField(BitField(u32::from_le_bytes(read_array(data, offset)?)))
        }
        VariableType::Float32 => Value::Float32(f32::from_le_bytes(read_array(data, offset)?)),
        VariableType::Float64 => Value::Float64(f64::from_le_bytes(read_array(data, offset)?)),
    })
}

/// Trait for Rust types that can be decoded from a telemetry channel.
pub trait VarData: Sized {
    /// Decode a value at `offset` from a channel declared as `data_type`.
    fn from_bytes(data: &[u8], offset: usize, data_type: VariableType) -> Result<Self>;
}

fn expect_type(actual: VariableType, accepted: &[VariableType], wanted: &str) -> Result<()> {
    if accepted.contains(&actual) {
        Ok(())
    } else {
        Err(CaptureError::TypeConversion {
            details: format!("Expected {}, got {:?}", wanted, actual),
        })
    }
}

impl VarData for f32 {
    fn from_bytes(data: &[u8], offset: usize, data_type: VariableType) -> Result<Self> {
        expect_type(data_type, &[VariableType::Float32], "Float32")?;
        Ok(f32::from_le_bytes(read_array(data, offset)?))
    }
}

impl VarData for f64 {
    fn from_bytes(data: &[u8], offset: usize, data_type: VariableType) -> Result<Self> {
        expect_type(data_type, &[VariableType::Float64], "Float64")?;
        Ok(f64::from_le_bytes(read_array(data, offset)?))
    }
}

impl VarData for i32 {
    fn from_bytes(data: &[u8], offset: usize, data_type: VariableType) -> Result<Self> {
        expect_type(data_type, &[VariableType::Int32], "Int32")?;
        Ok(i32::from_le_bytes(read_array(data, offset)?))
    }
}

// Bitfields are stored unsigned, so u32 reads them without the wrapper.
impl VarData for u32 {
    fn from_bytes(data: &[u8], offset: usize, data_type: VariableType) -> Result<Self> {
        expect_type(data_type, &[VariableType::BitField], "BitField")?;
        Ok(u32::from_le_bytes(read_array(data, offset)?))
    }
}

impl VarData for BitField {
    fn from_bytes(data: &[u8], offset: usize, data_type: VariableType) -> Result<Self> {
        u32::from_bytes(data, offset, data_type).map(BitField)
    }
}

impl VarData for bool {
    fn from_bytes(data: &[u8], offset: usize, data_type: VariableType) -> Result<Self> {
        expect_type(data_type, &[VariableType::Bool], "Bool")?;
        Ok(read_array::<1>(data, offset)?[0] != 0)
    }
}

impl VarData for u8 {
    fn from_bytes(data: &[u8], offset: usize, data_type: VariableType) -> Result<Self> {
        expect_type(data_type, &[VariableType::Char], "Char")?;
        Ok(read_array::<1>(data, offset)?[0])
    }
}
