//! Core types for telemetry value representation.
//!
//! ## Architecture
//!
//! The type system maps directly to iRacing SDK structures:
//! - [`VariableType`] maps to iRacing's `irsdk_VarType` enum with size information
//! - [`ChannelDescriptor`] is one parsed `irsdk_varHeader`
//! - [`Value`] and [`ChannelValue`] hold decoded samples, scalar or vector
//! - [`decode_value`] and the [`VarData`] trait decode primitives from capture bytes
//! - [`BitField`] handles iRacing's bitfield channels with flag operations
//!
//! ## Usage Example
//!
//! ```rust
//! use pitwall_ibt::types::{decode_value, Value, VarData, VariableType};
//!
//! let data = vec![0x00, 0xA0, 0x8C, 0x45]; // 4500.0 as little-endian f32
//!
//! let rpm = decode_value(&data, 0, VariableType::Float32).unwrap();
//! assert_eq!(rpm, Value::Float32(4500.0));
//!
//! let typed: f32 = f32::from_bytes(&data, 0, VariableType::Float32).unwrap();
//! assert!((typed - 4500.0).abs() < 1.0);
//! ```

mod bitfield;
mod channel;
mod var_data;
mod variable_type;

// Re-export all public types
pub use bitfield::BitField;
pub use channel::ChannelDescriptor;
pub use var_data::{VarData, decode_value};
pub use variable_type::{ChannelValue, Value, VariableType};
