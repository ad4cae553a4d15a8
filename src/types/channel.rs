//! Channel descriptor types

use serde::{Deserialize, Serialize};

use super::VariableType;
use crate::{CaptureError, Result};

/// Metadata for one telemetry channel, parsed from a 144-byte descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ChannelDescriptor {
    /// Channel name as defined by the simulator
    pub name: String,
    /// Raw primitive type tag; see [`ChannelDescriptor::data_type`]
    pub type_tag: i32,
    /// Byte offset of the value within one tick record
    pub offset: usize,
    /// Number of elements (1 for scalar, >1 for fixed-size vectors)
    pub count: usize,
    /// Whether the simulator treats the sample count as elapsed time
    pub count_as_time: bool,
    /// Units of measurement (e.g., "m/s", "C", "N*m")
    pub units: String,
    /// Human-readable description
    pub description: String,
}

impl ChannelDescriptor {
    /// Resolve the raw type tag.
    ///
    /// An unrecognized tag means the capture is corrupt or was produced by a
    /// simulator build newer than this decoder.
    pub fn data_type(&self) -> Result<VariableType> {
        VariableType::from_tag(self.type_tag).ok_or_else(|| {
            CaptureError::schema_corruption(
                &self.name,
                format!("unknown primitive type tag {}", self.type_tag),
            )
        })
    }

    /// True for single-element channels.
    pub fn is_scalar(&self) -> bool {
        self.count == 1
    }

    /// Bytes the channel occupies within one tick record.
    pub fn byte_len(&self) -> Result<usize> {
        let width = self.data_type()?.size();
        width.checked_mul(self.count).ok_or_else(|| {
            CaptureError::schema_corruption(
                &self.name,
                format!("element count {} overflows record size", self.count),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(type_tag: i32, count: usize) -> ChannelDescriptor {
        ChannelDescriptor {
            name: "CarIdxLapDistPct".to_string(),
            type_tag,
            offset: 8,
            count,
            count_as_time: false,
            units: "%".to_string(),
            description: "Percentage distance around lap by car index".to_string(),
        }
    }

    #[test]
    fn known_tags_resolve() {
        assert_eq!(descriptor(4, 64).data_type().unwrap(), VariableType::Float32);
        assert_eq!(descriptor(4, 64).byte_len().unwrap(), 256);
        assert!(!descriptor(4, 64).is_scalar());
        assert!(descriptor(5, 1).is_scalar());
    }

    #[test]
    fn unknown_tag_is_schema_corruption() {
        let err = descriptor(42, 1).data_type().unwrap_err();
        match err {
            CaptureError::SchemaCorruption { channel, details } => {
                assert_eq!(channel, "CarIdxLapDistPct");
                assert!(details.contains("42"));
            }
            other => panic!("Expected SchemaCorruption, got {:?}", other),
        }
        assert!(descriptor(-1, 1).byte_len().is_err());
    }
}
