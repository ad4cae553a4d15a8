//! Error types for capture decoding.
//!
//! Every fallible operation in this crate returns [`Result`], whose error side is
//! [`CaptureError`]. The variants fall into three groups:
//!
//! - **Open failures**: [`CaptureError::File`] and [`CaptureError::Truncated`] are
//!   raised by `open` when the capture cannot be loaded at all.
//! - **Corruption**: [`CaptureError::Parse`], [`CaptureError::SchemaCorruption`] and
//!   [`CaptureError::Memory`] mean the capture bytes disagree with their own
//!   headers. They are never silently papered over with zero values.
//! - **Expected outcomes**: [`CaptureError::NotOpen`], [`CaptureError::UnknownChannel`]
//!   and [`CaptureError::IndexOutOfRange`] are ordinary results of probing a
//!   capture. Callers are expected to match on them.
//!
//! ```rust
//! use pitwall_ibt::CaptureError;
//!
//! let error = CaptureError::unknown_channel("CarIdxLapDistPct");
//! assert!(error.is_recoverable());
//! assert!(!error.is_retryable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for capture operations.
pub type Result<T, E = CaptureError> = std::result::Result<T, E>;

/// Main error type for capture operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CaptureError {
    #[error("IBT file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Capture too short: need at least {needed} bytes, found {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Schema corruption in channel '{channel}': {details}")]
    SchemaCorruption { channel: String, details: String },

    #[error("Read of {len} bytes at offset {offset:#x} is outside the capture buffer")]
    Memory { offset: usize, len: usize },

    #[error("Type conversion error: {details}")]
    TypeConversion { details: String },

    #[error("No capture is open")]
    NotOpen,

    #[error("Channel '{name}' not found in capture")]
    UnknownChannel { name: String },

    #[error("Tick {index} out of range (capture has {tick_count} ticks)")]
    IndexOutOfRange { index: usize, tick_count: usize },
}

impl CaptureError {
    /// Returns whether retrying the same operation could succeed.
    ///
    /// Capture files are static, so no error is retryable.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Returns whether this is an expected outcome of probing an open capture
    /// (or a closed reader) rather than a failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CaptureError::NotOpen
                | CaptureError::UnknownChannel { .. }
                | CaptureError::IndexOutOfRange { .. }
        )
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            CaptureError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
                "Verify the path points at an .ibt capture",
            ],
            CaptureError::Truncated { .. } => vec![
                "Verify the capture was fully written by the simulator",
                "Check the file was not cut short during copy or download",
            ],
            CaptureError::Parse { .. } => vec![
                "Verify source data integrity",
                "Check the capture was produced by a supported simulator version",
            ],
            CaptureError::SchemaCorruption { .. } => vec![
                "Verify source data integrity",
                "Check for channel types added by a newer simulator release",
                "Disable strict channel names if duplicates are expected",
            ],
            CaptureError::Memory { .. } => vec![
                "Check the capture is not truncated",
                "Verify header record count against the file size",
            ],
            CaptureError::TypeConversion { .. } => vec![
                "Check the channel's declared type",
                "Use read_one/read_all for dynamically typed access",
            ],
            CaptureError::NotOpen => vec!["Open a capture before reading"],
            CaptureError::UnknownChannel { .. } => vec![
                "Check channel name spelling",
                "List available channels with channel_names()",
                "Channels vary by car and simulator configuration",
            ],
            CaptureError::IndexOutOfRange { .. } => vec![
                "Keep tick indices below tick_count()",
                "Use read_all for whole-capture scans",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CaptureError::File { path: path.into(), source }
    }

    /// Helper constructor for parse errors.
    pub fn parse(context: impl Into<String>, details: impl Into<String>) -> Self {
        CaptureError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for schema corruption errors.
    pub fn schema_corruption(channel: impl Into<String>, details: impl Into<String>) -> Self {
        CaptureError::SchemaCorruption { channel: channel.into(), details: details.into() }
    }

    /// Helper constructor for out-of-buffer reads.
    pub fn memory_access_error(offset: usize, len: usize) -> Self {
        CaptureError::Memory { offset, len }
    }

    /// Helper constructor for unknown channel lookups.
    pub fn unknown_channel(name: impl Into<String>) -> Self {
        CaptureError::UnknownChannel { name: name.into() }
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
          #[test]
          fn error_messages_carry_their_context(
            name in "\\w+",
            offset in 0usize..0x10000usize,
            len in 1usize..16usize,
            index in 0usize..100_000usize,
            tick_count in 0usize..100_000usize,
            details in ".*"
          ) {
            let unknown = CaptureError::unknown_channel(name.clone());
            prop_assert!(unknown.to_string().contains(&name));

            let memory = CaptureError::memory_access_error(offset, len);
            let offset_hex = format!("{:#x}", offset);
            prop_assert!(memory.to_string().contains(&offset_hex));

            let range = CaptureError::IndexOutOfRange { index, tick_count };
            let range_msg = range.to_string();
            prop_assert!(range_msg.contains(&index.to_string()));
            prop_assert!(range_msg.contains(&tick_count.to_string()));

            let corruption = CaptureError::schema_corruption(name.clone(), details.clone());
            let corruption_msg = corruption.to_string();
            prop_assert!(corruption_msg.contains(&name));
            prop_assert!(corruption_msg.contains(&details));
          }
        }
    }

    #[test]
    fn expected_outcomes_are_distinct_and_recoverable() {
        let not_open = CaptureError::NotOpen;
        let unknown = CaptureError::unknown_channel("Speed");
        let range = CaptureError::IndexOutOfRange { index: 3, tick_count: 3 };

        assert!(not_open.is_recoverable());
        assert!(unknown.is_recoverable());
        assert!(range.is_recoverable());

        assert!(matches!(not_open, CaptureError::NotOpen));
        assert!(matches!(unknown, CaptureError::UnknownChannel { .. }));
        assert!(matches!(range, CaptureError::IndexOutOfRange { .. }));
    }

    #[test]
    fn corruption_is_not_recoverable() {
        assert!(!CaptureError::schema_corruption("Gear", "unknown type tag 9").is_recoverable());
        assert!(!CaptureError::memory_access_error(0x40, 4).is_recoverable());
        assert!(!CaptureError::Truncated { needed: 144, actual: 10 }.is_recoverable());
    }

    #[test]
    fn nothing_is_retryable_and_every_variant_has_guidance() {
        let errors = [
            CaptureError::file_error(
                "/missing.ibt",
                std::io::Error::new(std::io::ErrorKind::NotFound, "test"),
            ),
            CaptureError::Truncated { needed: 144, actual: 0 },
            CaptureError::parse("Header validation", "negative"),
            CaptureError::schema_corruption("RPM", "bad tag"),
            CaptureError::memory_access_error(0, 4),
            CaptureError::TypeConversion { details: "Expected Float32".to_string() },
            CaptureError::NotOpen,
            CaptureError::unknown_channel("Speed"),
            CaptureError::IndexOutOfRange { index: 0, tick_count: 0 },
        ];

        for error in &errors {
            assert!(!error.is_retryable());
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty());
            for suggestion in suggestions {
                assert!(suggestion.len() > 5);
            }
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<CaptureError>();

        let error = CaptureError::NotOpen;
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn from_io_error_keeps_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test file");
        let capture_err: CaptureError = io_err.into();

        match capture_err {
            CaptureError::File { source, .. } => {
                assert_eq!(source.to_string(), "test file");
            }
            _ => panic!("Expected File error variant"),
        }
    }
}
