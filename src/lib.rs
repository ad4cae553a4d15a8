//! Random-access decoder for iRacing IBT telemetry captures.
//!
//! An IBT capture is a self-describing binary file: a header, a table of
//! channel descriptors and an array of fixed-stride tick records. Pitwall IBT
//! opens a capture, builds a name-keyed channel directory on first use, and
//! decodes any channel at any tick (or across all ticks) into typed values.
//!
//! # Features
//!
//! - **Random access**: any channel at any tick, decoded in place
//! - **Typed values**: scalar or vector [`ChannelValue`]s, or typed columns via [`VarData`]
//! - **Session info**: the embedded YAML block, cleaned and parsed on demand
//! - **Cross-platform**: plain file I/O, optional read-only memory mapping (`mmap`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use pitwall_ibt::{IbtReader, OpenOptions};
//!
//! fn main() -> pitwall_ibt::Result<()> {
//!     let mut reader = IbtReader::new();
//!     reader.open_with("/path/to/session.ibt", &OpenOptions::new().memory_map(true))?;
//!
//!     for name in reader.channel_names()? {
//!         println!("{name}");
//!     }
//!
//!     let throttle: Vec<f32> = reader.read_column("Throttle")?;
//!     let rpm = reader.read_one(throttle.len() / 2, "RPM")?;
//!     println!("Mid-session RPM: {:?}", rpm.as_scalar());
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;
pub mod yaml_utils;

// Data source modules
pub mod ibt;

// Core exports
pub use error::*;
pub use types::*;

// Data source exports
pub use ibt::{IbtReader, OpenOptions};
