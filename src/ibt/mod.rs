//! IBT capture reading (cross-platform)
//!
//! An IBT file is a fixed header, a disk sub-header, an array of channel
//! descriptors, a session info text block and an array of fixed-stride tick
//! records. This module parses the layout and decodes channel values on demand.

pub mod buffer;
pub mod directory;
pub mod format;
pub mod options;
pub mod reader;
pub mod records;

pub use directory::{ChannelDirectory, DuplicatePolicy};
pub use format::{IbtDiskSubHeader, IbtHeader};
pub use options::OpenOptions;
pub use reader::IbtReader;
