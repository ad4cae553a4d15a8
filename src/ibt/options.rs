//! Options controlling how a capture is opened.

use super::directory::DuplicatePolicy;

/// Configuration for [`IbtReader::open_with`](super::IbtReader::open_with).
///
/// ```rust
/// use pitwall_ibt::ibt::OpenOptions;
///
/// let options = OpenOptions::new().memory_map(true).strict_channel_names(true);
/// assert!(options.is_strict());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOptions {
    memory_map: bool,
    duplicates: DuplicatePolicy,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map the file instead of reading it into memory.
    ///
    /// Only honoured when the crate is built with the `mmap` feature.
    pub fn memory_map(mut self, enabled: bool) -> Self {
        self.memory_map = enabled;
        self
    }

    /// Treat duplicate channel names as schema corruption instead of letting
    /// the last descriptor win.
    pub fn strict_channel_names(mut self, strict: bool) -> Self {
        self.duplicates = if strict { DuplicatePolicy::Reject } else { DuplicatePolicy::LastWins };
        self
    }

    pub fn wants_memory_map(&self) -> bool {
        self.memory_map
    }

    pub fn is_strict(&self) -> bool {
        self.duplicates == DuplicatePolicy::Reject
    }

    pub(crate) fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicates
    }
}
