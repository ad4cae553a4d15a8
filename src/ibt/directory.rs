//! Name-keyed channel directory
//!
//! The descriptor array is only scanned when a caller first asks for a channel
//! by name. [`DirectoryState`] records whether that scan has happened; the
//! directory is either absent or complete, never partially filled.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, warn};

use super::format::{IbtHeader, parse_channel_descriptor};
use crate::types::ChannelDescriptor;
use crate::{CaptureError, Result};

/// What to do when two descriptors share a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// The later descriptor replaces the earlier one.
    #[default]
    LastWins,
    /// Duplicates are schema corruption.
    Reject,
}

/// Channel descriptors in scan order, plus a name index where the last
/// descriptor with a given name wins.
#[derive(Debug, Clone, Default)]
pub struct ChannelDirectory {
    descriptors: Vec<ChannelDescriptor>,
    names: Vec<String>,
    by_name: HashMap<String, usize>,
}

impl ChannelDirectory {
    /// Scan all `numVars` descriptors.
    pub fn build(data: &[u8], header: &IbtHeader, policy: DuplicatePolicy) -> Result<Self> {
        let count = header.channel_count();
        debug!(channels = count, "Building channel directory");

        let mut descriptors = Vec::with_capacity(count);
        let mut names = Vec::with_capacity(count);
        let mut by_name = HashMap::with_capacity(count);

        for index in 0..count {
            let descriptor = parse_channel_descriptor(data, header, index)?;
            match by_name.entry(descriptor.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(index);
                }
                Entry::Occupied(mut slot) => {
                    if policy == DuplicatePolicy::Reject {
                        return Err(CaptureError::schema_corruption(
                            &descriptor.name,
                            format!("duplicate channel name at descriptor {}", index),
                        ));
                    }
                    warn!(
                        name = %descriptor.name,
                        index,
                        "Duplicate channel name, later descriptor replaces earlier one"
                    );
                    slot.insert(index);
                }
            }
            names.push(descriptor.name.clone());
            descriptors.push(descriptor);
        }

        debug!(unique = by_name.len(), "Channel directory built");
        Ok(Self { descriptors, names, by_name })
    }

    /// Look up a channel by exact name.
    pub fn get(&self, name: &str) -> Option<&ChannelDescriptor> {
        self.by_name.get(name).and_then(|&index| self.descriptors.get(index))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Every descriptor's name in scan order, duplicates included.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Every descriptor in scan order, including ones shadowed by a later
    /// descriptor of the same name.
    pub fn iter(&self) -> impl Iterator<Item = &ChannelDescriptor> {
        self.descriptors.iter()
    }

    /// Number of descriptors scanned (`numVars`).
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Number of distinct names.
    pub fn unique_len(&self) -> usize {
        self.by_name.len()
    }
}

/// Lazily built directory.
#[derive(Debug, Default)]
pub enum DirectoryState {
    #[default]
    NotBuilt,
    Built(ChannelDirectory),
}

impl DirectoryState {
    pub fn is_built(&self) -> bool {
        matches!(self, DirectoryState::Built(_))
    }

    /// Return the directory, scanning descriptors on first use.
    ///
    /// A failed scan leaves the state `NotBuilt`.
    pub fn get_or_build(
        &mut self,
        data: &[u8],
        header: &IbtHeader,
        policy: DuplicatePolicy,
    ) -> Result<&ChannelDirectory> {
        if let DirectoryState::NotBuilt = self {
            *self = DirectoryState::Built(ChannelDirectory::build(data, header, policy)?);
        }
        match self {
            DirectoryState::Built(directory) => Ok(directory),
            DirectoryState::NotBuilt => {
                Err(CaptureError::parse("Channel directory", "directory was not built"))
            }
        }
    }
}
