//! Tick record addressing.
//!
//! Records are never copied out of the capture. A channel's value at a tick
//! lives at `bufOffset + tick * bufLen + channel.offset`; element `e` of a
//! vector channel follows at `e * width` past that.

use super::format::{IbtDiskSubHeader, IbtHeader};
use crate::types::{ChannelDescriptor, ChannelValue, VarData, decode_value};
use crate::{CaptureError, Result};

/// Read-only view of the record array of one capture.
#[derive(Debug, Clone, Copy)]
pub struct RecordStore<'a> {
    data: &'a [u8],
    header: &'a IbtHeader,
    disk: &'a IbtDiskSubHeader,
}

impl<'a> RecordStore<'a> {
    pub fn new(data: &'a [u8], header: &'a IbtHeader, disk: &'a IbtDiskSubHeader) -> Self {
        Self { data, header, disk }
    }

    /// Number of recorded ticks.
    pub fn tick_count(&self) -> usize {
        self.disk.tick_count()
    }

    /// Bytes per tick record.
    pub fn stride(&self) -> usize {
        self.header.stride()
    }

    fn check_tick(&self, tick: usize) -> Result<()> {
        let tick_count = self.tick_count();
        if tick >= tick_count {
            return Err(CaptureError::IndexOutOfRange { index: tick, tick_count });
        }
        Ok(())
    }

    /// Byte offset of the start of `tick`'s record.
    fn record_offset(&self, tick: usize) -> Result<usize> {
        self.check_tick(tick)?;
        tick.checked_mul(self.stride())
            .and_then(|rel| rel.checked_add(self.header.records_offset()))
            .ok_or(CaptureError::Memory { offset: usize::MAX, len: self.stride() })
    }

    /// Absolute byte offset of `channel`'s first element at `tick`.
    pub fn absolute_offset(&self, channel: &ChannelDescriptor, tick: usize) -> Result<usize> {
        self.record_offset(tick)?
            .checked_add(channel.offset)
            .ok_or(CaptureError::Memory { offset: usize::MAX, len: 0 })
    }

    /// Raw bytes of one tick record.
    pub fn record(&self, tick: usize) -> Result<&'a [u8]> {
        let start = self.record_offset(tick)?;
        let len = self.stride();
        start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or(CaptureError::Memory { offset: start, len })
    }

    /// Decode `channel` at `tick`: a scalar for count 1, otherwise a vector in storage order.
    ///
    /// The channel's whole byte range is checked against the buffer before
    /// anything is decoded or allocated.
    pub fn decode(&self, channel: &ChannelDescriptor, tick: usize) -> Result<ChannelValue> {
        let base = self.absolute_offset(channel, tick)?;
        let data_type = channel.data_type()?;
        let len = channel.byte_len()?;
        let bytes = base
            .checked_add(len)
            .and_then(|end| self.data.get(base..end))
            .ok_or(CaptureError::Memory { offset: base, len })?;

        if channel.is_scalar() {
            return Ok(ChannelValue::Scalar(decode_value(bytes, 0, data_type)?));
        }

        let width = data_type.size();
        let values = (0..channel.count)
            .map(|element| decode_value(bytes, element * width, data_type))
            .collect::<Result<Vec<_>>>()?;
        Ok(ChannelValue::Vector(values))
    }

    /// Decode the first element of `channel` at `tick` as `T`.
    pub fn decode_as<T: VarData>(&self, channel: &ChannelDescriptor, tick: usize) -> Result<T> {
        let offset = self.absolute_offset(channel, tick)?;
        let data_type = channel.data_type()?;
        T::from_bytes(self.data, offset, data_type)
    }
}
