//! Test utilities for building synthetic IBT captures
//!
//! [`CaptureBuilder`] lays out a byte-exact capture (header, disk sub-header,
//! descriptors, session text, records) so unit tests and benchmarks do not
//! depend on recorded telemetry files.

#![cfg(any(test, feature = "benchmark"))]

use crate::ibt::format::{DISK_SUBHEADER_OFFSET, IRSDK_VAR_HEADER_SIZE, MIN_CAPTURE_SIZE};
use crate::types::VariableType;

/// Sample generator: `(tick, element) -> value`, cast to the channel's type on write.
pub type SampleFn = fn(usize, usize) -> f64;

/// Value written by default for `element` of channel number `channel` at `tick`.
pub fn default_sample(channel: usize, tick: usize, element: usize) -> f64 {
    (channel * 1000 + tick * 10 + element) as f64
}

/// One channel to be written into a synthetic capture.
#[derive(Debug, Clone)]
pub struct ChannelSpec {
    name: String,
    type_tag: i32,
    width: usize,
    count: usize,
    offset: Option<usize>,
    units: String,
    description: String,
    generator: Option<SampleFn>,
}

impl ChannelSpec {
    pub fn scalar(name: &str, data_type: VariableType) -> Self {
        Self::vector(name, data_type, 1)
    }

    pub fn vector(name: &str, data_type: VariableType, count: usize) -> Self {
        Self {
            name: name.to_string(),
            type_tag: data_type.tag(),
            width: data_type.size(),
            count,
            offset: None,
            units: String::new(),
            description: String::new(),
            generator: None,
        }
    }

    /// Channel with an arbitrary (possibly unknown) type tag occupying `width` bytes.
    pub fn with_tag(name: &str, type_tag: i32, width: usize) -> Self {
        Self { type_tag, width, ..Self::scalar(name, VariableType::Char) }
    }

    /// Place the channel at a fixed in-record offset instead of packing it.
    pub fn at(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn units(mut self, units: &str) -> Self {
        self.units = units.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn samples(mut self, generator: SampleFn) -> Self {
        self.generator = Some(generator);
        self
    }
}

/// Builder for a complete in-memory IBT capture.
#[derive(Debug, Clone)]
pub struct CaptureBuilder {
    version: i32,
    tick_rate: i32,
    channels: Vec<ChannelSpec>,
    stride: Option<usize>,
    record_count: usize,
    session_info: Option<Vec<u8>>,
    start_date: i64,
    start_time: f64,
    end_time: f64,
    lap_count: i32,
}

impl Default for CaptureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBuilder {
    pub fn new() -> Self {
        Self {
            version: 2,
            tick_rate: 60,
            channels: Vec::new(),
            stride: None,
            record_count: 0,
            session_info: None,
            start_date: 0,
            start_time: 0.0,
            end_time: 0.0,
            lap_count: 0,
        }
    }

    pub fn version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn tick_rate(mut self, tick_rate: i32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    pub fn channel(mut self, channel: ChannelSpec) -> Self {
        self.channels.push(channel);
        self
    }

    /// Fix the record stride; by default it is the end of the last channel.
    pub fn stride(mut self, stride: usize) -> Self {
        self.stride = Some(stride);
        self
    }

    pub fn record_count(mut self, record_count: usize) -> Self {
        self.record_count = record_count;
        self
    }

    pub fn session_info(mut self, yaml: &str) -> Self {
        self.session_info = Some(yaml.as_bytes().to_vec());
        self
    }

    pub fn session_info_bytes(mut self, bytes: &[u8]) -> Self {
        self.session_info = Some(bytes.to_vec());
        self
    }

    pub fn disk_times(mut self, start_date: i64, start_time: f64, end_time: f64) -> Self {
        self.start_date = start_date;
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    pub fn lap_count(mut self, lap_count: i32) -> Self {
        self.lap_count = lap_count;
        self
    }

    /// In-record offsets actually used, in channel order.
    pub fn channel_offsets(&self) -> Vec<usize> {
        let mut next = 0;
        self.channels
            .iter()
            .map(|channel| {
                let offset = channel.offset.unwrap_or(next);
                next = next.max(offset + channel.width * channel.count);
                offset
            })
            .collect()
    }

    fn effective_stride(&self) -> usize {
        let packed = self
            .channels
            .iter()
            .zip(self.channel_offsets())
            .map(|(channel, offset)| offset + channel.width * channel.count)
            .max()
            .unwrap_or(0);
        self.stride.unwrap_or(packed)
    }

    /// Serialize the capture.
    pub fn build(&self) -> Vec<u8> {
        let var_header_offset = MIN_CAPTURE_SIZE;
        let session_info_offset = var_header_offset + self.channels.len() * IRSDK_VAR_HEADER_SIZE;
        let session_info_len = self.session_info.as_ref().map_or(0, Vec::len);
        let buf_offset = session_info_offset + session_info_len;
        let stride = self.effective_stride();
        let offsets = self.channel_offsets();

        let mut data = vec![0u8; buf_offset + stride * self.record_count];

        let put_i32 = |data: &mut Vec<u8>, at: usize, v: i32| {
            data[at..at + 4].copy_from_slice(&v.to_le_bytes());
        };

        put_i32(&mut data, 0, self.version);
        put_i32(&mut data, 8, self.tick_rate);
        put_i32(&mut data, 12, 1);
        put_i32(&mut data, 16, session_info_len as i32);
        put_i32(&mut data, 20, if session_info_len > 0 { session_info_offset as i32 } else { 0 });
        put_i32(&mut data, 24, self.channels.len() as i32);
        put_i32(&mut data, 28, var_header_offset as i32);
        put_i32(&mut data, 32, 1);
        put_i32(&mut data, 36, stride as i32);
        put_i32(&mut data, 48, self.record_count as i32);
        put_i32(&mut data, 52, buf_offset as i32);

        let disk = DISK_SUBHEADER_OFFSET;
        data[disk..disk + 8].copy_from_slice(&self.start_date.to_le_bytes());
        data[disk + 8..disk + 16].copy_from_slice(&self.start_time.to_le_bytes());
        data[disk + 16..disk + 24].copy_from_slice(&self.end_time.to_le_bytes());
        put_i32(&mut data, disk + 24, self.lap_count);
        put_i32(&mut data, disk + 28, self.record_count as i32);

        for (index, (channel, &offset)) in self.channels.iter().zip(&offsets).enumerate() {
            let at = var_header_offset + index * IRSDK_VAR_HEADER_SIZE;
            put_i32(&mut data, at, channel.type_tag);
            put_i32(&mut data, at + 4, offset as i32);
            put_i32(&mut data, at + 8, channel.count as i32);
            write_fixed_str(&mut data[at + 16..at + 48], &channel.name);
            write_fixed_str(&mut data[at + 48..at + 112], &channel.description);
            write_fixed_str(&mut data[at + 112..at + 144], &channel.units);
        }

        if let Some(text) = &self.session_info {
            data[session_info_offset..buf_offset].copy_from_slice(text);
        }

        for tick in 0..self.record_count {
            let record = buf_offset + tick * stride;
            for (index, (channel, &offset)) in self.channels.iter().zip(&offsets).enumerate() {
                for element in 0..channel.count {
                    let value = match channel.generator {
                        Some(generator) => generator(tick, element),
                        None => default_sample(index, tick, element),
                    };
                    let at = record + offset + element * channel.width;
                    encode_sample(&mut data[at..at + channel.width], channel.type_tag, value);
                }
            }
        }

        data
    }
}

fn write_fixed_str(field: &mut [u8], text: &str) {
    let bytes = text.as_bytes();
    let len = bytes.len().min(field.len() - 1);
    field[..len].copy_from_slice(&bytes[..len]);
}

fn encode_sample(slot: &mut [u8], type_tag: i32, value: f64) {
    match VariableType::from_tag(type_tag) {
        Some(VariableType::Char) => slot[0] = value as u8,
        Some(VariableType::Bool) => slot[0] = u8::from(value != 0.0),
        Some(VariableType::Int32) => slot.copy_from_slice(&(value as i32).to_le_bytes()),
        Some(VariableType::BitField) => slot.copy_from_slice(&(value as u32).to_le_bytes()),
        Some(VariableType::Float32) => slot.copy_from_slice(&(value as f32).to_le_bytes()),
        Some(VariableType::Float64) => slot.copy_from_slice(&value.to_le_bytes()),
        None => slot.fill(0xEE),
    }
}
