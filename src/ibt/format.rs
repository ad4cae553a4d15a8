//! IBT file format structures and parsing
//!
//! Defines the binary structures used in iRacing's IBT file format.
//!
//! ## IBT File Structure
//!
//! 1. **Main Header** (offset 0, 112 bytes) - `irsdk_header` compatible structure
//! 2. **Disk Sub-Header** (offset 112, 32 bytes) - record count and session timing
//! 3. **Variable Headers** (at `varHeaderOffset`) - `numVars` descriptors of 144 bytes
//! 4. **Session Info** (at `sessionInfoOffset`) - YAML session text
//! 5. **Records** (at `varBuf[0].bufOffset`) - `sessionRecordCount` records of `bufLen` bytes
//!
//! All fields are little-endian. Parsing works on the in-memory capture buffer
//! and never reads past its end.

use crate::types::ChannelDescriptor;
use crate::{CaptureError, Result};
use tracing::{debug, trace, warn};

/// Offset of the disk sub-header, directly after `irsdk_header`.
pub const DISK_SUBHEADER_OFFSET: usize = 112;
/// Bytes that must be present before any header can be parsed.
pub const MIN_CAPTURE_SIZE: usize =
    DISK_SUBHEADER_OFFSET + IbtDiskSubHeader::DISK_HEADER_SIZE;
pub const IRSDK_VAR_HEADER_SIZE: usize = 144;
const IRSDK_VAR_NAME_SIZE: usize = 32;
const IRSDK_VAR_DESC_SIZE: usize = 64;
const IRSDK_VAR_UNIT_SIZE: usize = 32;

/// IBT main header (matches iRacing's irsdk_header; only `varBuf[0]` is used on disk)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbtHeader {
    pub version: i32,
    pub status: i32,
    pub tick_rate: i32,
    pub session_info_update: i32,
    pub session_info_len: i32,
    pub session_info_offset: i32,
    pub num_vars: i32,
    pub var_header_offset: i32,
    pub num_buf: i32,
    pub buf_len: i32,
    pub buf_tick_count: i32,
    pub buf_offset: i32,
}

/// IBT disk sub-header
/// struct irsdk_diskSubHeader {
///   time_t sessionStartDate;   // 8 bytes (i64)
///   double sessionStartTime;   // 8 bytes (f64)
///   double sessionEndTime;     // 8 bytes (f64)
///   int sessionLapCount;       // 4 bytes (i32)
///   int sessionRecordCount;    // 4 bytes (i32)
/// }
#[derive(Debug, Clone, PartialEq)]
pub struct IbtDiskSubHeader {
    pub start_date: i64,   // time_t (unix timestamp)
    pub start_time: f64,   // session start time in seconds
    pub end_time: f64,     // session end time in seconds
    pub lap_count: i32,    // number of laps completed
    pub record_count: i32, // number of telemetry records
}

fn require_min_size(data: &[u8]) -> Result<()> {
    if data.len() < MIN_CAPTURE_SIZE {
        return Err(CaptureError::Truncated { needed: MIN_CAPTURE_SIZE, actual: data.len() });
    }
    Ok(())
}

impl IbtHeader {
    /// Parse the main header at offset 0.
    pub fn parse(data: &[u8]) -> Result<Self> {
        require_min_size(data)?;

        // struct irsdk_header {
        //   int ver;                    // offset 0
        //   int status;                 // offset 4
        //   int tickRate;               // offset 8
        //   int sessionInfoUpdate;      // offset 12
        //   int sessionInfoLen;         // offset 16
        //   int sessionInfoOffset;      // offset 20
        //   int numVars;                // offset 24
        //   int varHeaderOffset;        // offset 28
        //   int numBuf;                 // offset 32
        //   int bufLen;                 // offset 36
        //   int pad1[2];                // offset 40
        //   irsdk_varBuf varBuf[4];     // offset 48, {tickCount, bufOffset, pad[2]}
        // }
        let header = Self {
            version: parse_i32_le(data, 0)?,
            status: parse_i32_le(data, 4)?,
            tick_rate: parse_i32_le(data, 8)?,
            session_info_update: parse_i32_le(data, 12)?,
            session_info_len: parse_i32_le(data, 16)?,
            session_info_offset: parse_i32_le(data, 20)?,
            num_vars: parse_i32_le(data, 24)?,
            var_header_offset: parse_i32_le(data, 28)?,
            num_buf: parse_i32_le(data, 32)?,
            buf_len: parse_i32_le(data, 36)?,
            buf_tick_count: parse_i32_le(data, 48)?,
            buf_offset: parse_i32_le(data, 52)?,
        };

        debug!(
            version = header.version,
            tick_rate = header.tick_rate,
            num_vars = header.num_vars,
            buf_len = header.buf_len,
            buf_offset = header.buf_offset,
            "Parsed IBT header"
        );

        Ok(header)
    }

    /// Reject headers whose layout fields cannot describe a real capture.
    pub fn validate(&self) -> Result<()> {
        if self.version != 2 {
            warn!(version = self.version, "Unexpected IBT header version, decoding anyway");
        }

        let layout_fields = [
            ("Number of variables", self.num_vars),
            ("Variable header offset", self.var_header_offset),
            ("Buffer length", self.buf_len),
            ("Buffer offset", self.buf_offset),
            ("Session info offset", self.session_info_offset),
            ("Session info length", self.session_info_len),
        ];
        for (field, value) in layout_fields {
            if value < 0 {
                return Err(CaptureError::parse(
                    "Header validation",
                    format!("{} cannot be negative (found {})", field, value),
                ));
            }
        }

        if self.buf_len > 100_000_000 {
            return Err(CaptureError::parse(
                "Header validation",
                "Buffer length is unreasonably large",
            ));
        }

        if self.num_vars > 10_000 {
            return Err(CaptureError::parse(
                "Header validation",
                "Number of variables is unreasonably large",
            ));
        }

        Ok(())
    }

    /// Channel count as usize. Only meaningful after [`IbtHeader::validate`].
    pub fn channel_count(&self) -> usize {
        self.num_vars.max(0) as usize
    }

    /// Tick stride in bytes.
    pub fn stride(&self) -> usize {
        self.buf_len.max(0) as usize
    }

    /// Start of the record array.
    pub fn records_offset(&self) -> usize {
        self.buf_offset.max(0) as usize
    }
}

impl IbtDiskSubHeader {
    /// Size of the disk sub-header structure in bytes
    pub const DISK_HEADER_SIZE: usize = 32;

    /// Parse the disk sub-header at offset 112.
    pub fn parse(data: &[u8]) -> Result<Self> {
        require_min_size(data)?;
        let base = DISK_SUBHEADER_OFFSET;

        Ok(Self {
            start_date: parse_i64_le(data, base)?,
            start_time: parse_f64_le(data, base + 8)?,
            end_time: parse_f64_le(data, base + 16)?,
            lap_count: parse_i32_le(data, base + 24)?,
            record_count: parse_i32_le(data, base + 28)?,
        })
    }

    /// Recorded ticks; a negative count reads as empty.
    pub fn tick_count(&self) -> usize {
        self.record_count.max(0) as usize
    }
}

/// Parse the `index`-th channel descriptor of the array described by `header`.
pub fn parse_channel_descriptor(
    data: &[u8],
    header: &IbtHeader,
    index: usize,
) -> Result<ChannelDescriptor> {
    let start = index
        .checked_mul(IRSDK_VAR_HEADER_SIZE)
        .and_then(|rel| rel.checked_add(header.var_header_offset.max(0) as usize))
        .ok_or_else(|| {
            CaptureError::parse(
                "Variable header location",
                format!("Descriptor {} offset overflowed", index),
            )
        })?;
    let bytes = start
        .checked_add(IRSDK_VAR_HEADER_SIZE)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| {
            CaptureError::parse(
                format!("Variable header {} reading", index),
                format!(
                    "Descriptor at offset {} extends beyond capture of {} bytes",
                    start,
                    data.len()
                ),
            )
        })?;

    // struct irsdk_varHeader {
    //   int type;            // offset 0
    //   int offset;          // offset 4
    //   int count;           // offset 8
    //   bool countAsTime;    // offset 12, then pad[3]
    //   char name[32];       // offset 16
    //   char desc[64];       // offset 48
    //   char unit[32];       // offset 112
    // }
    let type_tag = parse_i32_le(bytes, 0)?;
    let offset = parse_i32_le(bytes, 4)?;
    let count = parse_i32_le(bytes, 8)?;
    let count_as_time = bytes[12] != 0;
    let name = extract_latin1_string(&bytes[16..16 + IRSDK_VAR_NAME_SIZE]);
    let description = extract_latin1_string(&bytes[48..48 + IRSDK_VAR_DESC_SIZE]);
    let units = extract_latin1_string(&bytes[112..112 + IRSDK_VAR_UNIT_SIZE]);

    trace!(index, name = %name, type_tag, offset, count, "Parsed channel descriptor");

    if offset < 0 || count < 0 {
        return Err(CaptureError::schema_corruption(
            name,
            format!("negative offset {} or count {}", offset, count),
        ));
    }

    Ok(ChannelDescriptor {
        name,
        type_tag,
        offset: offset as usize,
        count: count as usize,
        count_as_time,
        units,
        description,
    })
}

/// Verify that the capture is long enough to hold every record the headers declare.
///
/// This is a lower bound; it does not validate exact layout.
pub fn verify_min_length(
    data_len: usize,
    header: &IbtHeader,
    disk: &IbtDiskSubHeader,
) -> Result<()> {
    let records_len = (disk.tick_count() as u64).saturating_mul(header.stride() as u64);
    let min_end = (header.records_offset() as u64).saturating_add(records_len);

    if (data_len as u64) < min_end {
        return Err(CaptureError::parse(
            "IBT length verification",
            format!(
                "File too small: len={} < required_min={} (records={}, buf_len={}, buf_offset={})",
                data_len, min_end, disk.record_count, header.buf_len, header.buf_offset
            ),
        ));
    }
    Ok(())
}

fn le_bytes<const N: usize>(data: &[u8], offset: usize, what: &str) -> Result<[u8; N]> {
    offset
        .checked_add(N)
        .and_then(|end| data.get(offset..end))
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| {
            CaptureError::parse(
                format!("{} parsing", what),
                format!(
                    "Insufficient data at offset {} (need {} bytes, have {})",
                    offset,
                    N,
                    data.len().saturating_sub(offset)
                ),
            )
        })
}

fn parse_i32_le(data: &[u8], offset: usize) -> Result<i32> {
    le_bytes(data, offset, "Integer").map(i32::from_le_bytes)
}

fn parse_i64_le(data: &[u8], offset: usize) -> Result<i64> {
    le_bytes(data, offset, "Long integer").map(i64::from_le_bytes)
}

fn parse_f64_le(data: &[u8], offset: usize) -> Result<f64> {
    le_bytes(data, offset, "Double precision float").map(f64::from_le_bytes)
}

/// Extract a NUL-terminated Latin-1 string from a fixed-width field.
pub(crate) fn extract_latin1_string(bytes: &[u8]) -> String {
    let null_pos = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    bytes[..null_pos].iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CaptureBuilder, ChannelSpec};
    use crate::types::VariableType;
    use anyhow::{Result, ensure};

    fn sample_capture() -> Vec<u8> {
        CaptureBuilder::new()
            .tick_rate(60)
            .channel(ChannelSpec::scalar("SessionTime", VariableType::Float64).units("s"))
            .channel(ChannelSpec::vector("CarIdxLap", VariableType::Int32, 4))
            .record_count(5)
            .session_info("WeekendInfo:\n TrackName: roadatlanta club\n")
            .disk_times(1_757_730_000, 12.5, 95.25)
            .lap_count(3)
            .build()
    }

    #[test]
    fn parses_main_header_fields() -> Result<()> {
        let data = sample_capture();
        let header = IbtHeader::parse(&data)?;

        assert_eq!(header.version, 2);
        assert_eq!(header.tick_rate, 60);
        assert_eq!(header.num_vars, 2);
        assert_eq!(header.var_header_offset, 144);
        assert_eq!(header.num_buf, 1);
        assert_eq!(header.buf_len, 24);
        ensure!(header.buf_offset as usize >= 144 + 2 * IRSDK_VAR_HEADER_SIZE);
        header.validate()?;
        Ok(())
    }

    #[test]
    fn parses_disk_sub_header_at_112() -> Result<()> {
        let data = sample_capture();
        let disk = IbtDiskSubHeader::parse(&data)?;

        assert_eq!(disk.start_date, 1_757_730_000);
        assert_eq!(disk.start_time, 12.5);
        assert_eq!(disk.end_time, 95.25);
        assert_eq!(disk.lap_count, 3);
        assert_eq!(disk.record_count, 5);
        assert_eq!(disk.tick_count(), 5);
        Ok(())
    }

    #[test]
    fn parses_descriptors_in_order() -> Result<()> {
        let data = sample_capture();
        let header = IbtHeader::parse(&data)?;

        let first = parse_channel_descriptor(&data, &header, 0)?;
        assert_eq!(first.name, "SessionTime");
        assert_eq!(first.data_type()?, VariableType::Float64);
        assert_eq!(first.offset, 0);
        assert_eq!(first.count, 1);
        assert_eq!(first.units, "s");

        let second = parse_channel_descriptor(&data, &header, 1)?;
        assert_eq!(second.name, "CarIdxLap");
        assert_eq!(second.offset, 8);
        assert_eq!(second.count, 4);
        Ok(())
    }

    #[test]
    fn descriptor_past_end_is_parse_error() -> Result<()> {
        let data = sample_capture();
        let mut header = IbtHeader::parse(&data)?;
        header.var_header_offset = (data.len() - 10) as i32;

        let err = parse_channel_descriptor(&data, &header, 0).unwrap_err();
        ensure!(matches!(err, CaptureError::Parse { .. }), "unexpected error {:?}", err);
        Ok(())
    }

    #[test]
    fn test_truncated_file_handling() {
        assert_eq!(MIN_CAPTURE_SIZE, 144);
        let truncated_data = vec![0u8; 10];
        match IbtHeader::parse(&truncated_data).unwrap_err() {
            CaptureError::Truncated { needed, actual } => {
                assert_eq!(needed, MIN_CAPTURE_SIZE);
                assert_eq!(actual, 10);
            }
            other => panic!("Expected Truncated error, got {:?}", other),
        }
        assert!(IbtDiskSubHeader::parse(&vec![0u8; 143]).is_err());
    }

    #[test]
    fn negative_layout_fields_fail_validation() -> Result<()> {
        let mut data = sample_capture();
        data[36..40].copy_from_slice(&(-16i32).to_le_bytes());

        let header = IbtHeader::parse(&data)?;
        let err = header.validate().unwrap_err();
        ensure!(err.to_string().contains("Buffer length"), "unexpected error {}", err);
        Ok(())
    }

    #[test]
    fn other_versions_are_accepted() -> Result<()> {
        let mut data = sample_capture();
        data[0..4].copy_from_slice(&999i32.to_le_bytes());

        let header = IbtHeader::parse(&data)?;
        assert_eq!(header.version, 999);
        header.validate()?;
        Ok(())
    }

    #[test]
    fn test_disk_length_verification() -> Result<()> {
        let data = sample_capture();
        let header = IbtHeader::parse(&data)?;
        let disk = IbtDiskSubHeader::parse(&data)?;

        verify_min_length(data.len(), &header, &disk)?;
        ensure!(verify_min_length(data.len() - 1, &header, &disk).is_err());
        Ok(())
    }

    #[test]
    fn latin1_strings_stop_at_nul() {
        assert_eq!(extract_latin1_string(b"RPM\0junk"), "RPM");
        assert_eq!(extract_latin1_string(&[0x4Du8, 0xFC, 0x6C]), "M\u{fc}l");
        assert_eq!(extract_latin1_string(b"\0"), "");
    }
}
