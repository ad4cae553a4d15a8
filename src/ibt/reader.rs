//! IBT capture reader
//!
//! [`IbtReader`] is a handle that is either closed or holds one open capture.
//! Opening loads the file and parses both headers; the channel directory is
//! only built the first time a channel is asked for by name.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use pitwall_ibt::{ChannelValue, IbtReader};
//!
//! fn dump_speed() -> pitwall_ibt::Result<()> {
//!     let mut reader = IbtReader::new();
//!     reader.open("telemetry.ibt")?;
//!
//!     println!("{} ticks at {} Hz", reader.tick_count()?, reader.tick_rate()?);
//!     for (tick, value) in reader.read_all("Speed")?.iter().enumerate() {
//!         if let ChannelValue::Scalar(speed) = value {
//!             println!("{tick}: {:?}", speed.as_f64());
//!         }
//!     }
//!
//!     let gears: Vec<i32> = reader.read_column("Gear")?;
//!     println!("Top gear: {:?}", gears.iter().max());
//!
//!     reader.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Performance Notes
//!
//! - The file is loaded (or mapped) once at open time; reads never touch disk
//! - Channel lookup is a hash lookup after the first name-based access
//! - Values are decoded in place from the record array, never copied per tick

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::buffer::CaptureBuffer;
use super::directory::{ChannelDirectory, DirectoryState, DuplicatePolicy};
use super::format::{IbtDiskSubHeader, IbtHeader, verify_min_length};
use super::options::OpenOptions;
use super::records::RecordStore;
use crate::types::{ChannelDescriptor, ChannelValue, VarData};
use crate::{CaptureError, Result, yaml_utils};

/// Recording frequency assumed when the header carries none.
const FALLBACK_TICK_RATE: f64 = 60.0;

/// Everything that exists only while a capture is open.
#[derive(Debug)]
struct Capture {
    path: PathBuf,
    buffer: CaptureBuffer,
    header: IbtHeader,
    disk_header: IbtDiskSubHeader,
    directory: DirectoryState,
    duplicates: DuplicatePolicy,
}

impl Capture {
    fn load(path: PathBuf, buffer: CaptureBuffer, options: &OpenOptions) -> Result<Self> {
        let header = IbtHeader::parse(&buffer)?;
        header.validate()?;
        let disk_header = IbtDiskSubHeader::parse(&buffer)?;

        if let Err(e) = verify_min_length(buffer.len(), &header, &disk_header) {
            warn!(path = %path.display(), error = %e, "Capture shorter than its declared records");
        }

        Ok(Self {
            path,
            buffer,
            header,
            disk_header,
            directory: DirectoryState::NotBuilt,
            duplicates: options.duplicate_policy(),
        })
    }

    fn records(&self) -> RecordStore<'_> {
        RecordStore::new(&self.buffer, &self.header, &self.disk_header)
    }

    fn directory(&mut self) -> Result<&ChannelDirectory> {
        self.directory.get_or_build(&self.buffer, &self.header, self.duplicates)
    }

    /// Resolve `name` and hand back the record store alongside its descriptor.
    fn resolve(&mut self, name: &str) -> Result<(RecordStore<'_>, &ChannelDescriptor)> {
        let Capture { buffer, header, disk_header, directory, duplicates, .. } = self;
        let (buffer, header, disk_header): (&CaptureBuffer, &IbtHeader, &IbtDiskSubHeader) =
            (buffer, header, disk_header);

        let channel = directory
            .get_or_build(buffer, header, *duplicates)?
            .get(name)
            .ok_or_else(|| CaptureError::unknown_channel(name))?;

        Ok((RecordStore::new(buffer, header, disk_header), channel))
    }
}

/// Random-access reader for one IBT capture at a time.
#[derive(Debug, Default)]
pub struct IbtReader {
    capture: Option<Capture>,
}

impl IbtReader {
    /// A closed reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a capture from an in-memory buffer.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut reader = Self::new();
        reader.open_bytes(data)?;
        Ok(reader)
    }

    /// Open `path` with default options.
    ///
    /// Any capture that was already open is closed first, so a failed open
    /// leaves the reader closed.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.open_with(path, &OpenOptions::default())
    }

    /// Open `path` with explicit options.
    pub fn open_with<P: AsRef<Path>>(&mut self, path: P, options: &OpenOptions) -> Result<()> {
        self.close();

        let path = path.as_ref();
        let buffer = Self::load_buffer(path, options)?;
        self.install(Capture::load(path.to_path_buf(), buffer, options)?);
        Ok(())
    }

    /// Open a capture held in memory, replacing any open one.
    pub fn open_bytes(&mut self, data: Vec<u8>) -> Result<()> {
        self.open_bytes_with(data, &OpenOptions::default())
    }

    /// Open a capture held in memory with explicit options.
    ///
    /// The memory-map option has no effect here.
    pub fn open_bytes_with(&mut self, data: Vec<u8>, options: &OpenOptions) -> Result<()> {
        self.close();
        self.install(Capture::load(PathBuf::from("<memory>"), data.into(), options)?);
        Ok(())
    }

    #[cfg(feature = "mmap")]
    fn load_buffer(path: &Path, options: &OpenOptions) -> Result<CaptureBuffer> {
        if options.wants_memory_map() {
            CaptureBuffer::map(path)
        } else {
            CaptureBuffer::read(path)
        }
    }

    #[cfg(not(feature = "mmap"))]
    fn load_buffer(path: &Path, options: &OpenOptions) -> Result<CaptureBuffer> {
        if options.wants_memory_map() {
            tracing::debug!("Memory mapping requested without the `mmap` feature, reading instead");
        }
        CaptureBuffer::read(path)
    }

    fn install(&mut self, capture: Capture) {
        info!(
            path = %capture.path.display(),
            channels = capture.header.channel_count(),
            ticks = capture.disk_header.tick_count(),
            mapped = capture.buffer.is_mapped(),
            "Opened IBT capture"
        );
        self.capture = Some(capture);
    }

    /// Release the open capture. Closing a closed reader does nothing.
    pub fn close(&mut self) {
        if let Some(capture) = self.capture.take() {
            info!(path = %capture.path.display(), "Closed IBT capture");
        }
    }

    pub fn is_open(&self) -> bool {
        self.capture.is_some()
    }

    fn capture(&self) -> Result<&Capture> {
        self.capture.as_ref().ok_or(CaptureError::NotOpen)
    }

    fn capture_mut(&mut self) -> Result<&mut Capture> {
        self.capture.as_mut().ok_or(CaptureError::NotOpen)
    }

    /// Decode one channel at one tick.
    ///
    /// Scalar channels come back as [`ChannelValue::Scalar`], array channels as
    /// [`ChannelValue::Vector`] in storage order.
    pub fn read_one(&mut self, tick: usize, name: &str) -> Result<ChannelValue> {
        let (records, channel) = self.capture_mut()?.resolve(name)?;
        records.decode(channel, tick)
    }

    /// Decode one channel at every tick, in tick order.
    pub fn read_all(&mut self, name: &str) -> Result<Vec<ChannelValue>> {
        let (records, channel) = self.capture_mut()?.resolve(name)?;
        (0..records.tick_count()).map(|tick| records.decode(channel, tick)).collect()
    }

    /// Decode a scalar channel at every tick as `T`.
    ///
    /// Array channels are rejected; use [`IbtReader::read_all`] for those.
    pub fn read_column<T: VarData>(&mut self, name: &str) -> Result<Vec<T>> {
        let (records, channel) = self.capture_mut()?.resolve(name)?;
        if !channel.is_scalar() {
            return Err(CaptureError::TypeConversion {
                details: format!(
                    "channel {} has {} elements, a typed column needs a scalar",
                    channel.name, channel.count
                ),
            });
        }
        (0..records.tick_count()).map(|tick| records.decode_as(channel, tick)).collect()
    }

    /// Raw bytes of one tick record.
    pub fn read_record(&self, tick: usize) -> Result<&[u8]> {
        self.capture()?.records().record(tick)
    }

    /// Name of every descriptor in scan order, one per `numVars`.
    ///
    /// A name shared by several descriptors appears once per descriptor;
    /// lookups by that name resolve to the last one.
    pub fn channel_names(&mut self) -> Result<&[String]> {
        Ok(self.capture_mut()?.directory()?.names())
    }

    /// Descriptor for `name`.
    pub fn channel(&mut self, name: &str) -> Result<&ChannelDescriptor> {
        let (_, channel) = self.capture_mut()?.resolve(name)?;
        Ok(channel)
    }

    pub fn has_channel(&mut self, name: &str) -> Result<bool> {
        Ok(self.capture_mut()?.directory()?.contains(name))
    }

    /// Every descriptor in scan order, shadowed duplicates included.
    pub fn channels(&mut self) -> Result<Vec<&ChannelDescriptor>> {
        Ok(self.capture_mut()?.directory()?.iter().collect())
    }

    /// Number of recorded ticks.
    pub fn tick_count(&self) -> Result<usize> {
        Ok(self.capture()?.disk_header.tick_count())
    }

    /// Recording frequency in Hz, or 60 when the header carries none.
    pub fn tick_rate(&self) -> Result<f64> {
        let tick_rate = self.capture()?.header.tick_rate;
        Ok(if tick_rate > 0 { tick_rate as f64 } else { FALLBACK_TICK_RATE })
    }

    /// Recorded duration in seconds.
    pub fn duration_secs(&self) -> Result<f64> {
        Ok(self.tick_count()? as f64 / self.tick_rate()?)
    }

    pub fn header(&self) -> Result<&IbtHeader> {
        Ok(&self.capture()?.header)
    }

    pub fn disk_header(&self) -> Result<&IbtDiskSubHeader> {
        Ok(&self.capture()?.disk_header)
    }

    /// Path the open capture was loaded from, `<memory>` for in-memory captures.
    pub fn path(&self) -> Option<&Path> {
        self.capture.as_ref().map(|capture| capture.path.as_path())
    }

    pub fn is_memory_mapped(&self) -> bool {
        self.capture.as_ref().is_some_and(|capture| capture.buffer.is_mapped())
    }

    /// Cleaned session info YAML.
    ///
    /// Extracted on demand; nothing is cached. Returns `None` when the capture
    /// has no session block or the block is blank.
    pub fn session_info_yaml(&self) -> Result<Option<String>> {
        let capture = self.capture()?;
        let raw = yaml_utils::extract_session_text(
            &capture.buffer,
            capture.header.session_info_offset,
            capture.header.session_info_len,
        )?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        let text = yaml_utils::strip_control_characters(&raw);
        if text.trim().is_empty() {
            return Ok(None);
        }
        yaml_utils::preprocess_session_yaml(&text).map(Some)
    }

    /// Session info parsed into a generic YAML document.
    pub fn session_info_document(&self) -> Result<Option<serde_yaml_ng::Value>> {
        self.session_info_yaml()?
            .map(|yaml| yaml_utils::parse_session_document(&yaml))
            .transpose()
    }
}
