// WAV header field extraction
// Fixed-offset reads from the canonical header plus a scan for the data chunk

use crate::error::LoadError;

/// Bytes needed to read every fixed-offset field
pub const FIXED_HEADER_LEN: usize = 36;

/// Tag that opens the sample data subchunk
pub const DATA_TAG: &[u8; 4] = b"data";

/// WAVE format tag for integer PCM
pub const FORMAT_PCM: u16 = 1;

/// WAVE format tag for IEEE float samples
pub const FORMAT_IEEE_FLOAT: u16 = 3;

/// Header scalars of a WAV file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// RIFF chunk size as declared at offset 4
    pub file_size: u32,
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    /// Block align: bytes per frame across all channels
    pub sample_size: u16,
    pub bits_per_sample: u16,
    /// Byte offset of the `data` tag
    pub data_tag_offset: usize,
    /// Data length as declared after the `data` tag
    pub data_size: u32,
}

impl WavHeader {
    /// Parse the header fields from a full file image
    pub fn parse(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.len() < FIXED_HEADER_LEN {
            return Err(LoadError::TruncatedHeader {
                needed: FIXED_HEADER_LEN,
                len: bytes.len(),
            });
        }

        let data_tag_offset = find_data_chunk(bytes).ok_or(LoadError::MissingDataChunk)?;
        let data_size = read_u32(bytes, data_tag_offset + 4).ok_or(LoadError::TruncatedDataChunk {
            offset: data_tag_offset,
        })?;

        Ok(Self {
            file_size: le_u32(bytes, 4),
            format_tag: le_u16(bytes, 20),
            channels: le_u16(bytes, 22),
            sample_rate: le_u32(bytes, 24),
            byte_rate: le_u32(bytes, 28),
            sample_size: le_u16(bytes, 32),
            bits_per_sample: le_u16(bytes, 34),
            data_tag_offset,
            data_size,
        })
    }

    /// Offset of the first sample byte
    pub fn data_offset(&self) -> usize {
        self.data_tag_offset + 8
    }

    /// Declared file size in megabytes
    pub fn file_size_mb(&self) -> f64 {
        self.file_size as f64 / 1_048_576.0
    }

    /// Playback length implied by the data size and byte rate
    pub fn duration_secs(&self) -> Option<f64> {
        (self.byte_rate > 0).then(|| self.data_size as f64 / self.byte_rate as f64)
    }
}

/// Locate the `data` tag by scanning from the start of the file.
///
/// A match at byte 0 is reported as not found; a well-formed RIFF file
/// always starts with `RIFF`, so only garbage input can hit this.
pub fn find_data_chunk(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(DATA_TAG.len())
        .position(|window| window == DATA_TAG)
        .filter(|&offset| offset != 0)
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn le_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn le_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}
