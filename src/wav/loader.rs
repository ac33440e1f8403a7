// WAV file loading
// One-shot read into a shared buffer; the data chunk is a range into it

use std::fs;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use super::header::WavHeader;
use crate::error::LoadError;

/// A WAV file held in memory
#[derive(Debug, Clone)]
pub struct WavFile {
    bytes: Arc<[u8]>,
    header: WavHeader,
    data: Range<usize>,
}

impl WavFile {
    /// Read a WAV file from disk
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let bytes = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Self::from_bytes(bytes)
    }

    /// Parse an in-memory file image
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self, LoadError> {
        let bytes: Arc<[u8]> = bytes.into();
        let header = WavHeader::parse(&bytes)?;

        let start = header.data_offset();
        let available = bytes.len() - start;
        let declared = header.data_size as usize;
        if declared > available {
            warn!(
                "Data chunk declares {} bytes but only {} are present, truncating",
                declared, available
            );
        }
        let data = start..start + declared.min(available);

        Ok(Self {
            bytes,
            header,
            data,
        })
    }

    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    /// Shared view of the sample bytes
    pub fn samples(&self) -> SampleView {
        SampleView {
            bytes: Arc::clone(&self.bytes),
            range: self.data.clone(),
        }
    }

    /// Number of sample bytes actually available
    pub fn data_len(&self) -> usize {
        self.data.len()
    }
}

/// Read-only view of interleaved PCM bytes inside a shared file image
#[derive(Debug, Clone)]
pub struct SampleView {
    bytes: Arc<[u8]>,
    range: Range<usize>,
}

impl SampleView {
    /// Wrap a standalone sample buffer
    pub fn new(samples: impl Into<Arc<[u8]>>) -> Self {
        let bytes: Arc<[u8]> = samples.into();
        let range = 0..bytes.len();
        Self { bytes, range }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::canonical_wav;
    use crate::wav::header::FORMAT_PCM;

    #[test]
    fn test_samples_view_data_chunk() {
        let data: Vec<u8> = (0..64).collect();
        let wav = WavFile::from_bytes(canonical_wav(FORMAT_PCM, 2, 44100, 16, &data)).unwrap();
        assert_eq!(wav.data_len(), 64);
        assert_eq!(wav.samples().as_slice(), &data[..]);
    }

    #[test]
    fn test_views_share_buffer() {
        let wav = WavFile::from_bytes(canonical_wav(FORMAT_PCM, 1, 8000, 8, &[7u8; 10])).unwrap();
        let a = wav.samples();
        let b = wav.samples();
        assert_eq!(a.as_slice().as_ptr(), b.as_slice().as_ptr());
    }

    #[test]
    fn test_oversized_data_size_is_clamped() {
        let mut bytes = canonical_wav(FORMAT_PCM, 1, 8000, 8, &[1u8; 10]);
        bytes[40..44].copy_from_slice(&1000u32.to_le_bytes());
        let wav = WavFile::from_bytes(bytes).unwrap();
        assert_eq!(wav.header().data_size, 1000);
        assert_eq!(wav.data_len(), 10);
    }

    #[test]
    fn test_trailing_chunks_are_excluded() {
        let mut bytes = canonical_wav(FORMAT_PCM, 1, 8000, 8, &[2u8; 8]);
        bytes.extend_from_slice(b"LIST\x04\x00\x00\x00abcd");
        let wav = WavFile::from_bytes(bytes).unwrap();
        assert_eq!(wav.samples().as_slice(), &[2u8; 8]);
    }

    #[test]
    fn test_open_hound_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..100i16 {
            writer.write_sample(i).unwrap();
            writer.write_sample(-i).unwrap();
        }
        writer.finalize().unwrap();

        let wav = WavFile::open(&path).unwrap();
        assert_eq!(wav.header().channels, 2);
        assert_eq!(wav.header().sample_rate, 22050);
        assert_eq!(wav.header().bits_per_sample, 16);
        assert_eq!(wav.data_len(), 400);
        assert_eq!(&wav.samples().as_slice()[4..8], &[1, 0, 0xFF, 0xFF]);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = WavFile::open(&dir.path().join("absent.wav")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
