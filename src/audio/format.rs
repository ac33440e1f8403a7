// Sample format resolution
// Maps WAV format tag and bit depth onto the formats the output stream accepts

use std::fmt;

use crate::error::PlaybackError;
use crate::wav::header::FORMAT_IEEE_FLOAT;

/// Sample encoding handed to the output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 8-bit PCM, unsigned
    U8,
    I16,
    I32,
    /// 32-bit IEEE float (format tag 3)
    F32,
    /// 64-bit IEEE float (format tag 3)
    F64,
}

impl SampleFormat {
    /// Pick the stream format for a WAV file.
    ///
    /// Integer PCM is chosen from the bit depth alone; 8-bit WAV data is
    /// unsigned. Float data (32 or 64 bit) is only recognised for format tag 3.
    pub fn resolve(format_tag: u16, bits_per_sample: u16) -> Result<Self, PlaybackError> {
        match (format_tag, bits_per_sample) {
            (FORMAT_IEEE_FLOAT, 32) => Ok(SampleFormat::F32),
            (FORMAT_IEEE_FLOAT, 64) => Ok(SampleFormat::F64),
            (FORMAT_IEEE_FLOAT, bits) => Err(PlaybackError::UnsupportedFormat { format_tag, bits }),
            (_, 8) => Ok(SampleFormat::U8),
            (_, 16) => Ok(SampleFormat::I16),
            (_, 32) => Ok(SampleFormat::I32),
            (_, bits) => Err(PlaybackError::UnsupportedFormat { format_tag, bits }),
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::I16 => 2,
            SampleFormat::I32 | SampleFormat::F32 => 4,
            SampleFormat::F64 => 8,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleFormat::U8 => "u8",
            SampleFormat::I16 => "i16",
            SampleFormat::I32 => "i32",
            SampleFormat::F32 => "f32",
            SampleFormat::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// Sample types whose in-memory layout matches little-endian WAV data
/// once passed through `from_le`
pub trait LeSample: bytemuck::Pod {
    fn from_le(self) -> Self;
}

impl LeSample for u8 {
    #[inline]
    fn from_le(self) -> Self {
        self
    }
}

impl LeSample for i16 {
    #[inline]
    fn from_le(self) -> Self {
        i16::from_le(self)
    }
}

impl LeSample for i32 {
    #[inline]
    fn from_le(self) -> Self {
        i32::from_le(self)
    }
}

impl LeSample for f32 {
    #[inline]
    fn from_le(self) -> Self {
        f32::from_bits(u32::from_le(self.to_bits()))
    }
}

impl LeSample for f64 {
    #[inline]
    fn from_le(self) -> Self {
        f64::from_bits(u64::from_le(self.to_bits()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::header::FORMAT_PCM;

    #[test]
    fn test_resolve_pcm_depths() {
        assert_eq!(SampleFormat::resolve(FORMAT_PCM, 8).unwrap(), SampleFormat::U8);
        assert_eq!(SampleFormat::resolve(FORMAT_PCM, 16).unwrap(), SampleFormat::I16);
        assert_eq!(SampleFormat::resolve(FORMAT_PCM, 32).unwrap(), SampleFormat::I32);
    }

    #[test]
    fn test_resolve_unsupported_depth() {
        for bits in [0, 4, 12, 24, 64] {
            assert!(matches!(
                SampleFormat::resolve(FORMAT_PCM, bits),
                Err(PlaybackError::UnsupportedFormat { bits: b, .. }) if b == bits
            ));
        }
    }

    #[test]
    fn test_resolve_float() {
        assert_eq!(
            SampleFormat::resolve(FORMAT_IEEE_FLOAT, 32).unwrap(),
            SampleFormat::F32
        );
        assert_eq!(
            SampleFormat::resolve(FORMAT_IEEE_FLOAT, 64).unwrap(),
            SampleFormat::F64
        );
        assert!(matches!(
            SampleFormat::resolve(FORMAT_IEEE_FLOAT, 16),
            Err(PlaybackError::UnsupportedFormat { format_tag: 3, bits: 16 })
        ));
    }

    #[test]
    fn test_pcm_64_bit_is_not_float() {
        assert!(SampleFormat::resolve(FORMAT_PCM, 64).is_err());
    }

    #[test]
    fn test_unknown_tag_uses_bit_depth() {
        // WAVE_FORMAT_EXTENSIBLE
        assert_eq!(SampleFormat::resolve(0xFFFE, 16).unwrap(), SampleFormat::I16);
    }

    #[test]
    fn test_bytes_per_sample() {
        assert_eq!(SampleFormat::U8.bytes_per_sample(), 1);
        assert_eq!(SampleFormat::I16.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::I32.bytes_per_sample(), 4);
        assert_eq!(SampleFormat::F32.bytes_per_sample(), 4);
        assert_eq!(SampleFormat::F64.bytes_per_sample(), 8);
    }
}
