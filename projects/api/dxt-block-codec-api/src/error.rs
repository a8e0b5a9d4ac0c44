//! Error types for the texture-level drivers.
//!
//! Every failure mode is a caller-argument violation reported at the API
//! boundary; the block codecs themselves never fail.

use dxt_block_codec_bc1::LevelOutOfRangeError;
use dxt_block_codec_bc4::ChannelOutOfRangeError;
use thiserror::Error;

/// Errors reported by the texture encode/decode drivers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TextureError {
    /// The image has a zero dimension.
    #[error("image dimensions must be nonzero, got {width}x{height}")]
    EmptyImage {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },

    /// An image dimension is not a multiple of the 4-pixel block size.
    #[error("image dimension {value} is not a multiple of the block size (4 pixels)")]
    MisalignedDimension {
        /// The offending dimension in pixels
        value: u32,
    },

    /// The RGBA pixel buffer does not match the declared image dimensions.
    #[error("pixel buffer holds {actual} bytes, but a {width}x{height} RGBA image needs {expected}")]
    PixelBufferSizeMismatch {
        /// Required size in bytes
        expected: usize,
        /// Provided size in bytes
        actual: usize,
        /// Declared width in pixels
        width: u32,
        /// Declared height in pixels
        height: u32,
    },

    /// The encoded block buffer does not match the declared image dimensions.
    #[error("encoded buffer holds {actual} bytes, but {expected} are required")]
    BlockBufferSizeMismatch {
        /// Required size in bytes
        expected: usize,
        /// Provided size in bytes
        actual: usize,
    },

    /// The BC1 quality level is out of range.
    #[error(transparent)]
    LevelOutOfRange(#[from] LevelOutOfRangeError),

    /// A BC4/BC5 source channel is out of range.
    #[error(transparent)]
    ChannelOutOfRange(#[from] ChannelOutOfRangeError),
}

pub(crate) fn validate_dimensions(width: u32, height: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::EmptyImage { width, height });
    }
    for value in [width, height] {
        if value % 4 != 0 {
            return Err(TextureError::MisalignedDimension { value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_validation() {
        assert_eq!(
            validate_dimensions(0, 4),
            Err(TextureError::EmptyImage { width: 0, height: 4 })
        );
        assert_eq!(
            validate_dimensions(4, 0),
            Err(TextureError::EmptyImage { width: 4, height: 0 })
        );
        assert_eq!(
            validate_dimensions(6, 4),
            Err(TextureError::MisalignedDimension { value: 6 })
        );
        assert_eq!(
            validate_dimensions(8, 10),
            Err(TextureError::MisalignedDimension { value: 10 })
        );
        assert_eq!(validate_dimensions(8, 12), Ok(()));
    }
}
