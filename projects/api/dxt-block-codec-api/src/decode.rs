//! Texture decoding drivers.
//!
//! Decoding is cheap table lookups, so the drivers stay serial; blocks are
//! read in row-major order and scattered into the output image.

use dxt_block_codec_bc1::{Bc1Decoder, Interpolation};
use dxt_block_codec_bc3::Bc3Decoder;
use dxt_block_codec_bc4::Bc4Decoder;
use dxt_block_codec_bc5::Bc5Decoder;
use dxt_block_codec_common::color_block::ColorBlock;

use crate::error::{validate_dimensions, TextureError};
use crate::tiles::scatter_block;

/// A block-format decoder usable by [`decode_texture`].
pub trait BlockDecoder: Sync {
    /// Encoded size of one block in bytes.
    const BLOCK_SIZE: usize;

    /// Decodes one block from `bytes` (exactly
    /// [`BLOCK_SIZE`](BlockDecoder::BLOCK_SIZE) bytes) into `output`.
    fn decode_block_from(&self, bytes: &[u8], output: &mut ColorBlock);
}

impl BlockDecoder for Bc1Decoder {
    const BLOCK_SIZE: usize = dxt_block_codec_bc1::Bc1Block::SIZE;

    fn decode_block_from(&self, bytes: &[u8], output: &mut ColorBlock) {
        let mut raw = [0u8; Self::BLOCK_SIZE];
        raw.copy_from_slice(bytes);
        self.decode_block_into(output, &dxt_block_codec_bc1::Bc1Block::from_bytes(raw), true);
    }
}

impl BlockDecoder for Bc3Decoder {
    const BLOCK_SIZE: usize = dxt_block_codec_bc3::Bc3Block::SIZE;

    fn decode_block_from(&self, bytes: &[u8], output: &mut ColorBlock) {
        let mut raw = [0u8; Self::BLOCK_SIZE];
        raw.copy_from_slice(bytes);
        *output = self.decode_block(&dxt_block_codec_bc3::Bc3Block::from_bytes(raw));
    }
}

impl BlockDecoder for Bc4Decoder {
    const BLOCK_SIZE: usize = dxt_block_codec_bc4::Bc4Block::SIZE;

    fn decode_block_from(&self, bytes: &[u8], output: &mut ColorBlock) {
        let mut raw = [0u8; Self::BLOCK_SIZE];
        raw.copy_from_slice(bytes);
        self.decode_block_into(output, &dxt_block_codec_bc4::Bc4Block::from_bytes(raw));
    }
}

impl BlockDecoder for Bc5Decoder {
    const BLOCK_SIZE: usize = dxt_block_codec_bc5::Bc5Block::SIZE;

    fn decode_block_from(&self, bytes: &[u8], output: &mut ColorBlock) {
        let mut raw = [0u8; Self::BLOCK_SIZE];
        raw.copy_from_slice(bytes);
        *output = self.decode_block(&dxt_block_codec_bc5::Bc5Block::from_bytes(raw));
    }
}

/// Decodes a block-compressed texture into a tightly packed RGBA8888 image.
///
/// `width` and `height` must be nonzero multiples of 4, and `data` must hold
/// exactly one encoded block per 4x4 tile.
pub fn decode_texture<D: BlockDecoder>(
    decoder: &D,
    data: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, TextureError> {
    validate_dimensions(width, height)?;
    let blocks_x = (width / 4) as usize;
    let blocks_y = (height / 4) as usize;
    let expected = blocks_x * blocks_y * D::BLOCK_SIZE;
    if data.len() != expected {
        return Err(TextureError::BlockBufferSizeMismatch {
            expected,
            actual: data.len(),
        });
    }

    let mut rgba = vec![0u8; width as usize * height as usize * 4];
    for (index, bytes) in data.chunks_exact(D::BLOCK_SIZE).enumerate() {
        let mut block = ColorBlock::default();
        decoder.decode_block_from(bytes, &mut block);
        scatter_block(
            &mut rgba,
            width as usize,
            index % blocks_x,
            index / blocks_x,
            &block,
        );
    }
    Ok(rgba)
}

/// Decodes a BC1 texture.
pub fn decode_bc1(
    data: &[u8],
    width: u32,
    height: u32,
    interpolation: Interpolation,
) -> Result<Vec<u8>, TextureError> {
    decode_texture(&Bc1Decoder::new(interpolation), data, width, height)
}

/// Decodes a BC3 texture.
pub fn decode_bc3(
    data: &[u8],
    width: u32,
    height: u32,
    interpolation: Interpolation,
) -> Result<Vec<u8>, TextureError> {
    decode_texture(&Bc3Decoder::new(interpolation), data, width, height)
}

/// Decodes a BC4 texture into the given channel.
pub fn decode_bc4(
    data: &[u8],
    width: u32,
    height: u32,
    channel: u32,
) -> Result<Vec<u8>, TextureError> {
    let decoder = Bc4Decoder::new(channel)?;
    decode_texture(&decoder, data, width, height)
}

/// Decodes a BC5 texture into the given channels.
pub fn decode_bc5(
    data: &[u8],
    width: u32,
    height: u32,
    chan0: u32,
    chan1: u32,
) -> Result<Vec<u8>, TextureError> {
    let decoder = Bc5Decoder::new(chan0, chan1)?;
    decode_texture(&decoder, data, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_buffer_sizes() {
        let data = [0u8; 15];
        assert_eq!(
            decode_bc1(&data, 8, 4, Interpolation::Ideal),
            Err(TextureError::BlockBufferSizeMismatch {
                expected: 16,
                actual: 15
            })
        );
        assert!(matches!(
            decode_bc1(&data[..8], 8, 3, Interpolation::Ideal),
            Err(TextureError::MisalignedDimension { value: 3 })
        ));
    }

    #[test]
    fn decodes_solid_black_blocks() {
        let data = [0x01, 0x00, 0x00, 0x00, 0x55, 0x55, 0x55, 0x55];
        let rgba = decode_bc1(&data, 4, 4, Interpolation::Ideal).unwrap();
        assert_eq!(rgba.len(), 64);
        for pixel in rgba.chunks_exact(4) {
            assert_eq!(pixel, [0, 0, 0, 255]);
        }
    }
}
