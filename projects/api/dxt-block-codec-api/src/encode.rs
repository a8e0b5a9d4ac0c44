//! Texture encoding drivers.
//!
//! A texture is encoded block by block in row-major order. Every block is
//! independent, so once a texture crosses the encoder's parallel threshold
//! the blocks are fanned out over rayon's thread pool; the output buffer
//! layout is identical either way, and the per-block encode itself never
//! allocates.

use dxt_block_codec_bc1::{Bc1Encoder, ColorMode, Interpolation};
use dxt_block_codec_bc3::Bc3Encoder;
use dxt_block_codec_bc4::Bc4Encoder;
use dxt_block_codec_bc5::Bc5Encoder;
use dxt_block_codec_common::color_block::ColorBlock;

use crate::error::{validate_dimensions, TextureError};
use crate::tiles::gather_block;

/// A block-format encoder usable by [`encode_texture`].
pub trait BlockEncoder: Sync {
    /// Encoded size of one block in bytes.
    const BLOCK_SIZE: usize;

    /// Block count at or above which the driver encodes blocks in parallel.
    /// The default never goes parallel: for cheap encoders, thread
    /// creation/teardown can take longer than the encode itself.
    fn parallel_threshold(&self) -> usize {
        usize::MAX
    }

    /// Encodes one block into `output`, which is exactly
    /// [`BLOCK_SIZE`](BlockEncoder::BLOCK_SIZE) bytes.
    fn encode_block_into(&self, pixels: &ColorBlock, output: &mut [u8]);
}

impl BlockEncoder for Bc1Encoder {
    const BLOCK_SIZE: usize = dxt_block_codec_bc1::Bc1Block::SIZE;

    fn parallel_threshold(&self) -> usize {
        Bc1Encoder::PARALLEL_THRESHOLD
    }

    fn encode_block_into(&self, pixels: &ColorBlock, output: &mut [u8]) {
        output.copy_from_slice(&self.encode_block(pixels).to_bytes());
    }
}

impl BlockEncoder for Bc3Encoder {
    const BLOCK_SIZE: usize = dxt_block_codec_bc3::Bc3Block::SIZE;

    fn parallel_threshold(&self) -> usize {
        Bc3Encoder::PARALLEL_THRESHOLD
    }

    fn encode_block_into(&self, pixels: &ColorBlock, output: &mut [u8]) {
        output.copy_from_slice(&self.encode_block(pixels).to_bytes());
    }
}

impl BlockEncoder for Bc4Encoder {
    const BLOCK_SIZE: usize = dxt_block_codec_bc4::Bc4Block::SIZE;

    fn encode_block_into(&self, pixels: &ColorBlock, output: &mut [u8]) {
        output.copy_from_slice(&self.encode_block(pixels).to_bytes());
    }
}

impl BlockEncoder for Bc5Encoder {
    const BLOCK_SIZE: usize = dxt_block_codec_bc5::Bc5Block::SIZE;

    fn encode_block_into(&self, pixels: &ColorBlock, output: &mut [u8]) {
        output.copy_from_slice(&self.encode_block(pixels).to_bytes());
    }
}

/// Encodes a tightly packed RGBA8888 image with the given block encoder.
///
/// `width` and `height` must be nonzero multiples of 4, and `rgba` must hold
/// exactly `width * height * 4` bytes. Blocks appear in the output in
/// row-major order regardless of scheduling.
pub fn encode_texture<E: BlockEncoder>(
    encoder: &E,
    rgba: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, TextureError> {
    validate_dimensions(width, height)?;
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(TextureError::PixelBufferSizeMismatch {
            expected,
            actual: rgba.len(),
            width,
            height,
        });
    }

    let blocks_x = (width / 4) as usize;
    let blocks_y = (height / 4) as usize;
    let block_count = blocks_x * blocks_y;
    let mut output = vec![0u8; block_count * E::BLOCK_SIZE];

    let encode_one = |index: usize, chunk: &mut [u8]| {
        let block = gather_block(rgba, width as usize, index % blocks_x, index / blocks_x);
        encoder.encode_block_into(&block, chunk);
    };

    #[cfg(feature = "multithreaded")]
    if block_count >= encoder.parallel_threshold() {
        use rayon::prelude::*;
        output
            .par_chunks_exact_mut(E::BLOCK_SIZE)
            .enumerate()
            .for_each(|(index, chunk)| encode_one(index, chunk));
        return Ok(output);
    }

    for (index, chunk) in output.chunks_exact_mut(E::BLOCK_SIZE).enumerate() {
        encode_one(index, chunk);
    }
    Ok(output)
}

/// Encodes an RGBA8888 image to BC1 at the given quality level.
pub fn encode_bc1(
    rgba: &[u8],
    width: u32,
    height: u32,
    level: u32,
    color_mode: ColorMode,
    interpolation: Interpolation,
) -> Result<Vec<u8>, TextureError> {
    let encoder = Bc1Encoder::new(level, color_mode, interpolation)?;
    encode_texture(&encoder, rgba, width, height)
}

/// Encodes an RGBA8888 image to BC3 at the given quality level.
pub fn encode_bc3(
    rgba: &[u8],
    width: u32,
    height: u32,
    level: u32,
    interpolation: Interpolation,
) -> Result<Vec<u8>, TextureError> {
    let encoder = Bc3Encoder::new(level, interpolation)?;
    encode_texture(&encoder, rgba, width, height)
}

/// Encodes one channel of an RGBA8888 image to BC4.
pub fn encode_bc4(
    rgba: &[u8],
    width: u32,
    height: u32,
    channel: u32,
) -> Result<Vec<u8>, TextureError> {
    let encoder = Bc4Encoder::new(channel)?;
    encode_texture(&encoder, rgba, width, height)
}

/// Encodes two channels of an RGBA8888 image to BC5.
pub fn encode_bc5(
    rgba: &[u8],
    width: u32,
    height: u32,
    chan0: u32,
    chan1: u32,
) -> Result<Vec<u8>, TextureError> {
    let encoder = Bc5Encoder::new(chan0, chan1)?;
    encode_texture(&encoder, rgba, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let mut image = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            image.extend_from_slice(&rgba);
        }
        image
    }

    #[test]
    fn rejects_bad_arguments() {
        let image = solid_image(8, 8, [0, 0, 0, 255]);
        assert!(matches!(
            encode_bc1(&image, 7, 8, 5, ColorMode::FourColor, Interpolation::Ideal),
            Err(TextureError::MisalignedDimension { value: 7 })
        ));
        assert!(matches!(
            encode_bc1(&image[..100], 8, 8, 5, ColorMode::FourColor, Interpolation::Ideal),
            Err(TextureError::PixelBufferSizeMismatch { expected: 256, actual: 100, .. })
        ));
        assert!(matches!(
            encode_bc1(&image, 8, 8, 20, ColorMode::FourColor, Interpolation::Ideal),
            Err(TextureError::LevelOutOfRange(_))
        ));
        assert!(matches!(
            encode_bc4(&image, 8, 8, 4),
            Err(TextureError::ChannelOutOfRange(_))
        ));
    }

    #[test]
    fn output_is_row_major_blocks() {
        // left half black, right half white in an 8x4 image
        let mut image = solid_image(8, 4, [0, 0, 0, 255]);
        for x in 4..8 {
            for y in 0..4 {
                let offset = (y * 8 + x) * 4;
                image[offset..offset + 3].copy_from_slice(&[255, 255, 255]);
            }
        }

        let encoded =
            encode_bc1(&image, 8, 4, 5, ColorMode::FourColor, Interpolation::Ideal).unwrap();
        assert_eq!(encoded.len(), 16);
        // block 0 is solid black, block 1 solid white
        assert_eq!(&encoded[..8], &[0x01, 0x00, 0x00, 0x00, 0x55, 0x55, 0x55, 0x55]);
        assert_eq!(u16::from_le_bytes([encoded[8], encoded[9]]), 0xFFFF);
    }

    #[test]
    fn parallel_and_serial_agree_with_per_block_encoding() {
        // 8x8 blocks = 64 blocks, past the BC1 parallel threshold
        let width = 32u32;
        let height = 32u32;
        let mut image = vec![0u8; (width * height * 4) as usize];
        for (i, byte) in image.iter_mut().enumerate() {
            *byte = ((i * 7) % 256) as u8;
        }
        for i in (3..image.len()).step_by(4) {
            image[i] = 255;
        }

        let encoder = Bc1Encoder::new(2, ColorMode::FourColor, Interpolation::Ideal).unwrap();
        let encoded = encode_texture(&encoder, &image, width, height).unwrap();

        for by in 0..(height / 4) as usize {
            for bx in 0..(width / 4) as usize {
                let block = crate::tiles::gather_block(&image, width as usize, bx, by);
                let expected = encoder.encode_block(&block).to_bytes();
                let index = (by * (width as usize / 4) + bx) * 8;
                assert_eq!(&encoded[index..index + 8], &expected, "block ({bx}, {by})");
            }
        }
    }

    #[test]
    fn bc3_and_bc5_sizes() {
        let image = solid_image(8, 8, [1, 2, 3, 4]);
        assert_eq!(
            encode_bc3(&image, 8, 8, 5, Interpolation::Ideal).unwrap().len(),
            4 * 16
        );
        assert_eq!(encode_bc5(&image, 8, 8, 0, 1).unwrap().len(), 4 * 16);
        assert_eq!(encode_bc4(&image, 8, 8, 0).unwrap().len(), 4 * 8);
    }
}
