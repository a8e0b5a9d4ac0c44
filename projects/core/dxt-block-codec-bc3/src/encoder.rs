//! The BC3 block encoder: BC4 for alpha, BC1 (4-color mode) for color.

use dxt_block_codec_bc1::{Bc1Encoder, ColorMode, Interpolation, LevelOutOfRangeError};
use dxt_block_codec_bc4::Bc4Encoder;
use dxt_block_codec_common::color_block::ColorBlock;

use crate::block::Bc3Block;

const ALPHA_CHANNEL: u32 = 3;

/// Encodes 4x4 pixel blocks to BC3.
pub struct Bc3Encoder {
    bc1_encoder: Bc1Encoder,
    bc4_encoder: Bc4Encoder,
}

impl Bc3Encoder {
    /// Block count at or above which a texture driver should encode blocks in
    /// parallel (inherited from the BC1 color half, which dominates).
    pub const PARALLEL_THRESHOLD: usize = Bc1Encoder::PARALLEL_THRESHOLD;

    /// Creates an encoder for a BC1 quality level preset. The color half is
    /// forced to 4-color mode as the BC3 format requires; transparency lives
    /// entirely in the alpha half.
    pub fn new(level: u32, interpolation: Interpolation) -> Result<Self, LevelOutOfRangeError> {
        Ok(Self {
            bc1_encoder: Bc1Encoder::new(level, ColorMode::FourColor, interpolation)?,
            bc4_encoder: Bc4Encoder::new(ALPHA_CHANNEL)
                .unwrap_or_else(|_| unreachable!("alpha channel is always in range")),
        })
    }

    /// The color half's encoder.
    #[inline]
    pub fn bc1_encoder(&self) -> &Bc1Encoder {
        &self.bc1_encoder
    }

    /// Encodes one 4x4 block.
    pub fn encode_block(&self, pixels: &ColorBlock) -> Bc3Block {
        Bc3Block {
            alpha_block: self.bc4_encoder.encode_block(pixels),
            color_block: self.bc1_encoder.encode_block(pixels),
        }
    }
}
