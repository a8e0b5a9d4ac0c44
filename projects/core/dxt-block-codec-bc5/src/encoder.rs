//! The BC5 block encoder: one BC4 encode per channel.

use dxt_block_codec_bc4::{Bc4Encoder, ChannelOutOfRangeError};
use dxt_block_codec_common::color_block::ColorBlock;

use crate::block::Bc5Block;

/// Encodes two channels of 4x4 pixel blocks to BC5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bc5Encoder {
    chan0_encoder: Bc4Encoder,
    chan1_encoder: Bc4Encoder,
}

impl Default for Bc5Encoder {
    fn default() -> Self {
        Self::new(0, 1).unwrap_or_else(|_| unreachable!("red and green are always in range"))
    }
}

impl Bc5Encoder {
    /// Creates an encoder reading the two given source channels
    /// (0 = red, 1 = green, 2 = blue, 3 = alpha).
    pub fn new(chan0: u32, chan1: u32) -> Result<Self, ChannelOutOfRangeError> {
        Ok(Self {
            chan0_encoder: Bc4Encoder::new(chan0)?,
            chan1_encoder: Bc4Encoder::new(chan1)?,
        })
    }

    /// The two source channels this encoder reads.
    #[inline]
    pub fn channels(&self) -> (u32, u32) {
        (self.chan0_encoder.channel(), self.chan1_encoder.channel())
    }

    /// Encodes one 4x4 block.
    pub fn encode_block(&self, pixels: &ColorBlock) -> Bc5Block {
        Bc5Block {
            chan0_block: self.chan0_encoder.encode_block(pixels),
            chan1_block: self.chan1_encoder.encode_block(pixels),
        }
    }
}
