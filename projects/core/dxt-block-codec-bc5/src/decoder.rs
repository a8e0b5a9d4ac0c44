//! The BC5 block decoder.

use dxt_block_codec_bc4::{Bc4Decoder, ChannelOutOfRangeError};
use dxt_block_codec_common::color_block::ColorBlock;

use crate::block::Bc5Block;

/// Decodes BC5 blocks into two channels of a 4x4 pixel block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bc5Decoder {
    chan0_decoder: Bc4Decoder,
    chan1_decoder: Bc4Decoder,
}

impl Default for Bc5Decoder {
    fn default() -> Self {
        Self::new(0, 1).unwrap_or_else(|_| unreachable!("red and green are always in range"))
    }
}

impl Bc5Decoder {
    /// Creates a decoder writing the two given destination channels
    /// (0 = red, 1 = green, 2 = blue, 3 = alpha).
    pub fn new(chan0: u32, chan1: u32) -> Result<Self, ChannelOutOfRangeError> {
        Ok(Self {
            chan0_decoder: Bc4Decoder::new(chan0)?,
            chan1_decoder: Bc4Decoder::new(chan1)?,
        })
    }

    /// Decodes one block. Channels not covered by the decoder default to
    /// opaque black.
    pub fn decode_block(&self, block: &Bc5Block) -> ColorBlock {
        let mut output = ColorBlock::default();
        self.chan0_decoder
            .decode_block_into(&mut output, &block.chan0_block);
        self.chan1_decoder
            .decode_block_into(&mut output, &block.chan1_block);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Bc5Encoder;
    use dxt_block_codec_common::color_8888::Color8888;

    #[test]
    fn round_trip_reconstructs_both_channels() {
        let encoder = Bc5Encoder::default();
        let decoder = Bc5Decoder::default();

        let mut pixels = [Color8888::default(); 16];
        for (i, p) in pixels.iter_mut().enumerate() {
            *p = Color8888::new((i * 17) as u8, (255 - i * 17) as u8, 123, 45);
        }
        let source = ColorBlock::from_pixels(pixels);
        let decoded = decoder.decode_block(&encoder.encode_block(&source));

        // both extremes decode exactly; other channels stay at defaults
        assert_eq!(decoded.get(0).r, 0);
        assert_eq!(decoded.get(15).r, 255);
        assert_eq!(decoded.get(0).g, 255);
        assert_eq!(decoded.get(15).g, 0);
        assert_eq!(decoded.get(0).b, 0);
        assert_eq!(decoded.get(0).a, 255);
    }
}
