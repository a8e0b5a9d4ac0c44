//! The BC3 block decoder.

use dxt_block_codec_bc1::{Bc1Decoder, Interpolation};
use dxt_block_codec_bc4::Bc4Decoder;
use dxt_block_codec_common::color_block::ColorBlock;

use crate::block::Bc3Block;

const ALPHA_CHANNEL: u32 = 3;

/// Decodes BC3 blocks to 4x4 pixel blocks.
#[derive(Debug, Clone, Copy)]
pub struct Bc3Decoder {
    bc1_decoder: Bc1Decoder,
    bc4_decoder: Bc4Decoder,
}

impl Bc3Decoder {
    /// Creates a decoder using the given interpolation variant for the color
    /// half.
    pub fn new(interpolation: Interpolation) -> Self {
        Self {
            // alpha comes from the BC4 half, so the color half must not write it
            bc1_decoder: Bc1Decoder::with_write_alpha(interpolation, false),
            bc4_decoder: Bc4Decoder::new(ALPHA_CHANNEL)
                .unwrap_or_else(|_| unreachable!("alpha channel is always in range")),
        }
    }

    /// Decodes one block.
    pub fn decode_block(&self, block: &Bc3Block) -> ColorBlock {
        let mut output = ColorBlock::default();
        self.bc4_decoder.decode_block_into(&mut output, &block.alpha_block);
        // BC3 color data always decodes with the 4-color palette
        self.bc1_decoder
            .decode_block_into(&mut output, &block.color_block, false);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Bc3Encoder;
    use dxt_block_codec_common::color_8888::Color8888;

    #[test]
    fn alpha_survives_the_round_trip() {
        let encoder = Bc3Encoder::new(5, Interpolation::Ideal).unwrap();
        let decoder = Bc3Decoder::new(Interpolation::Ideal);

        let mut pixels = [Color8888::new(200, 50, 25, 255); 16];
        pixels[3].a = 0;
        pixels[7].a = 0;
        let source = ColorBlock::from_pixels(pixels);

        let decoded = decoder.decode_block(&encoder.encode_block(&source));
        assert_eq!(decoded.get(3).a, 0);
        assert_eq!(decoded.get(7).a, 0);
        assert_eq!(decoded.get(0).a, 255);
        // color channels are close to the source even for transparent pixels
        assert!((decoded.get(0).r as i32 - 200).abs() <= 8);
    }

    #[test]
    fn forced_four_color_palette_even_with_swapped_endpoints() {
        // craft a block whose color half has color0 <= color1
        let mut block = Bc3Block::default();
        block.color_block.color0 = 0x0000;
        block.color_block.color1 = 0xFFFF;
        block.color_block.selectors = [0b11111111; 4]; // selector 3 everywhere
        block.alpha_block.endpoint0 = 255;
        block.alpha_block.endpoint1 = 255;

        let decoded = Bc3Decoder::new(Interpolation::Ideal).decode_block(&block);
        // selector 3 is an interpolated color, not transparent black
        assert_eq!(decoded.get(0).a, 255);
        assert_eq!(decoded.get(0).r, 170);
    }
}
