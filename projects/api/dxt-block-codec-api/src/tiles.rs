//! Gathering and scattering 4x4 tiles of a tightly packed RGBA8888 image.

use dxt_block_codec_common::color_8888::Color8888;
use dxt_block_codec_common::color_block::ColorBlock;

/// Copies the 4x4 tile at block coordinates `(bx, by)` out of the image.
pub(crate) fn gather_block(rgba: &[u8], width: usize, bx: usize, by: usize) -> ColorBlock {
    let mut pixels = [Color8888::default(); 16];
    for y in 0..4 {
        let row_start = ((by * 4 + y) * width + bx * 4) * 4;
        for x in 0..4 {
            let offset = row_start + x * 4;
            pixels[y * 4 + x] = Color8888::new(
                rgba[offset],
                rgba[offset + 1],
                rgba[offset + 2],
                rgba[offset + 3],
            );
        }
    }
    ColorBlock::from_pixels(pixels)
}

/// Copies a decoded 4x4 tile into the image at block coordinates `(bx, by)`.
pub(crate) fn scatter_block(
    rgba: &mut [u8],
    width: usize,
    bx: usize,
    by: usize,
    block: &ColorBlock,
) {
    for y in 0..4 {
        let row_start = ((by * 4 + y) * width + bx * 4) * 4;
        for x in 0..4 {
            let offset = row_start + x * 4;
            let pixel = block.get_xy(x, y);
            rgba[offset] = pixel.r;
            rgba[offset + 1] = pixel.g;
            rgba[offset + 2] = pixel.b;
            rgba[offset + 3] = pixel.a;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gather_scatter_round_trip() {
        let width = 8usize;
        let height = 4usize;
        let mut rgba = vec![0u8; width * height * 4];
        for (i, byte) in rgba.iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }

        let mut copy = vec![0u8; rgba.len()];
        for bx in 0..width / 4 {
            let block = gather_block(&rgba, width, bx, 0);
            scatter_block(&mut copy, width, bx, 0, &block);
        }
        assert_eq!(copy, rgba);
    }

    #[test]
    fn gather_reads_the_right_tile() {
        let width = 8usize;
        let mut rgba = vec![0u8; width * 4 * 4];
        // pixel (4, 0) = start of the second block's first row
        rgba[4 * 4] = 0xAB;
        let block = gather_block(&rgba, width, 1, 0);
        assert_eq!(block.get_xy(0, 0).r, 0xAB);
    }
}
