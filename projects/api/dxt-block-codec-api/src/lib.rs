#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]
#![warn(missing_docs)]

pub mod decode;
pub mod encode;
pub mod error;

pub(crate) mod tiles;

pub use decode::{
    decode_bc1, decode_bc3, decode_bc4, decode_bc5, decode_texture, BlockDecoder,
};
pub use encode::{
    encode_bc1, encode_bc3, encode_bc4, encode_bc5, encode_texture, BlockEncoder,
};
pub use error::TextureError;

// Re-export the per-format types callers configure the drivers with
pub use dxt_block_codec_bc1::{
    Bc1Decoder, Bc1Encoder, Bc1EncoderSettings, ColorMode, Interpolation,
};
pub use dxt_block_codec_bc3::{Bc3Decoder, Bc3Encoder};
pub use dxt_block_codec_bc4::{Bc4Decoder, Bc4Encoder};
pub use dxt_block_codec_bc5::{Bc5Decoder, Bc5Encoder};
