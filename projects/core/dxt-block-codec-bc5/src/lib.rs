#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

#[cfg(feature = "std")]
extern crate std;

pub mod block;
pub mod decoder;
pub mod encoder;

pub use block::Bc5Block;
pub use decoder::Bc5Decoder;
pub use encoder::Bc5Encoder;
