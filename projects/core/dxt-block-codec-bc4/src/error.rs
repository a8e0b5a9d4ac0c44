//! Error types for BC4 operations.

use thiserror::Error;

/// The requested source channel does not exist (valid channels are 0..=3).
#[derive(Debug, Error, PartialEq, Eq)]
#[error("channel {0} is out of range, must be between 0 and 3 inclusive")]
pub struct ChannelOutOfRangeError(pub u32);
