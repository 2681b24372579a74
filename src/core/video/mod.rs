pub mod color;
pub mod decoder;
pub mod error;
pub mod frame;
#[cfg(all(test, unix))]
pub(crate) mod testing;

pub use decoder::{FfmpegDecoder, FrameSource, MemoryFrameSource, StreamInfo};
pub use error::DecodeError;
pub use frame::Frame;
