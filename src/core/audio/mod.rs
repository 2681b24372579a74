pub mod error;
pub mod merger;

pub use error::AudioError;
pub use merger::{AudioChoice, AudioMerger, MergeConfig};
