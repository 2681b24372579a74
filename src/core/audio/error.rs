use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Video not found: {0:?}")]
    MissingVideo(PathBuf),
    #[error("Audio asset not found: {0:?}")]
    MissingAsset(PathBuf),
    #[error("Unknown audio choice: {0}")]
    UnknownChoice(String),
    #[error("Probe failed for {path:?}: {reason}")]
    Probe { path: PathBuf, reason: String },
    #[error("Probe output parse failed: {0}")]
    ProbeJson(#[from] serde_json::Error),
    #[error("ffmpeg merge failed: {0}")]
    Ffmpeg(String),
}
