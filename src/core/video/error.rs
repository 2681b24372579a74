use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to open video {path:?}: {reason}")]
    Open { path: PathBuf, reason: String },
    #[error("Probe output parse failed: {0}")]
    Probe(#[from] serde_json::Error),
    #[error("No video stream in {0:?}")]
    NoVideoStream(PathBuf),
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),
    #[error("Video produced no decodable frames")]
    NoFrames,
    #[error("Frame {frame_number} truncated: got {got} of {expected} bytes")]
    TruncatedFrame {
        frame_number: u64,
        got: usize,
        expected: usize,
    },
    #[error("Malformed frame {frame_number}: {reason}")]
    MalformedFrame { frame_number: u64, reason: String },
    #[error("ffmpeg decode failed: {0}")]
    Ffmpeg(String),
}
