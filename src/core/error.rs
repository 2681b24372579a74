use crate::core::audio::AudioError;
use crate::core::video::DecodeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Invalid input {path:?}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },
    #[error("Operator authorization is required before analysis")]
    NotAuthorized,
    #[error("No report yet, analyze the video before merging audio")]
    ReportPending,
    #[error("Worker pool error: {0}")]
    ThreadPool(String),
    #[error("Audio merge error: {0}")]
    Audio(#[from] AudioError),
    #[error("Report serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
