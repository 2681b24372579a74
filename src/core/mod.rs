pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod video;

pub use config::{AnalysisConfig, ToolPaths};
pub use error::AnalysisError;
pub use pipeline::{run, ComplianceAnalyzer};
pub use report::{BucketEnumeration, ViolationReport};
pub use rules::{GuidelineGroup, RuleId, RuleSet, Verdict};
