pub mod checker;

pub use checker::{render_guidelines, VideoComplianceChecker, AUTHORIZATION_STATEMENT};
