//! 视频合规检查器

use crate::core::audio::{AudioChoice, AudioMerger, MergeConfig};
use crate::core::pipeline::{self, ComplianceAnalyzer};
use crate::core::video::FrameSource;
use crate::core::{AnalysisConfig, AnalysisError, GuidelineGroup, ViolationReport};
use log::{error, info};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 操作员授权声明
pub const AUTHORIZATION_STATEMENT: &str = "I, the undersigned RSM, hereby authorize PUB.Co to utilize my video for any media-related activities on the website.";

/// 按分组列出四条规则
pub fn render_guidelines() -> String {
    let mut out = String::from("The guidelines are:\n");
    for group in GuidelineGroup::ALL {
        let _ = writeln!(out, "\n{}:", group.label());
        for rule in group.rules() {
            let _ = writeln!(out, "{}. {}", rule.number(), rule.guideline());
        }
    }
    out
}

/// 视频合规检查器 - 分析 + 可选配乐合成
///
/// ```ignore
/// let checker = VideoComplianceChecker::create(config, MergeConfig::default(), true)?;
/// let report = checker.analyze()?;
/// println!("{}", report);
/// checker.merge_audio(AudioChoice::Audio1)?;
/// ```
pub struct VideoComplianceChecker {
    config: AnalysisConfig,
    merger: AudioMerger,
    last_report: Mutex<Option<ViolationReport>>,
}

impl VideoComplianceChecker {
    /// 未确认授权声明时拒绝创建
    pub fn create(
        config: AnalysisConfig,
        merge: MergeConfig,
        acknowledged: bool,
    ) -> Result<Self, AnalysisError> {
        crate::init_logging();
        if !acknowledged {
            error!("❌ Authorization statement not acknowledged");
            return Err(AnalysisError::NotAuthorized);
        }

        info!(
            "🎬 VideoComplianceChecker: created for {} ({} group(s))",
            config.video_path.display(),
            config.rule_groups.len()
        );
        Ok(Self {
            config,
            merger: AudioMerger::new(merge),
            last_report: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn video_path(&self) -> &Path {
        &self.config.video_path
    }

    /// 解码并分析配置中的视频
    pub fn analyze(&self) -> Result<ViolationReport, AnalysisError> {
        let report = pipeline::run(&self.config)?;
        self.store(&report);
        Ok(report)
    }

    /// 分析任意帧来源（内存帧、外部解码器）
    pub fn analyze_source(&self, source: &mut dyn FrameSource) -> Result<ViolationReport, AnalysisError> {
        let analyzer = ComplianceAnalyzer::from_config(&self.config)?;
        let report = analyzer.analyze_source(source)?;
        self.store(&report);
        Ok(report)
    }

    pub fn last_report(&self) -> Option<ViolationReport> {
        self.last_report.lock().ok().and_then(|r| r.clone())
    }

    /// 报告生成之后才允许合成配乐
    pub fn merge_audio(&self, choice: AudioChoice) -> Result<PathBuf, AnalysisError> {
        if self.last_report().is_none() {
            return Err(AnalysisError::ReportPending);
        }
        Ok(self.merger.merge(&self.config.video_path, choice)?)
    }

    fn store(&self, report: &ViolationReport) {
        if let Ok(mut last) = self.last_report.lock() {
            *last = Some(report.clone());
        }
    }
}

impl Drop for VideoComplianceChecker {
    fn drop(&mut self) {
        info!("🗑️ VideoComplianceChecker: released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::video::{Frame, MemoryFrameSource};

    fn checker(acknowledged: bool) -> Result<VideoComplianceChecker, AnalysisError> {
        VideoComplianceChecker::create(
            AnalysisConfig::all_guidelines("uploaded_video.mp4"),
            MergeConfig::default(),
            acknowledged,
        )
    }

    #[test]
    fn test_requires_acknowledgement() {
        assert!(matches!(checker(false), Err(AnalysisError::NotAuthorized)));
        assert!(checker(true).is_ok());
    }

    #[test]
    fn test_analyze_source_keeps_last_report() {
        let checker = checker(true).unwrap();
        assert!(checker.last_report().is_none());

        let mut source = MemoryFrameSource::repeated(2.0, Frame::filled(100, 100, [255, 255, 255]), 4).unwrap();
        let report = checker.analyze_source(&mut source).unwrap();
        assert!(!report.is_clean());
        assert_eq!(checker.last_report(), Some(report));
    }

    #[test]
    fn test_merge_before_report_is_rejected() {
        let checker = checker(true).unwrap();
        assert!(matches!(
            checker.merge_audio(AudioChoice::Audio1),
            Err(AnalysisError::ReportPending)
        ));
    }

    #[test]
    fn test_guidelines_text() {
        let text = render_guidelines();
        assert!(text.contains("Primary Guidelines:"));
        assert!(text.contains("1. The car should be black."));
        assert!(text.contains("Environmental Guidelines:"));
        assert!(text.contains("4. The road should be gray in color."));
    }
}
