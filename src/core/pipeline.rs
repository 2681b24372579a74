use crate::core::config::AnalysisConfig;
use crate::core::error::AnalysisError;
use crate::core::report::{time_bucket, BucketEnumeration, TemporalAggregator, ViolationReport};
use crate::core::rules::{GuidelineGroup, RuleId, RuleSet, Verdict};
use crate::core::video::{DecodeError, FfmpegDecoder, Frame, FrameSource};
use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::path::Path;

const PROGRESS_EVERY: u64 = 300;

/// 只接受 MP4 文件
pub fn validate_input(path: &Path) -> Result<(), AnalysisError> {
    let is_mp4 = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mp4"));
    if !is_mp4 {
        return Err(AnalysisError::InvalidInput {
            path: path.to_path_buf(),
            reason: "only MP4 files are accepted".to_string(),
        });
    }
    if !path.is_file() {
        return Err(AnalysisError::InvalidInput {
            path: path.to_path_buf(),
            reason: "file not found".to_string(),
        });
    }
    Ok(())
}

/// 逐帧评估 + 按秒聚合
pub struct ComplianceAnalyzer {
    rules: RuleSet,
    bucket_enumeration: BucketEnumeration,
    pool: ThreadPool,
}

impl ComplianceAnalyzer {
    pub fn new<'a>(
        groups: impl IntoIterator<Item = &'a GuidelineGroup>,
        bucket_enumeration: BucketEnumeration,
        worker_threads: usize,
    ) -> Result<Self, AnalysisError> {
        let rules = RuleSet::from_groups(groups);
        if rules.is_empty() {
            warn!("⚠️ No guideline group selected, no rule will be checked");
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_threads.max(1))
            .build()
            .map_err(|e| AnalysisError::ThreadPool(e.to_string()))?;

        Ok(Self {
            rules,
            bucket_enumeration,
            pool,
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        Self::new(
            &config.rule_groups,
            config.bucket_enumeration,
            config.worker_threads,
        )
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// 单帧上并行评估所有生效规则，结果按规则编号排列
    pub fn evaluate_frame(&self, frame: &Frame) -> Vec<(RuleId, Verdict)> {
        let rules = self.rules.rules();
        if rules.len() <= 1 {
            return rules.iter().map(|&r| (r, r.evaluate(frame))).collect();
        }
        self.pool
            .install(|| rules.par_iter().map(|&r| (r, r.evaluate(frame))).collect())
    }

    /// 一次性读完整个帧流后生成报告；任何解码错误都中止分析
    pub fn analyze_source<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<ViolationReport, AnalysisError> {
        let fps = source.fps();
        if !fps.is_finite() || fps <= 0.0 {
            return Err(DecodeError::InvalidFrameRate(fps).into());
        }

        let mut aggregator = TemporalAggregator::new();
        let mut frame_index: u64 = 0;

        while let Some(frame) = source.next() {
            let frame = frame?;
            let bucket = time_bucket(frame_index, fps);
            for (rule, verdict) in self.evaluate_frame(&frame) {
                aggregator.record(rule, bucket, verdict);
            }

            frame_index += 1;
            if frame_index % PROGRESS_EVERY == 0 {
                debug!("🔄 {} frames evaluated ({}s)", frame_index, bucket);
            }
        }

        if frame_index == 0 {
            return Err(DecodeError::NoFrames.into());
        }

        let report = ViolationReport::build(
            &aggregator,
            &self.rules,
            self.bucket_enumeration,
            frame_index,
            fps,
        );

        info!(
            "📊 Analyzed {} frames, {} verdicts, {} second(s) with violations",
            frame_index,
            aggregator.record_count(),
            report.violation_count()
        );
        Ok(report)
    }
}

/// 入口：校验输入、打开解码器、分析；解码器在返回前释放
pub fn run(config: &AnalysisConfig) -> Result<ViolationReport, AnalysisError> {
    validate_input(&config.video_path)?;
    let analyzer = ComplianceAnalyzer::from_config(config)?;
    let mut decoder = FfmpegDecoder::open(&config.video_path, &config.tools)?;
    let report = analyzer.analyze_source(&mut decoder)?;

    let info = decoder.info();
    debug!(
        "🎞️ {} frames read at {}x{} from {}",
        decoder.frames_read(),
        info.width,
        info.height,
        config.video_path.display()
    );
    Ok(report)
}
