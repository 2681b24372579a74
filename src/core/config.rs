use crate::core::audio::AudioChoice;
use crate::core::report::BucketEnumeration;
use crate::core::rules::GuidelineGroup;
use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};

pub const FFMPEG_ENV: &str = "VIDCHECK_FFMPEG";
pub const FFPROBE_ENV: &str = "VIDCHECK_FFPROBE";

/// 外部工具路径，默认从 PATH 查找
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl ToolPaths {
    /// 读取 VIDCHECK_FFMPEG / VIDCHECK_FFPROBE，空值忽略
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let lookup = |key: &str| env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        Self {
            ffmpeg: lookup(FFMPEG_ENV).unwrap_or(defaults.ffmpeg),
            ffprobe: lookup(FFPROBE_ENV).unwrap_or(defaults.ffprobe),
        }
    }
}

/// 一次分析的全部参数
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub rule_groups: BTreeSet<GuidelineGroup>,
    pub video_path: PathBuf,
    pub audio_choice: Option<AudioChoice>,
    pub bucket_enumeration: BucketEnumeration,
    pub tools: ToolPaths,
    /// 规则并行评估线程数
    pub worker_threads: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rule_groups: BTreeSet::from([GuidelineGroup::Primary]),
            video_path: PathBuf::from("uploaded_video.mp4"),
            audio_choice: None,
            bucket_enumeration: BucketEnumeration::default(),
            tools: ToolPaths::from_env(),
            worker_threads: num_cpus::get().clamp(1, 4),
        }
    }
}

impl AnalysisConfig {
    pub fn primary_only(video_path: impl AsRef<Path>) -> Self {
        Self::default().with_video(video_path)
    }

    pub fn environmental_only(video_path: impl AsRef<Path>) -> Self {
        Self::default()
            .with_video(video_path)
            .with_groups([GuidelineGroup::Environmental])
    }

    pub fn all_guidelines(video_path: impl AsRef<Path>) -> Self {
        Self::default()
            .with_video(video_path)
            .with_groups([GuidelineGroup::Primary, GuidelineGroup::Environmental])
    }

    pub fn with_video(mut self, video_path: impl AsRef<Path>) -> Self {
        self.video_path = video_path.as_ref().to_path_buf();
        self
    }

    pub fn with_groups(mut self, groups: impl IntoIterator<Item = GuidelineGroup>) -> Self {
        self.rule_groups = groups.into_iter().collect();
        self
    }

    pub fn with_audio(mut self, choice: AudioChoice) -> Self {
        self.audio_choice = Some(choice);
        self
    }

    pub fn with_bucket_enumeration(mut self, mode: BucketEnumeration) -> Self {
        self.bucket_enumeration = mode;
        self
    }

    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }
}
