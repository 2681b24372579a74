//! 音轨合成 - 用选定的配乐替换视频原声

use super::error::AudioError;
use crate::core::config::ToolPaths;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

/// 三个固定配乐
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioChoice {
    #[serde(rename = "Audio 1")]
    Audio1,
    #[serde(rename = "Audio 2")]
    Audio2,
    #[serde(rename = "Audio 3")]
    Audio3,
}

impl AudioChoice {
    pub const ALL: [AudioChoice; 3] = [AudioChoice::Audio1, AudioChoice::Audio2, AudioChoice::Audio3];

    pub fn file_name(self) -> &'static str {
        match self {
            AudioChoice::Audio1 => "audio1.mp3",
            AudioChoice::Audio2 => "audio2.mp3",
            AudioChoice::Audio3 => "audio3.mp3",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AudioChoice::Audio1 => "Audio 1",
            AudioChoice::Audio2 => "Audio 2",
            AudioChoice::Audio3 => "Audio 3",
        }
    }
}

impl fmt::Display for AudioChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AudioChoice {
    type Err = AudioError;

    /// 接受 "1" / "Audio 1" / "audio1"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.trim_start_matches("audio") {
            "1" => Ok(AudioChoice::Audio1),
            "2" => Ok(AudioChoice::Audio2),
            "3" => Ok(AudioChoice::Audio3),
            _ => Err(AudioError::UnknownChoice(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub assets_dir: PathBuf,
    pub output_path: PathBuf,
    pub video_codec: String,
    pub audio_codec: String,
    pub tools: ToolPaths,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("."),
            output_path: PathBuf::from("merged_video.mp4"),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            tools: ToolPaths::from_env(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DurationProbe {
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn duration_from_probe(json: &[u8], path: &Path) -> Result<f64, AudioError> {
    let probe: DurationProbe = serde_json::from_slice(json)?;
    probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| AudioError::Probe {
            path: path.to_path_buf(),
            reason: "missing or invalid duration".to_string(),
        })
}

/// 配乐比视频长时截到视频时长
pub fn trim_duration(video_secs: f64, audio_secs: f64) -> Option<f64> {
    (audio_secs > video_secs).then_some(video_secs)
}

pub struct AudioMerger {
    config: MergeConfig,
}

impl AudioMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn asset_path(&self, choice: AudioChoice) -> PathBuf {
        self.config.assets_dir.join(choice.file_name())
    }

    /// 媒体时长（秒）
    pub fn probe_duration(&self, path: &Path) -> Result<f64, AudioError> {
        let output = Command::new(&self.config.tools.ffprobe)
            .args(["-v", "error"])
            .args(["-show_entries", "format=duration"])
            .args(["-of", "json"])
            .arg(path)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(AudioError::Probe {
                path: path.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        duration_from_probe(&output.stdout, path)
    }

    /// ffmpeg 参数：只取视频轨和配乐音轨，按需截断
    pub fn build_args(&self, video: &Path, audio: &Path, trim_to: Option<f64>) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-nostdin", "-y"]
            .iter()
            .map(OsString::from)
            .collect();

        args.push("-i".into());
        args.push(video.into());
        args.push("-i".into());
        args.push(audio.into());
        for arg in ["-map", "0:v:0", "-map", "1:a:0"] {
            args.push(arg.into());
        }
        args.push("-c:v".into());
        args.push(self.config.video_codec.as_str().into());
        args.push("-c:a".into());
        args.push(self.config.audio_codec.as_str().into());
        if let Some(secs) = trim_to {
            args.push("-t".into());
            args.push(format!("{:.3}", secs).into());
        }
        args.push(self.config.output_path.as_os_str().to_os_string());
        args
    }

    pub fn merge(&self, video: &Path, choice: AudioChoice) -> Result<PathBuf, AudioError> {
        if !video.exists() {
            return Err(AudioError::MissingVideo(video.to_path_buf()));
        }
        let audio = self.asset_path(choice);
        if !audio.exists() {
            return Err(AudioError::MissingAsset(audio));
        }

        info!("🎵 Merging {} ({}) into {}", choice, audio.display(), video.display());

        let video_secs = self.probe_duration(video)?;
        let audio_secs = self.probe_duration(&audio)?;
        let trim_to = trim_duration(video_secs, audio_secs);
        debug!(
            "video {:.2}s, audio {:.2}s, trim: {:?}",
            video_secs, audio_secs, trim_to
        );

        let output = Command::new(&self.config.tools.ffmpeg)
            .args(self.build_args(video, &audio, trim_to))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("❌ ffmpeg merge failed: {}", stderr.trim());
            return Err(AudioError::Ffmpeg(stderr.trim().to_string()));
        }

        info!("✅ Merged video ready: {}", self.config.output_path.display());
        Ok(self.config.output_path.clone())
    }
}

impl Default for AudioMerger {
    fn default() -> Self {
        Self::new(MergeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn merger_in(dir: &Path) -> AudioMerger {
        AudioMerger::new(MergeConfig {
            assets_dir: dir.to_path_buf(),
            output_path: dir.join("merged_video.mp4"),
            ..Default::default()
        })
    }

    #[test]
    fn test_choice_parsing() {
        assert_eq!("1".parse::<AudioChoice>().unwrap(), AudioChoice::Audio1);
        assert_eq!("Audio 2".parse::<AudioChoice>().unwrap(), AudioChoice::Audio2);
        assert_eq!("audio3".parse::<AudioChoice>().unwrap(), AudioChoice::Audio3);
        assert!(matches!(
            "4".parse::<AudioChoice>(),
            Err(AudioError::UnknownChoice(_))
        ));
    }

    #[test]
    fn test_asset_mapping() {
        let merger = merger_in(Path::new("/assets"));
        assert_eq!(merger.asset_path(AudioChoice::Audio1), PathBuf::from("/assets/audio1.mp3"));
        assert_eq!(merger.asset_path(AudioChoice::Audio3), PathBuf::from("/assets/audio3.mp3"));
    }

    #[test]
    fn test_trim_only_when_audio_longer() {
        assert_eq!(trim_duration(10.0, 12.5), Some(10.0));
        assert_eq!(trim_duration(10.0, 8.0), None);
        assert_eq!(trim_duration(10.0, 10.0), None);
    }

    #[test]
    fn test_build_args() {
        let merger = merger_in(Path::new("/out"));
        let args: Vec<String> = merger
            .build_args(Path::new("in.mp4"), Path::new("/out/audio1.mp3"), Some(10.0))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let pos = |needle: &str| args.iter().position(|a| a == needle).unwrap();
        assert_eq!(args[pos("-c:v") + 1], "libx264");
        assert_eq!(args[pos("-c:a") + 1], "aac");
        assert_eq!(args[pos("-t") + 1], "10.000");
        assert!(args.contains(&"0:v:0".to_string()));
        assert!(args.contains(&"1:a:0".to_string()));
        assert_eq!(args.last().unwrap(), "/out/merged_video.mp4");
    }

    #[test]
    fn test_build_args_without_trim() {
        let merger = merger_in(Path::new("/out"));
        let args = merger.build_args(Path::new("in.mp4"), Path::new("a.mp3"), None);
        assert!(!args.iter().any(|a| a == "-t"));
    }

    #[test]
    fn test_duration_probe_parsing() {
        let secs = duration_from_probe(br#"{"format":{"duration":"12.500000"}}"#, Path::new("a")).unwrap();
        assert_eq!(secs, 12.5);
        assert!(duration_from_probe(br#"{"format":{}}"#, Path::new("a")).is_err());
        assert!(duration_from_probe(br#"{}"#, Path::new("a")).is_err());
    }

    #[test]
    fn test_merge_missing_video() {
        let dir = tempfile::tempdir().unwrap();
        let merger = merger_in(dir.path());
        let err = merger
            .merge(&dir.path().join("nope.mp4"), AudioChoice::Audio1)
            .unwrap_err();
        assert!(matches!(err, AudioError::MissingVideo(_)));
    }

    #[test]
    fn test_merge_missing_asset() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("uploaded_video.mp4");
        fs::write(&video, b"not really a video").unwrap();
        let merger = merger_in(dir.path());
        let err = merger.merge(&video, AudioChoice::Audio2).unwrap_err();
        match err {
            AudioError::MissingAsset(path) => assert!(path.ends_with("audio2.mp3")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
