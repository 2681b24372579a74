//! 视频解码 - ffprobe 探测参数，ffmpeg 输出 bgr24 原始帧

use super::error::DecodeError;
use super::frame::{Frame, CHANNELS};
use crate::core::config::ToolPaths;
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

/// 顺序帧来源：按采集顺序逐帧产出，附带恒定帧率
pub trait FrameSource: Iterator<Item = Result<Frame, DecodeError>> {
    fn fps(&self) -> f64;
}

/// 视频流参数，宽高为按旋转元数据摆正后的显示尺寸
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// 顺时针显示旋转角，取 0 / 90 / 180 / 270
    pub rotation: u32,
}

impl StreamInfo {
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * CHANNELS
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    #[serde(default)]
    tags: ProbeTags,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeTags {
    rotate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

impl ProbeStream {
    /// Display Matrix 优先（逆时针角，取反），其次是旧式 rotate 标签（顺时针）
    fn rotation(&self) -> u32 {
        let degrees = self
            .side_data_list
            .iter()
            .find_map(|sd| sd.rotation.map(|r| -r))
            .or_else(|| self.tags.rotate.as_deref().and_then(|r| r.trim().parse().ok()))
            .unwrap_or(0.0);
        normalize_rotation(degrees)
    }
}

/// 任意角度归一到 [0, 360) 内最近的直角
pub fn normalize_rotation(degrees: f64) -> u32 {
    if !degrees.is_finite() {
        return 0;
    }
    let quarter = (degrees / 90.0).round() as i64;
    (quarter.rem_euclid(4) * 90) as u32
}

/// 解析 "30000/1001" 或 "25" 形式的帧率，分母为 0 时返回 None
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den > 0.0 {
                Some(num / den)
            } else {
                None
            }
        }
        None => rate.trim().parse().ok(),
    }
}

fn stream_info_from_probe(json: &[u8], path: &Path) -> Result<StreamInfo, DecodeError> {
    let probe: ProbeOutput = serde_json::from_slice(json)?;
    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| DecodeError::NoVideoStream(path.to_path_buf()))?;

    let (coded_w, coded_h) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(DecodeError::Open {
                path: path.to_path_buf(),
                reason: "video stream has no dimensions".to_string(),
            })
        }
    };

    let fps = stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .filter(|f| *f > 0.0)
        .or_else(|| stream.avg_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(0.0);

    if !fps.is_finite() || fps <= 0.0 {
        return Err(DecodeError::InvalidFrameRate(fps));
    }

    let rotation = stream.rotation();
    let (width, height) = if rotation % 180 == 90 {
        (coded_h, coded_w)
    } else {
        (coded_w, coded_h)
    };

    Ok(StreamInfo {
        width,
        height,
        fps,
        rotation,
    })
}

/// 探测第一条视频流的尺寸、帧率和旋转
pub fn probe_stream(path: &Path, tools: &ToolPaths) -> Result<StreamInfo, DecodeError> {
    let output = Command::new(&tools.ffprobe)
        .args(["-v", "error"])
        .args(["-select_streams", "v:0"])
        .args([
            "-show_entries",
            "stream=width,height,r_frame_rate,avg_frame_rate:stream_tags=rotate:stream_side_data=rotation",
        ])
        .args(["-of", "json"])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| DecodeError::Open {
            path: path.to_path_buf(),
            reason: format!("failed to run {:?}: {}", tools.ffprobe, e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DecodeError::Open {
            path: path.to_path_buf(),
            reason: stderr.trim().to_string(),
        });
    }

    stream_info_from_probe(&output.stdout, path)
}

/// ffmpeg 子进程解码器
///
/// 子进程在 Drop 时被终止并回收，任何退出路径都会释放。
pub struct FfmpegDecoder {
    path: PathBuf,
    info: StreamInfo,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    /// 后台线程持续读取的 stderr
    stderr: Option<JoinHandle<String>>,
    frames_read: u64,
    finished: bool,
}

impl FfmpegDecoder {
    pub fn open(path: &Path, tools: &ToolPaths) -> Result<Self, DecodeError> {
        if !path.exists() {
            return Err(DecodeError::Open {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }

        info!("🎬 Opening video: {}", path.display());
        let info = probe_stream(path, tools)?;
        info!(
            "📊 Stream: {}x{} @ {:.3} fps, rotation {}°",
            info.width, info.height, info.fps, info.rotation
        );

        let mut child = Command::new(&tools.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin"])
            .arg("-i")
            .arg(path)
            .args(["-map", "0:v:0", "-an", "-sn"])
            .args(["-vsync", "0"])
            .args(["-f", "rawvideo", "-pix_fmt", "bgr24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DecodeError::Open {
                path: path.to_path_buf(),
                reason: format!("failed to run {:?}: {}", tools.ffmpeg, e),
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        Ok(Self {
            path: path.to_path_buf(),
            info,
            child: Some(child),
            stdout,
            stderr,
            frames_read: 0,
            finished: false,
        })
    }

    pub fn info(&self) -> StreamInfo {
        self.info
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// 读满一帧；流在帧边界结束返回 Ok(None)
    fn read_frame_bytes(&mut self) -> Result<Option<Vec<u8>>, DecodeError> {
        let expected = self.info.frame_size();
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; expected];
        let mut filled = 0usize;
        while filled < expected {
            match stdout.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(DecodeError::Io(e)),
            }
        }

        match filled {
            0 => Ok(None),
            n if n == expected => Ok(Some(buf)),
            got => Err(DecodeError::TruncatedFrame {
                frame_number: self.frames_read,
                got,
                expected,
            }),
        }
    }

    /// 流结束后回收子进程并检查退出码
    fn finish(&mut self) -> Result<(), DecodeError> {
        self.stdout = None;
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let status = child.wait()?;
        let stderr = self
            .stderr
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        if !status.success() {
            error!("❌ ffmpeg exited with {} for {}", status, self.path.display());
            return Err(DecodeError::Ffmpeg(format!("{}: {}", status, stderr.trim())));
        }
        if self.frames_read == 0 {
            return Err(DecodeError::NoFrames);
        }

        info!(
            "✅ Decoded {} frames from {}",
            self.frames_read,
            self.path.display()
        );
        Ok(())
    }
}

impl Iterator for FfmpegDecoder {
    type Item = Result<Frame, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = match self.read_frame_bytes() {
            Ok(Some(bytes)) => Frame::from_bgr(
                self.info.width,
                self.info.height,
                bytes,
                self.frames_read,
                self.info.fps,
            ),
            Ok(None) => {
                self.finished = true;
                return self.finish().err().map(Err);
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(frame) => {
                self.frames_read += 1;
                Some(Ok(frame))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl FrameSource for FfmpegDecoder {
    fn fps(&self) -> f64 {
        self.info.fps
    }
}

impl Drop for FfmpegDecoder {
    fn drop(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                warn!("⚠️ Stopping ffmpeg before end of stream");
                let _ = child.kill();
            }
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr.take() {
            let _ = handle.join();
        }
        debug!("🗑️ FfmpegDecoder: released {}", self.path.display());
    }
}

/// 内存帧来源，帧号和时间戳按顺序重写
pub struct MemoryFrameSource {
    fps: f64,
    frames: VecDeque<Frame>,
    next_number: u64,
}

impl MemoryFrameSource {
    pub fn new(fps: f64, frames: Vec<Frame>) -> Result<Self, DecodeError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(DecodeError::InvalidFrameRate(fps));
        }
        Ok(Self {
            fps,
            frames: frames.into(),
            next_number: 0,
        })
    }

    /// 同一帧重复 count 次
    pub fn repeated(fps: f64, frame: Frame, count: usize) -> Result<Self, DecodeError> {
        Self::new(fps, vec![frame; count])
    }
}

impl Iterator for MemoryFrameSource {
    type Item = Result<Frame, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.frames.pop_front()?;
        let frame = frame.with_number(self.next_number, self.fps);
        self.next_number += 1;
        Some(Ok(frame))
    }
}

impl FrameSource for MemoryFrameSource {
    fn fps(&self) -> f64 {
        self.fps
    }
}
