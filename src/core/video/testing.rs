//! 测试用的 ffprobe / ffmpeg 替身脚本

use crate::core::config::ToolPaths;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// 替身 ffprobe 报告的流：4x2 @ 2 fps，每帧 24 字节
pub const FAKE_WIDTH: u32 = 4;
pub const FAKE_HEIGHT: u32 = 2;
pub const FAKE_FPS: f64 = 2.0;
pub const FAKE_FRAME_BYTES: usize = 4 * 2 * 3;

const FAKE_PROBE: &str = r#"echo '{"streams":[{"width":4,"height":2,"r_frame_rate":"2/1"}]}'"#;

pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// 参数一律忽略；ffmpeg 的 stdout/stderr/退出码由 body 决定
pub fn fake_tools(dir: &Path, ffmpeg_body: &str) -> ToolPaths {
    ToolPaths {
        ffprobe: script(dir, "ffprobe", FAKE_PROBE),
        ffmpeg: script(dir, "ffmpeg", ffmpeg_body),
    }
}

/// 输出 n 字节全零（即全黑像素）
pub fn zeros(n: usize) -> String {
    format!("head -c {} /dev/zero", n)
}

/// 占位 mp4，只需存在
pub fn placeholder_video(dir: &Path) -> PathBuf {
    let path = dir.join("clip.mp4");
    fs::write(&path, b"not decoded by the fake tools").unwrap();
    path
}
