use super::error::DecodeError;
use image::GrayImage;
use std::time::Duration;

/// 每个像素的通道数（BGR）
pub const CHANNELS: usize = 3;

/// 帧数据结构
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>, // BGR 格式，行优先
    pub timestamp: Duration,
    pub frame_number: u64,
}

impl Frame {
    /// 从解码器输出的 BGR 缓冲区构建帧，长度不符视为坏帧
    pub fn from_bgr(
        width: u32,
        height: u32,
        data: Vec<u8>,
        frame_number: u64,
        fps: f64,
    ) -> Result<Self, DecodeError> {
        Self::from_channels(width, height, CHANNELS, data, frame_number, fps)
    }

    pub fn from_channels(
        width: u32,
        height: u32,
        channels: usize,
        data: Vec<u8>,
        frame_number: u64,
        fps: f64,
    ) -> Result<Self, DecodeError> {
        if channels != CHANNELS {
            return Err(DecodeError::MalformedFrame {
                frame_number,
                reason: format!("expected {} channels, got {}", CHANNELS, channels),
            });
        }

        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(DecodeError::MalformedFrame {
                frame_number,
                reason: format!(
                    "{}x{} frame needs {} bytes, got {}",
                    width,
                    height,
                    expected,
                    data.len()
                ),
            });
        }

        let timestamp = if fps > 0.0 {
            Duration::from_secs_f64(frame_number as f64 / fps)
        } else {
            Duration::ZERO
        };

        Ok(Self {
            width,
            height,
            data,
            timestamp,
            frame_number,
        })
    }

    /// 纯色帧，主要用于测试和占位
    pub fn filled(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let data = bgr
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * CHANNELS)
            .collect();
        Self {
            width,
            height,
            data,
            timestamp: Duration::ZERO,
            frame_number: 0,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// 行范围 [y0, y1) × 列范围 [x0, x1) 内的像素迭代器
    pub fn region(&self, x0: u32, x1: u32, y0: u32, y1: u32) -> impl Iterator<Item = [u8; 3]> + '_ {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        (y0..y1).flat_map(move |y| (x0..x1).map(move |x| self.pixel(x, y)))
    }

    /// 设置矩形区域颜色，返回新帧
    pub fn with_rect(mut self, x0: u32, x1: u32, y0: u32, y1: u32, bgr: [u8; 3]) -> Self {
        let w = self.width as usize;
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                let idx = (y as usize * w + x as usize) * CHANNELS;
                self.data[idx..idx + CHANNELS].copy_from_slice(&bgr);
            }
        }
        self
    }

    pub fn with_number(mut self, frame_number: u64, fps: f64) -> Self {
        self.frame_number = frame_number;
        if fps > 0.0 {
            self.timestamp = Duration::from_secs_f64(frame_number as f64 / fps);
        }
        self
    }

    /// 转灰度图，定点 BT.601 权重，与常见视觉库的 8 位实现逐像素一致
    pub fn to_gray(&self) -> GrayImage {
        let gray = self
            .data
            .chunks_exact(CHANNELS)
            .map(|bgr| bgr_to_gray(bgr[0], bgr[1], bgr[2]))
            .collect();
        GrayImage::from_raw(self.width, self.height, gray)
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }

    /// 转 8 位 HSV（H ∈ [0,180)，S/V ∈ [0,255]）
    pub fn to_hsv(&self) -> Vec<[u8; 3]> {
        self.data
            .chunks_exact(CHANNELS)
            .map(|bgr| super::color::bgr_to_hsv(bgr[0], bgr[1], bgr[2]))
            .collect()
    }
}

const GRAY_SHIFT: u32 = 14;
const GRAY_R: u32 = 4899;
const GRAY_G: u32 = 9617;
const GRAY_B: u32 = 1868;

#[inline]
pub fn bgr_to_gray(b: u8, g: u8, r: u8) -> u8 {
    let v = r as u32 * GRAY_R + g as u32 * GRAY_G + b as u32 * GRAY_B + (1 << (GRAY_SHIFT - 1));
    (v >> GRAY_SHIFT) as u8
}
