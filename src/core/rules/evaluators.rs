//! 四条规则的判定函数
//!
//! 每条规则都是无状态纯函数，只读原始帧，派生数据（灰度、掩码、HSV）各自生成。

use super::contour::find_external_contours;
use super::Verdict;
use crate::core::video::color::HsvRange;
use crate::core::video::Frame;
use image::{GrayImage, Luma};

/// Rule 1: 暗色阈值（灰度 ≤ 该值视为前景）
pub const DARK_THRESHOLD: u8 = 50;
/// Rule 1: 车身轮廓最小面积
pub const CAR_MIN_AREA: f64 = 5000.0;

/// Rule 2: 烟雾像素各通道下限（严格大于）
pub const SMOKE_CHANNEL_MIN: u8 = 200;
/// Rule 2: 烟雾像素数下限（大于等于）
pub const SMOKE_MIN_PIXELS: usize = 500;

/// Rule 3: 绿色 HSV 范围
pub const GREEN_RANGE: HsvRange = HsvRange::new([35, 40, 40], [85, 255, 255]);
/// Rule 3: 绿色像素数下限（严格大于）
pub const GRASS_MIN_PIXELS: usize = 1000;

/// Rule 4: 路面像素各通道下限（严格大于）
pub const ROAD_CHANNEL_MIN: u8 = 100;
/// Rule 4: 路面像素数下限（严格大于）
pub const ROAD_MIN_PIXELS: usize = 5000;

/// 反向二值化：灰度 > thresh → 0，否则 → 255
pub fn threshold_binary_inv(gray: &GrayImage, thresh: u8) -> GrayImage {
    let mut mask = gray.clone();
    for Luma([v]) in mask.pixels_mut() {
        *v = if *v > thresh { 0 } else { 255 };
    }
    mask
}

fn count_bright(pixels: impl Iterator<Item = [u8; 3]>, min: u8) -> usize {
    pixels.filter(|px| px.iter().all(|&c| c > min)).count()
}

/// Rule 1: 车身为黑色
pub fn car_is_black(frame: &Frame) -> Verdict {
    let mask = threshold_binary_inv(&frame.to_gray(), DARK_THRESHOLD);
    let detected = find_external_contours(&mask)
        .iter()
        .any(|c| c.area() > CAR_MIN_AREA);
    Verdict::from_followed(detected)
}

/// Rule 2: 下半幅有烟雾（近白像素）
pub fn smoke_present(frame: &Frame) -> Verdict {
    let lower = frame.region(0, frame.width, frame.height / 2, frame.height);
    Verdict::from_followed(count_bright(lower, SMOKE_CHANNEL_MIN) >= SMOKE_MIN_PIXELS)
}

/// Rule 3: 画面中有足够的绿色（草地）
pub fn grass_is_green(frame: &Frame) -> Verdict {
    let green = frame
        .to_hsv()
        .into_iter()
        .filter(|&hsv| GREEN_RANGE.contains(hsv))
        .count();
    Verdict::from_followed(green > GRASS_MIN_PIXELS)
}

/// Rule 4: 左下象限为灰色路面
pub fn road_is_gray(frame: &Frame) -> Verdict {
    let quadrant = frame.region(0, frame.width / 2, frame.height / 2, frame.height);
    Verdict::from_followed(count_bright(quadrant, ROAD_CHANNEL_MIN) > ROAD_MIN_PIXELS)
}
