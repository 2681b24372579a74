//! BGR → HSV 定点转换
//!
//! 8 位 HSV：H 以半度为单位落在 [0,180)，S/V 落在 [0,255]。
//! 除法用 12 位定点查表完成，结果与主流视觉库的 8 位转换逐像素一致。

use once_cell::sync::Lazy;

const HSV_SHIFT: u32 = 12;
const HUE_RANGE: i32 = 180;

/// sdiv[v] = round(255 << 12 / v)
static SDIV_TABLE: Lazy<[i32; 256]> = Lazy::new(|| {
    let mut table = [0i32; 256];
    for (i, slot) in table.iter_mut().enumerate().skip(1) {
        *slot = ((255 << HSV_SHIFT) as f64 / i as f64).round() as i32;
    }
    table
});

/// hdiv[d] = round(180 << 12 / (6 * d))
static HDIV_TABLE: Lazy<[i32; 256]> = Lazy::new(|| {
    let mut table = [0i32; 256];
    for (i, slot) in table.iter_mut().enumerate().skip(1) {
        *slot = ((HUE_RANGE << HSV_SHIFT) as f64 / (6.0 * i as f64)).round() as i32;
    }
    table
});

#[inline]
pub fn bgr_to_hsv(b: u8, g: u8, r: u8) -> [u8; 3] {
    let (b, g, r) = (b as i32, g as i32, r as i32);
    let v = b.max(g).max(r);
    let vmin = b.min(g).min(r);
    let diff = v - vmin;
    let half = 1 << (HSV_SHIFT - 1);

    let s = (diff * SDIV_TABLE[v as usize] + half) >> HSV_SHIFT;

    // 红色优先，其次绿色
    let h = if v == r {
        g - b
    } else if v == g {
        b - r + 2 * diff
    } else {
        r - g + 4 * diff
    };
    let mut h = (h * HDIV_TABLE[diff as usize] + half) >> HSV_SHIFT;
    if h < 0 {
        h += HUE_RANGE;
    }

    [h as u8, s as u8, v as u8]
}

/// 闭区间 HSV 范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }
}
