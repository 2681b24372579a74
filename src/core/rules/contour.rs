//! 二值掩码的外轮廓提取
//!
//! 前景 8 连通、背景 4 连通；图像边界外视为背景。
//! 每个连通域从光栅序第一个像素出发做边界跟踪（Suzuki-Abe 外边界），
//! 只保留不被其他连通域包围的外轮廓。面积为边界点构成多边形的鞋带面积。

use image::GrayImage;

/// 8 邻域方向，按屏幕逆时针排列（y 轴向下）
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),   // E
    (1, -1),  // NE
    (0, -1),  // N
    (-1, -1), // NW
    (-1, 0),  // W
    (-1, 1),  // SW
    (0, 1),   // S
    (1, 1),   // SE
];
const WEST: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<(i32, i32)>,
}

impl Contour {
    /// 多边形面积（鞋带公式，取绝对值）
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i64 = (0..n)
            .map(|i| {
                let (x0, y0) = self.points[i];
                let (x1, y1) = self.points[(i + 1) % n];
                x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64
            })
            .sum();
        twice.abs() as f64 / 2.0
    }
}

struct Mask<'a> {
    width: i32,
    height: i32,
    data: &'a [u8],
}

impl Mask<'_> {
    #[inline]
    fn is_fg(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && x < self.width
            && y < self.height
            && self.data[(y * self.width + x) as usize] != 0
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }
}

/// 提取外轮廓
pub fn find_external_contours(mask: &GrayImage) -> Vec<Contour> {
    let (w, h) = mask.dimensions();
    let mask = Mask {
        width: w as i32,
        height: h as i32,
        data: mask.as_raw(),
    };
    if mask.width == 0 || mask.height == 0 {
        return Vec::new();
    }

    let outside = outer_background(&mask);
    let mut labeled = vec![false; mask.data.len()];
    let mut contours = Vec::new();

    for y in 0..mask.height {
        for x in 0..mask.width {
            let idx = mask.index(x, y);
            if labeled[idx] || !mask.is_fg(x, y) {
                continue;
            }
            label_component(&mask, &mut labeled, x, y);

            // 起点左侧必为背景；落在孔洞里说明被其他连通域包围
            let left_is_outside = x == 0 || outside[mask.index(x - 1, y)];
            if left_is_outside {
                contours.push(trace_border(&mask, x, y));
            }
        }
    }

    contours
}

/// 从边界出发的 4 连通背景
fn outer_background(mask: &Mask) -> Vec<bool> {
    let mut outside = vec![false; mask.data.len()];
    let mut stack = Vec::new();

    let seed = |x: i32, y: i32, outside: &mut [bool], stack: &mut Vec<(i32, i32)>| {
        let idx = mask.index(x, y);
        if !mask.is_fg(x, y) && !outside[idx] {
            outside[idx] = true;
            stack.push((x, y));
        }
    };

    for x in 0..mask.width {
        seed(x, 0, &mut outside, &mut stack);
        seed(x, mask.height - 1, &mut outside, &mut stack);
    }
    for y in 0..mask.height {
        seed(0, y, &mut outside, &mut stack);
        seed(mask.width - 1, y, &mut outside, &mut stack);
    }

    while let Some((x, y)) = stack.pop() {
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let (nx, ny) = (x + dx, y + dy);
            if nx < 0 || ny < 0 || nx >= mask.width || ny >= mask.height {
                continue;
            }
            seed(nx, ny, &mut outside, &mut stack);
        }
    }

    outside
}

fn label_component(mask: &Mask, labeled: &mut [bool], x: i32, y: i32) {
    let mut stack = vec![(x, y)];
    labeled[mask.index(x, y)] = true;

    while let Some((cx, cy)) = stack.pop() {
        for (dx, dy) in DIRECTIONS {
            let (nx, ny) = (cx + dx, cy + dy);
            if mask.is_fg(nx, ny) {
                let idx = mask.index(nx, ny);
                if !labeled[idx] {
                    labeled[idx] = true;
                    stack.push((nx, ny));
                }
            }
        }
    }
}

fn trace_border(mask: &Mask, sx: i32, sy: i32) -> Contour {
    let start = (sx, sy);
    let step = |(x, y): (i32, i32), d: usize| (x + DIRECTIONS[d].0, y + DIRECTIONS[d].1);

    // 从西侧背景开始顺时针找第一个前景邻居
    let first = (0..8)
        .map(|k| (WEST + 8 - k) % 8)
        .find(|&d| {
            let (nx, ny) = step(start, d);
            mask.is_fg(nx, ny)
        });

    let Some(first_dir) = first else {
        return Contour {
            points: vec![start],
        };
    };

    let second = step(start, first_dir);
    let mut points = Vec::new();
    let mut current = start;
    let mut back_dir = first_dir; // current → previous
    let limit = 4 * mask.data.len() + 8;

    while points.len() < limit {
        let next_dir = (1..=8)
            .map(|k| (back_dir + k) % 8)
            .find(|&d| {
                let (nx, ny) = step(current, d);
                mask.is_fg(nx, ny)
            })
            .unwrap_or(back_dir);
        let next = step(current, next_dir);

        points.push(current);
        if next == start && current == second {
            break;
        }

        back_dir = (next_dir + 4) % 8;
        current = next;
    }

    Contour { points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn mask_with_rect(w: u32, h: u32, x0: u32, x1: u32, y0: u32, y1: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            if x >= x0 && x < x1 && y >= y0 && y < y1 {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn test_empty_mask() {
        let mask = GrayImage::new(20, 20);
        assert!(find_external_contours(&mask).is_empty());
    }

    #[test]
    fn test_single_pixel() {
        let mask = mask_with_rect(10, 10, 3, 4, 3, 4);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![(3, 3)]);
        assert_eq!(contours[0].area(), 0.0);
    }

    #[test]
    fn test_rect_area_uses_pixel_centers() {
        let mask = mask_with_rect(50, 50, 10, 20, 5, 15);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].area(), 81.0);
    }

    #[test]
    fn test_full_frame_rect() {
        let mask = mask_with_rect(30, 20, 0, 30, 0, 20);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].area(), (29 * 19) as f64);
    }

    #[test]
    fn test_two_separate_blobs() {
        let mut mask = mask_with_rect(40, 40, 2, 10, 2, 10);
        for y in 20..30 {
            for x in 20..35 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let mut areas: Vec<f64> = find_external_contours(&mask).iter().map(|c| c.area()).collect();
        areas.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(areas, vec![49.0, 126.0]);
    }

    #[test]
    fn test_diagonal_touch_is_one_component() {
        let mut mask = mask_with_rect(20, 20, 2, 6, 2, 6);
        for y in 6..10 {
            for x in 6..10 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        assert_eq!(find_external_contours(&mask).len(), 1);
    }

    #[test]
    fn test_blob_inside_hole_is_not_external() {
        // 环形外框 + 孔洞中的小块
        let mut mask = mask_with_rect(40, 40, 5, 35, 5, 35);
        for y in 10..30 {
            for x in 10..30 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        for y in 18..22 {
            for x in 18..22 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].area(), (29 * 29) as f64);
    }

    #[test]
    fn test_l_shape_area() {
        // 10x10 方块去掉右下 5x5
        let mut mask = mask_with_rect(30, 30, 0, 10, 0, 10);
        for y in 5..10 {
            for x in 5..10 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        // 顶点 (0,0) (0,9) (4,9) (4,5) (5,4) (9,4) (9,0)
        assert_eq!(contours[0].area(), 56.5);
    }
}
