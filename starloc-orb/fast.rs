use rayon::prelude::*;
use starloc_core::GrayImage;

/// FAST candidate with its segment-test score and Harris response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub x: u32,
    pub y: u32,
    pub score: f32,
    pub response: f32,
}

/// FAST-9/16 corner detection, non-maximum suppression and Harris scoring
pub struct CornerDetector;

impl CornerDetector {
    /// Bresenham circle of radius 3, clockwise from the top
    pub const FAST_OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];

    /// Contiguous arc length required by the segment test
    const ARC: u32 = 9;

    const HARRIS_BLOCK: i32 = 7;

    /// Detects corners at least `border` pixels away from the image edges.
    ///
    /// Corners are 3×3 local maxima of the FAST score, returned in row-major
    /// order with their Harris response filled in.
    pub fn detect(img: &GrayImage, threshold: u8, border: u32, harris_k: f32) -> Vec<Corner> {
        let (w, h) = img.dimensions();
        let border = border.max(3);
        if w <= 2 * border || h <= 2 * border {
            return Vec::new();
        }

        let scores = Self::score_map(img, threshold, border);
        let at = |x: u32, y: u32| scores[(y * w + x) as usize];

        (border..h - border)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut row = Vec::new();
                for x in border..w - border {
                    let s = at(x, y);
                    if s <= 0.0 {
                        continue;
                    }
                    // Ties go to the earlier pixel in scan order
                    let is_max = at(x - 1, y - 1) < s
                        && at(x, y - 1) < s
                        && at(x + 1, y - 1) < s
                        && at(x - 1, y) < s
                        && at(x + 1, y) <= s
                        && at(x - 1, y + 1) <= s
                        && at(x, y + 1) <= s
                        && at(x + 1, y + 1) <= s;
                    if is_max {
                        row.push(Corner {
                            x,
                            y,
                            score: s,
                            response: Self::harris_response(img, x, y, harris_k),
                        });
                    }
                }
                row
            })
            .collect()
    }

    /// FAST score per pixel; zero where the segment test fails.
    fn score_map(img: &GrayImage, threshold: u8, border: u32) -> Vec<f32> {
        let (w, h) = img.dimensions();
        let mut scores = vec![0.0f32; (w * h) as usize];

        scores
            .par_chunks_mut(w as usize)
            .enumerate()
            .filter(|(y, _)| *y as u32 >= border && (*y as u32) < h - border)
            .for_each(|(y, row)| {
                for x in border..w - border {
                    row[x as usize] = Self::segment_score(img, x, y as u32, threshold);
                }
            });

        scores
    }

    /// Segment test on the 16-pixel ring; the score is the summed contrast
    /// above threshold of the winning (bright or dark) class.
    pub fn segment_score(img: &GrayImage, x: u32, y: u32, threshold: u8) -> f32 {
        let p = img.get_pixel(x, y)[0] as i32;
        let t = threshold as i32;
        let mut bright_mask = 0u32;
        let mut dark_mask = 0u32;
        let mut bright_sum = 0i32;
        let mut dark_sum = 0i32;

        for (i, &(dx, dy)) in Self::FAST_OFFSETS.iter().enumerate() {
            let q = img.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)[0] as i32;
            if q > p + t {
                bright_mask |= 1 << i;
                bright_sum += q - p - t;
            } else if q < p - t {
                dark_mask |= 1 << i;
                dark_sum += p - q - t;
            }
        }

        let bright = Self::has_arc(bright_mask);
        let dark = Self::has_arc(dark_mask);
        match (bright, dark) {
            (true, true) => bright_sum.max(dark_sum) as f32,
            (true, false) => bright_sum as f32,
            (false, true) => dark_sum as f32,
            (false, false) => 0.0,
        }
    }

    /// True when the 16-bit ring mask holds `ARC` consecutive set bits, with wrap-around.
    fn has_arc(mask: u32) -> bool {
        if mask.count_ones() < Self::ARC {
            return false;
        }
        let ring = mask | (mask << 16);
        let mut run = ring;
        for i in 1..Self::ARC {
            run &= ring >> i;
        }
        run != 0
    }

    /// Harris corner response over a 7×7 block of Sobel gradients.
    pub fn harris_response(img: &GrayImage, x: u32, y: u32, k: f32) -> f32 {
        let (w, h) = img.dimensions();
        let r = Self::HARRIS_BLOCK / 2;
        let (cx, cy) = (x as i32, y as i32);
        if cx - r - 1 < 0 || cy - r - 1 < 0 || cx + r + 1 >= w as i32 || cy + r + 1 >= h as i32 {
            return 0.0;
        }

        let px = |x: i32, y: i32| img.get_pixel(x as u32, y as u32)[0] as f64;
        let mut ixx = 0.0f64;
        let mut ixy = 0.0f64;
        let mut iyy = 0.0f64;

        for yy in cy - r..=cy + r {
            for xx in cx - r..=cx + r {
                let gx = (px(xx + 1, yy - 1) + 2.0 * px(xx + 1, yy) + px(xx + 1, yy + 1))
                    - (px(xx - 1, yy - 1) + 2.0 * px(xx - 1, yy) + px(xx - 1, yy + 1));
                let gy = (px(xx - 1, yy + 1) + 2.0 * px(xx, yy + 1) + px(xx + 1, yy + 1))
                    - (px(xx - 1, yy - 1) + 2.0 * px(xx, yy - 1) + px(xx + 1, yy - 1));
                ixx += gx * gx;
                ixy += gx * gy;
                iyy += gy * gy;
            }
        }

        // Keeps responses in a float-friendly range
        let norm = 1.0 / (4.0 * Self::HARRIS_BLOCK as f64 * 255.0);
        let (ixx, ixy, iyy) = (ixx * norm * norm, ixy * norm * norm, iyy * norm * norm);
        let det = ixx * iyy - ixy * ixy;
        let trace = ixx + iyy;
        (det - k as f64 * trace * trace) as f32
    }
}
