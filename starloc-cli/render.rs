//! Side-by-side match visualization with corner markers.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_antialiased_line_segment_mut, draw_hollow_circle_mut, draw_line_segment_mut,
};
use imageproc::pixelops::interpolate;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use starloc_core::{GrayImage, Keypoint, Match, Point2, RenderConfig};

/// Places `query` at the left and `reference` at its right, then joins every
/// matched keypoint pair with a line and marks both ends with a circle.
/// Keypoints without a match are not drawn.
pub fn draw_matches(
    query: &GrayImage,
    query_kps: &[Keypoint],
    reference: &GrayImage,
    reference_kps: &[Keypoint],
    matches: &[Match],
    cfg: &RenderConfig,
) -> RgbImage {
    let (wq, hq) = query.dimensions();
    let (wr, hr) = reference.dimensions();
    let mut canvas = RgbImage::new(wq + wr, hq.max(hr));

    for (x, y, p) in query.enumerate_pixels() {
        canvas.put_pixel(x, y, Rgb([p[0]; 3]));
    }
    for (x, y, p) in reference.enumerate_pixels() {
        canvas.put_pixel(x + wq, y, Rgb([p[0]; 3]));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(cfg.color_seed);
    let offset = wq as f32;
    for m in matches {
        let (Some(q), Some(r)) = (query_kps.get(m.query_idx), reference_kps.get(m.train_idx))
        else {
            continue;
        };
        let color = Rgb([rng.random::<u8>(), rng.random::<u8>(), rng.random::<u8>()]);
        let start = (q.x, q.y);
        let end = (r.x + offset, r.y);

        draw_line_segment_mut(&mut canvas, start, end, color);
        draw_hollow_circle_mut(
            &mut canvas,
            (start.0.round() as i32, start.1.round() as i32),
            cfg.keypoint_radius,
            color,
        );
        draw_hollow_circle_mut(
            &mut canvas,
            (end.0.round() as i32, end.1.round() as i32),
            cfg.keypoint_radius,
            color,
        );
    }
    canvas
}

/// Anti-aliased diamond outline centred on `center`; `size` is the
/// tip-to-tip extent.
pub fn draw_diamond_marker(
    canvas: &mut RgbImage,
    center: (i32, i32),
    size: u32,
    thickness: u32,
    color: Rgb<u8>,
) {
    let half = (size / 2) as i32;
    let (cx, cy) = center;
    let tips = [
        (cx, cy.saturating_sub(half)),
        (cx.saturating_add(half), cy),
        (cx, cy.saturating_add(half)),
        (cx.saturating_sub(half), cy),
    ];

    // Thicker strokes are drawn as parallel copies of the outline
    let t = thickness.max(1) as i32;
    let lo = -(t - 1) / 2;
    let hi = t / 2;
    for oy in lo..=hi {
        for ox in lo..=hi {
            for i in 0..4 {
                let a = tips[i];
                let b = tips[(i + 1) % 4];
                draw_antialiased_line_segment_mut(
                    canvas,
                    (a.0.saturating_add(ox), a.1.saturating_add(oy)),
                    (b.0.saturating_add(ox), b.1.saturating_add(oy)),
                    color,
                    interpolate,
                );
            }
        }
    }
}

/// Match visualization with a diamond at every projected query corner.
///
/// `corners` are reference-image coordinates; they are shifted right by the
/// query width to land on the reference half of the canvas.
pub fn render_localization(
    query: &GrayImage,
    query_kps: &[Keypoint],
    reference: &GrayImage,
    reference_kps: &[Keypoint],
    matches: &[Match],
    corners: &[Point2<f32>; 4],
    cfg: &RenderConfig,
) -> RgbImage {
    let mut canvas = draw_matches(query, query_kps, reference, reference_kps, matches, cfg);
    let offset = query.width() as f32;
    let color = Rgb(cfg.marker_color);
    for corner in corners {
        let center = ((corner.x + offset) as i32, corner.y as i32);
        draw_diamond_marker(&mut canvas, center, cfg.marker_size, cfg.marker_thickness, color);
    }
    canvas
}

/// Bilinear resize to the configured display size.
pub fn resize_for_display(canvas: &RgbImage, cfg: &RenderConfig) -> RgbImage {
    imageops::resize(
        canvas,
        cfg.display_width,
        cfg.display_height,
        FilterType::Triangle,
    )
}
