use image::Luma;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use starloc_cli::starloc_core::GrayImage;

/// Random rectangles over a noisy background, so every window is distinctive
pub fn star_map(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut img = GrayImage::from_fn(width, height, |_, _| Luma([90]));
    for _ in 0..260 {
        let x0 = rng.random_range(0..width);
        let y0 = rng.random_range(0..height);
        let x1 = (x0 + rng.random_range(5..30)).min(width);
        let y1 = (y0 + rng.random_range(5..30)).min(height);
        let v = rng.random_range(0..=255u8);
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Luma([v]));
            }
        }
    }
    for p in img.pixels_mut() {
        let noise = rng.random_range(-6i16..=6);
        p[0] = (p[0] as i16 + noise).clamp(0, 255) as u8;
    }
    img
}
