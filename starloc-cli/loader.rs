use std::path::Path;

use image::error::{LimitError, LimitErrorKind};
use image::ImageError;
use log::{error, info};
use starloc_core::GrayImage;

use crate::error::{LocateError, LocateResult};

/// Reads `path` and converts it to 8-bit grayscale.
pub fn load_grayscale<P: AsRef<Path>>(path: P) -> LocateResult<GrayImage> {
    let path = path.as_ref();
    let decoded = image::open(path).and_then(|img| {
        if img.width() == 0 || img.height() == 0 {
            Err(ImageError::Limits(LimitError::from_kind(
                LimitErrorKind::DimensionError,
            )))
        } else {
            Ok(img.to_luma8())
        }
    });

    match decoded {
        Ok(img) => {
            info!(
                "image loaded: {} ({}x{})",
                path.display(),
                img.width(),
                img.height()
            );
            Ok(img)
        }
        Err(source) => {
            error!("image {} cannot be loaded: {}", path.display(), source);
            Err(LocateError::ImageLoad {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn png_round_trips_as_grayscale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patch.png");
        let img = GrayImage::from_fn(24, 16, |x, y| Luma([(x * 10 + y) as u8]));
        img.save(&path).unwrap();

        let loaded = load_grayscale(&path).unwrap();
        assert_eq!(loaded.dimensions(), (24, 16));
        assert_eq!(loaded, img);
    }

    #[test]
    fn colour_images_are_converted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colour.png");
        image::RgbImage::from_pixel(8, 8, image::Rgb([200, 200, 200]))
            .save(&path)
            .unwrap();
        let loaded = load_grayscale(&path).unwrap();
        assert_eq!(loaded.get_pixel(3, 3)[0], 200);
    }

    #[test]
    fn missing_file_is_an_image_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");
        match load_grayscale(&path) {
            Err(LocateError::ImageLoad { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected ImageLoad, got {other:?}"),
        }
    }

    #[test]
    fn non_image_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(
            load_grayscale(&path),
            Err(LocateError::ImageLoad { .. })
        ));
    }
}
