mod common;

use common::star_map;
use image::{imageops, Luma};
use starloc_cli::starloc_core::{GrayImage, LocateConfig, OrbConfig};
use starloc_cli::{render_localization, resize_for_display, LocateError, OrbLocator};
use starloc_geometry::GeometryError;

fn test_config() -> LocateConfig {
    LocateConfig {
        orb: OrbConfig {
            n_features: 50_000,
            ..OrbConfig::default()
        },
        ..LocateConfig::default()
    }
}

#[test]
fn cropped_patch_is_found_at_its_offset() {
    let reference = star_map(400, 300, 2024);
    let (dx, dy, w, h) = (120u32, 90u32, 160u32, 120u32);
    let query = imageops::crop_imm(&reference, dx, dy, w, h).to_image();

    let cfg = test_config();
    let locator = OrbLocator::orb(&cfg).unwrap();
    let reference_features = locator.extract(&reference).unwrap();
    let located = locator.locate(&query, &reference_features).unwrap();

    assert!(located.matches.len() >= 4);
    assert!(located.localization.inliers.len() >= 4);

    let expected = [
        (dx as f32, dy as f32),
        ((dx + w) as f32, dy as f32),
        ((dx + w) as f32, (dy + h) as f32),
        (dx as f32, (dy + h) as f32),
    ];
    for (corner, (ex, ey)) in located.localization.corners.iter().zip(expected) {
        assert!(
            (corner.x - ex).abs() <= 2.0 && (corner.y - ey).abs() <= 2.0,
            "corner ({:.2}, {:.2}) too far from ({ex}, {ey})",
            corner.x,
            corner.y
        );
    }

    let canvas = render_localization(
        &query,
        located.features.keypoints(),
        &reference,
        reference_features.keypoints(),
        &located.matches,
        &located.localization.corners,
        &cfg.render,
    );
    assert_eq!(canvas.dimensions(), (w + 400, 300));
    assert_eq!(resize_for_display(&canvas, &cfg.render).dimensions(), (900, 600));
}

#[test]
fn featureless_query_has_insufficient_matches() {
    let reference = star_map(320, 240, 7);
    let query = GrayImage::from_pixel(120, 100, Luma([128]));

    let locator = OrbLocator::orb(&test_config()).unwrap();
    let reference_features = locator.extract(&reference).unwrap();
    match locator.locate(&query, &reference_features) {
        Err(LocateError::Geometry(GeometryError::InsufficientMatches { found, required })) => {
            assert_eq!(found, 0);
            assert_eq!(required, 4);
        }
        other => panic!("expected InsufficientMatches, got {other:?}"),
    }
}

#[test]
fn invalid_configuration_is_rejected() {
    let mut cfg = LocateConfig::default();
    cfg.matcher.ratio = 1.5;
    assert!(matches!(OrbLocator::orb(&cfg), Err(LocateError::Config(_))));
}
