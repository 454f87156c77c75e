mod common;

use std::path::Path;
use std::process::{Command, Output};

use common::star_map;
use image::imageops;

const CONFIG: &str = "[orb]\nn_features = 50000\n";

/// Writes a reference, a crop of it and a config file into `dir`.
fn write_inputs(dir: &Path) {
    let reference = star_map(400, 300, 2024);
    let query = imageops::crop_imm(&reference, 120, 90, 160, 120).to_image();
    reference.save(dir.join("map.png")).unwrap();
    query.save(dir.join("crop.png")).unwrap();
    std::fs::write(dir.join("starloc.toml"), CONFIG).unwrap();
}

fn run_starloc(dir: &Path, input1: &str, input2: &str, out_dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_starloc"))
        .arg("--input1")
        .arg(dir.join(input1))
        .arg("--input2")
        .arg(dir.join(input2))
        .arg("--input3")
        .arg(dir.join("map.png"))
        .arg("--config")
        .arg(dir.join("starloc.toml"))
        .arg("--out-dir")
        .arg(out_dir)
        .arg("--no-display")
        .output()
        .unwrap()
}

#[test]
fn missing_query_fails_only_that_query() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let out = dir.path().join("out");

    let output = run_starloc(dir.path(), "missing.png", "crop.png", &out);

    assert_eq!(output.status.code(), Some(1));
    assert!(!out.join("query1_match.png").exists());
    let dims = image::image_dimensions(out.join("query2_match.png")).unwrap();
    assert_eq!(dims, (900, 600));
}

#[test]
fn both_queries_located_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let out = dir.path().join("out");

    let output = run_starloc(dir.path(), "crop.png", "crop.png", &out);

    assert!(output.status.success());
    for name in ["query1_match.png", "query2_match.png"] {
        assert_eq!(image::image_dimensions(out.join(name)).unwrap(), (900, 600));
    }
}

#[test]
fn missing_reference_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    std::fs::remove_file(dir.path().join("map.png")).unwrap();
    let out = dir.path().join("out");

    let output = run_starloc(dir.path(), "crop.png", "crop.png", &out);

    assert_eq!(output.status.code(), Some(1));
    assert!(!out.join("query1_match.png").exists());
    assert!(!out.join("query2_match.png").exists());
}
