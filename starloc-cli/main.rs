use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use image::RgbImage;
use log::{debug, error, info};
#[cfg(not(feature = "viewer"))]
use log::warn;
use starloc_cli::starloc_core::{init_thread_pool, Features, GrayImage, LocateConfig};
use starloc_cli::{
    load_grayscale, render_localization, resize_for_display, LocateError, LocateResult,
    OrbLocator,
};

/// Locate cropped patches of a star map inside the full image
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to query image 1
    #[arg(long)]
    input1: PathBuf,
    /// Path to query image 2
    #[arg(long)]
    input2: PathBuf,
    /// Path to the reference (star map) image
    #[arg(long)]
    input3: PathBuf,
    /// Pipeline configuration (.toml or .json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also write query1_match.png and query2_match.png to this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Do not open the match windows
    #[arg(long)]
    no_display: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every query was located.
fn run(args: &Args) -> LocateResult<bool> {
    let cfg = load_config(args.config.as_deref())?;
    info!("{}", cfg.summary());
    if let Err(e) = init_thread_pool(cfg.n_threads) {
        debug!("thread pool already initialised: {e}");
    }

    let t0 = Instant::now();
    let locator = OrbLocator::orb(&cfg)?;
    let reference = load_grayscale(&args.input3)?;
    let reference_features = locator.extract(&reference)?;

    let queries = [(1, &args.input1), (2, &args.input2)];
    let mut outputs = Vec::with_capacity(queries.len());
    let mut all_ok = true;
    for (n, path) in queries {
        match process_query(&locator, path, &reference, &reference_features, &cfg) {
            Ok(canvas) => outputs.push((n, canvas)),
            // load failures are already reported by the loader
            Err(LocateError::ImageLoad { .. }) => {
                error!("query image {n} skipped");
                all_ok = false;
            }
            Err(e) => {
                error!("query image {n} ({}): {e}", path.display());
                all_ok = false;
            }
        }
    }
    info!("pipeline finished in {:.2?}", t0.elapsed());

    present(outputs, args.out_dir.as_deref(), !args.no_display)?;
    Ok(all_ok)
}

fn process_query(
    locator: &OrbLocator,
    path: &Path,
    reference: &GrayImage,
    reference_features: &Features,
    cfg: &LocateConfig,
) -> LocateResult<RgbImage> {
    let query = load_grayscale(path)?;
    let located = locator.locate(&query, reference_features)?;
    let canvas = render_localization(
        &query,
        located.features.keypoints(),
        reference,
        reference_features.keypoints(),
        &located.matches,
        &located.localization.corners,
        &cfg.render,
    );
    Ok(resize_for_display(&canvas, &cfg.render))
}

#[cfg(feature = "serde")]
fn load_config(path: Option<&Path>) -> LocateResult<LocateConfig> {
    match path {
        Some(path) => {
            info!("loading configuration from {}", path.display());
            Ok(LocateConfig::load(path)?)
        }
        None => Ok(LocateConfig::default()),
    }
}

#[cfg(not(feature = "serde"))]
fn load_config(path: Option<&Path>) -> LocateResult<LocateConfig> {
    match path {
        Some(_) => Err(LocateError::Config(
            "configuration files require the `serde` feature".to_string(),
        )),
        None => Ok(LocateConfig::default()),
    }
}

fn write_outputs(outputs: &[(usize, RgbImage)], dir: &Path) -> LocateResult<()> {
    std::fs::create_dir_all(dir)?;
    for (n, canvas) in outputs {
        let path = dir.join(format!("query{n}_match.png"));
        canvas.save(&path).map_err(LocateError::Image)?;
        info!("saved {}", path.display());
    }
    Ok(())
}

#[cfg(feature = "viewer")]
fn present(
    outputs: Vec<(usize, RgbImage)>,
    out_dir: Option<&Path>,
    display: bool,
) -> LocateResult<()> {
    if let Some(dir) = out_dir {
        write_outputs(&outputs, dir)?;
    }
    if !display {
        return Ok(());
    }
    let panels = outputs
        .into_iter()
        .map(|(n, canvas)| (format!("Query Image {n} Match"), canvas))
        .collect();
    starloc_cli::viewer::show(panels)
}

#[cfg(not(feature = "viewer"))]
fn present(
    outputs: Vec<(usize, RgbImage)>,
    out_dir: Option<&Path>,
    display: bool,
) -> LocateResult<()> {
    if display {
        warn!("built without the `viewer` feature, match windows are unavailable");
    }
    match out_dir {
        Some(dir) => write_outputs(&outputs, dir),
        None => Ok(()),
    }
}
