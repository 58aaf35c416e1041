//! sbig-cam binary: capture a single gain-annotated exposure.
//!
//! Uses the mock camera unless built with the `sbig_hardware` feature, in
//! which case the first USB-attached SBIG camera is opened. Ctrl-C aborts a
//! running exposure cooperatively.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sbig_cam::{fits, AbortToken, Binning, Camera, CaptureConfig, GainAnnotated};

#[derive(Debug, Parser)]
#[command(name = "sbig-cam", about = "Capture a gain-annotated exposure from an SBIG camera")]
struct Args {
    /// Exposure time in milliseconds.
    #[arg(long)]
    exposure_ms: Option<f64>,

    /// Binning factor, e.g. 1x1 or 2x2.
    #[arg(long)]
    binning: Option<Binning>,

    /// Keep the shutter closed (dark frame).
    #[arg(long)]
    dark: bool,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the captured image to this FITS file.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run(&Args::parse()) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => CaptureConfig::load(path)?,
        None => CaptureConfig::default(),
    };
    if let Some(exposure_ms) = args.exposure_ms {
        config.exposure_ms = exposure_ms;
    }
    if let Some(binning) = args.binning {
        config.binning = binning;
    }
    if args.dark {
        config.open_shutter = false;
    }
    config.validate()?;

    let abort = AbortToken::new();
    {
        let abort = abort.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("abort requested");
            abort.trigger();
        })?;
    }

    let mut camera = GainAnnotated::with_table(open_camera()?, config.gain);
    camera.set_binning(config.binning)?;
    if let Some(window) = config.window {
        camera.set_window(window)?;
    }

    tracing::info!(
        model = %camera.info().model,
        exposure_ms = config.exposure_ms,
        binning = %config.binning,
        shutter = config.open_shutter,
        "starting exposure"
    );
    let image = camera.expose(config.exposure(), config.open_shutter, &abort)?;

    println!("Captured {}x{} image:", image.width, image.height);
    for card in image.header.iter() {
        println!("  {:<8} = {} / {}", card.key, card.value, card.comment);
    }

    if let Some(path) = &args.output {
        fits::write_image(&image, path)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

#[cfg(feature = "sbig_hardware")]
fn open_camera() -> sbig_cam::traits::Result<sbig_cam::SbigCamera> {
    sbig_cam::SbigCamera::open()
}

#[cfg(not(feature = "sbig_hardware"))]
fn open_camera() -> sbig_cam::traits::Result<sbig_cam::MockCamera> {
    Ok(sbig_cam::MockCamera::new())
}
