//! Integration tests against a physical SBIG camera.
//!
//! These tests require:
//! - The `sbig_hardware` feature: `cargo test --features sbig_hardware`
//! - The vendor SBIGUDrv driver installed (see sbigudrv-sys)
//! - A camera attached via USB
//!
//! The driver owns a single global device handle, so the tests are
//! serialized. They will fail, not silently skip, if no camera responds.

#![cfg(feature = "sbig_hardware")]

use std::time::Duration;

use serial_test::serial;

use sbig_cam::validation::{validate_baseline_header, validate_dimensions};
use sbig_cam::{AbortToken, Binning, Camera, GainAnnotated, HeaderValue, SbigCamera, GAIN_KEY};

#[test]
#[serial]
fn test_open_and_identify() {
    let camera = SbigCamera::open().expect("failed to open SBIG camera");

    let info = camera.info();
    assert!(!info.model.is_empty(), "camera should report a model name");
    assert_eq!(info.driver, "sbigudrv");

    let full = camera.full_frame();
    assert!(full.width > 0 && full.height > 0, "imaging area missing");
    println!("Camera: {} ({}x{})", info.model, full.width, full.height);
}

#[test]
#[serial]
fn test_unsupported_binning_rejected() {
    let mut camera = SbigCamera::open().expect("failed to open SBIG camera");
    assert!(camera.set_binning(Binning::new(5, 5)).is_err());
    assert!(camera.set_binning(Binning::new(2, 2)).is_ok());
}

#[test]
#[serial]
fn test_short_dark_frame_is_annotated() {
    let camera = SbigCamera::open().expect("failed to open SBIG camera");
    let mut camera = GainAnnotated::new(camera);
    camera
        .set_binning(Binning::new(2, 2))
        .expect("set_binning failed");

    let window = camera.window().expect("window query failed");
    let image = camera
        .expose(Duration::from_millis(100), false, &AbortToken::new())
        .expect("dark frame failed");

    validate_dimensions(&image, window, Binning::new(2, 2)).expect("dimension check failed");
    validate_baseline_header(&image).expect("header check failed");
    assert_eq!(image.header.get(GAIN_KEY), Some(&HeaderValue::Float(2.3)));
}

#[test]
#[serial]
fn test_abort_long_exposure() {
    let camera = SbigCamera::open().expect("failed to open SBIG camera");
    let mut camera = GainAnnotated::new(camera);

    let abort = AbortToken::new();
    let trigger = abort.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(500));
        trigger.trigger();
    });

    let result = camera.expose(Duration::from_secs(120), false, &abort);
    handle.join().expect("trigger thread panicked");

    assert!(result.is_err(), "aborted exposure must not return an image");
}
