//! End-to-end tests of the capture pipeline against the mock camera:
//! configure, expose through the gain decorator, validate the result and
//! serialize it to FITS.

use std::time::Duration;

use sbig_cam::mock::TestPattern;
use sbig_cam::validation::{validate_baseline_header, validate_dimensions, validate_gradient};
use sbig_cam::{
    fits, AbortToken, Binning, Camera, CameraError, GainAnnotated, HeaderValue, MockCamera,
    Window, GAIN_COMMENT, GAIN_KEY,
};

fn annotated_camera(window: Window, binning: Binning) -> GainAnnotated<MockCamera> {
    let mut camera = GainAnnotated::new(MockCamera::new().with_window(window));
    camera.set_binning(binning).expect("set_binning failed");
    camera
}

#[test]
fn test_unbinned_capture_is_annotated() {
    let window = Window::new(0, 0, 64, 48);
    let mut camera = annotated_camera(window, Binning::UNBINNED);

    let image = camera
        .expose(Duration::from_millis(10), true, &AbortToken::new())
        .expect("exposure failed");

    validate_dimensions(&image, window, Binning::UNBINNED).expect("dimension check failed");
    validate_baseline_header(&image).expect("header check failed");
    assert_eq!(image.header.get(GAIN_KEY), Some(&HeaderValue::Float(1.4)));
    assert_eq!(image.header.comment(GAIN_KEY), Some(GAIN_COMMENT));
}

#[test]
fn test_binned_capture_is_annotated() {
    let window = Window::new(0, 0, 64, 48);
    let mut camera = annotated_camera(window, Binning::new(2, 2));

    let image = camera
        .expose(Duration::from_millis(10), true, &AbortToken::new())
        .expect("exposure failed");

    validate_dimensions(&image, window, Binning::new(2, 2)).expect("dimension check failed");
    assert_eq!(image.header.get(GAIN_KEY), Some(&HeaderValue::Float(2.3)));
}

#[test]
fn test_gradient_pattern_survives_pipeline() {
    let mut camera = annotated_camera(Window::new(0, 0, 64, 8), Binning::UNBINNED);
    let image = camera
        .expose(Duration::ZERO, true, &AbortToken::new())
        .expect("exposure failed");

    validate_gradient(&image).expect("gradient check failed");
}

#[test]
fn test_failed_exposure_reaches_caller_unchanged() {
    let mut camera = annotated_camera(Window::new(0, 0, 16, 16), Binning::UNBINNED);
    camera
        .inner_mut()
        .fail_next_exposure(CameraError::Exposure("link dropped".to_owned()));

    let err = camera
        .expose(Duration::ZERO, true, &AbortToken::new())
        .expect_err("exposure should fail");
    assert!(matches!(err, CameraError::Exposure(ref msg) if msg == "link dropped"));
}

#[test]
fn test_abort_token_stops_long_exposure() {
    let mut camera = annotated_camera(Window::new(0, 0, 16, 16), Binning::UNBINNED);
    let abort = AbortToken::new();

    let trigger = abort.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        trigger.trigger();
    });

    let started = std::time::Instant::now();
    let err = camera
        .expose(Duration::from_secs(30), true, &abort)
        .expect_err("exposure should abort");
    handle.join().expect("trigger thread panicked");

    assert!(matches!(err, CameraError::Aborted));
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "abort must take effect promptly, took {:?}",
        started.elapsed()
    );
}

#[test]
fn test_fits_file_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let path = dir.path().join("capture.fits");

    let mut camera = annotated_camera(Window::new(0, 0, 32, 32), Binning::new(2, 2));
    let image = camera
        .expose(Duration::ZERO, false, &AbortToken::new())
        .expect("exposure failed");

    fits::write_image(&image, &path).expect("FITS write failed");

    let bytes = std::fs::read(&path).expect("FITS read failed");
    assert_eq!(bytes.len() % 2880, 0, "FITS files are block-aligned");

    let header = String::from_utf8_lossy(&bytes[..2880]);
    assert!(header.starts_with("SIMPLE  ="));
    assert!(header.contains("DET-GAIN="));
    assert!(header.contains("2.3 / Detector gain [e-/ADU]"));
    assert!(header.contains("IMAGETYP= 'dark"));
}

#[test]
fn test_flat_frame_statistics() {
    let mock = MockCamera::new()
        .with_window(Window::new(0, 0, 16, 16))
        .with_pattern(TestPattern::Flat(4000));
    let mut camera = GainAnnotated::new(mock);

    let image = camera
        .expose(Duration::ZERO, true, &AbortToken::new())
        .expect("exposure failed");
    sbig_cam::validation::validate_flat(&image, 4000).expect("flat check failed");
}
