//! Image sanity checks for captured frames.
//!
//! Validates captured images against the camera configuration and against
//! the mock test patterns. Used by the integration tests to verify the
//! capture path end to end.

use crate::image::Image;
use crate::traits::{Binning, CameraError, Result, Window};

/// Baseline header cards every exposure is expected to carry.
const REQUIRED_CARDS: [&str; 6] = [
    "EXPTIME", "DATE-OBS", "INSTRUME", "IMAGETYP", "XBINNING", "YBINNING",
];

/// Minimum pixel range for a frame to count as a gradient rather than a
/// flat field.
const MIN_GRADIENT_RANGE: u16 = 1000;

/// Validates that an image's dimensions match the window and binning that
/// produced it.
///
/// # Errors
///
/// Returns `MalformedImage` if the binned window does not match the image
/// dimensions or the pixel buffer length disagrees with them.
pub fn validate_dimensions(image: &Image, window: Window, binning: Binning) -> Result<()> {
    let expected_width = (window.width / binning.x).max(1);
    let expected_height = (window.height / binning.y).max(1);

    if image.width != expected_width || image.height != expected_height {
        return Err(CameraError::MalformedImage(format!(
            "image is {}x{}, window {}x{} at binning {binning} implies {expected_width}x{expected_height}",
            image.width, image.height, window.width, window.height
        )));
    }

    let expected_len = expected_width as usize * expected_height as usize;
    if image.data.len() != expected_len {
        return Err(CameraError::MalformedImage(format!(
            "pixel buffer holds {} values, expected {expected_len}",
            image.data.len()
        )));
    }

    Ok(())
}

/// Validates that the baseline exposure cards are present in the header.
///
/// # Errors
///
/// Returns `MalformedImage` naming the first missing card.
pub fn validate_baseline_header(image: &Image) -> Result<()> {
    for key in REQUIRED_CARDS {
        if !image.header.contains(key) {
            return Err(CameraError::MalformedImage(format!(
                "missing baseline header card {key}"
            )));
        }
    }
    Ok(())
}

/// Validates that a frame contains a left-to-right gradient.
///
/// Samples the middle row and checks that pixel values never decrease and
/// span a significant range.
///
/// # Errors
///
/// Returns `MalformedImage` if the row decreases anywhere or the overall
/// range is too small to be a gradient.
pub fn validate_gradient(image: &Image) -> Result<()> {
    let y = image.height / 2;
    let mut prev: Option<u16> = None;

    for x in 0..image.width {
        let px = image.pixel_at(x, y).ok_or_else(|| {
            CameraError::MalformedImage(format!("missing pixel at ({x}, {y})"))
        })?;
        if let Some(prev) = prev {
            if px < prev {
                return Err(CameraError::MalformedImage(format!(
                    "gradient not monotonic at x={x}: {px} < {prev}"
                )));
            }
        }
        prev = Some(px);
    }

    let first = image.pixel_at(0, y).unwrap_or_default();
    let last = image.pixel_at(image.width - 1, y).unwrap_or_default();
    if last.saturating_sub(first) < MIN_GRADIENT_RANGE {
        return Err(CameraError::MalformedImage(format!(
            "pixel range {} too small for a gradient",
            last.saturating_sub(first)
        )));
    }

    Ok(())
}

/// Validates that a frame is a flat field at `value`.
///
/// # Errors
///
/// Returns `MalformedImage` at the first deviating pixel.
pub fn validate_flat(image: &Image, value: u16) -> Result<()> {
    for (i, &px) in image.data.iter().enumerate() {
        if px != value {
            return Err(CameraError::MalformedImage(format!(
                "pixel {i} is {px}, expected flat value {value}"
            )));
        }
    }
    Ok(())
}
