//! Core traits and types for the SBIG camera abstraction.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::abort::AbortToken;
use crate::image::Image;

/// Binning factor: how many physical pixels are combined per reported pixel
/// on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binning {
    /// Pixels combined along the x axis.
    pub x: u32,
    /// Pixels combined along the y axis.
    pub y: u32,
}

impl Binning {
    /// Full-resolution 1x1 readout.
    pub const UNBINNED: Self = Self::new(1, 1);

    /// Create a new binning factor.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Whether this is full-resolution 1x1 readout.
    #[must_use]
    pub const fn is_unbinned(self) -> bool {
        self.x == 1 && self.y == 1
    }
}

impl Default for Binning {
    fn default() -> Self {
        Self::UNBINNED
    }
}

impl fmt::Display for Binning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

/// Error parsing a binning factor from text.
#[derive(Debug, Error)]
#[error("invalid binning {0:?}, expected the form 2x2 with positive factors")]
pub struct ParseBinningError(String);

impl FromStr for Binning {
    type Err = ParseBinningError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let err = || ParseBinningError(s.to_owned());
        let (x, y) = s.split_once(['x', 'X']).ok_or_else(err)?;
        let x: u32 = x.trim().parse().map_err(|_| err())?;
        let y: u32 = y.trim().parse().map_err(|_| err())?;
        if x == 0 || y == 0 {
            return Err(err());
        }
        Ok(Self::new(x, y))
    }
}

/// Readout sub-frame, in unbinned pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Left edge of the sub-frame.
    pub left: u32,
    /// Top edge of the sub-frame.
    pub top: u32,
    /// Sub-frame width.
    pub width: u32,
    /// Sub-frame height.
    pub height: u32,
}

impl Window {
    /// Create a new readout window.
    #[must_use]
    pub const fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Static identity of an attached camera.
#[derive(Debug, Clone, Default)]
pub struct CameraInfo {
    /// Camera model name as reported by the driver.
    pub model: String,
    /// Serial number, if the driver reports one.
    pub serial: String,
    /// Name of the driver backing this camera.
    pub driver: String,
}

/// Error type for camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// Failed to open or link to a camera.
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    /// The exposure or readout failed in the driver layer.
    #[error("exposure failed: {0}")]
    Exposure(String),
    /// The exposure was aborted via the abort token.
    #[error("exposure aborted")]
    Aborted,
    /// The vendor driver returned an error status.
    #[error("driver error {code}: {message}")]
    Driver {
        /// Raw status code from the driver.
        code: i16,
        /// Driver-provided description of the status.
        message: String,
    },
    /// The camera rejects the requested configuration.
    #[error("unsupported configuration: {0}")]
    Unsupported(String),
    /// An image failed a consistency check.
    #[error("malformed image: {0}")]
    MalformedImage(String),
    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for camera operations.
pub type Result<T> = std::result::Result<T, CameraError>;

/// Abstraction over an exposing camera.
///
/// Implementations block in [`Camera::expose`] for the duration of the
/// exposure and are expected to poll the abort token while integrating,
/// returning [`CameraError::Aborted`] promptly when it fires.
pub trait Camera {
    /// Identity of this camera.
    fn info(&self) -> &CameraInfo;

    /// Binning factor currently in effect.
    fn binning(&self) -> Result<Binning>;

    /// Select the binning factor for subsequent exposures.
    fn set_binning(&mut self, binning: Binning) -> Result<()>;

    /// Readout window currently in effect.
    fn window(&self) -> Result<Window>;

    /// Select the readout window for subsequent exposures.
    fn set_window(&mut self, window: Window) -> Result<()>;

    /// Expose a single frame and read it out.
    ///
    /// `open_shutter` selects between light and dark frames. The call blocks
    /// until the image is read out, the exposure fails, or `abort` fires.
    fn expose(
        &mut self,
        exposure: Duration,
        open_shutter: bool,
        abort: &AbortToken,
    ) -> Result<Image>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binning_display_roundtrip() {
        let binning: Binning = "3x2".parse().expect("parse should succeed");
        assert_eq!(binning, Binning::new(3, 2));
        assert_eq!(binning.to_string(), "3x2");
    }

    #[test]
    fn test_binning_parse_rejects_garbage() {
        assert!("".parse::<Binning>().is_err());
        assert!("2".parse::<Binning>().is_err());
        assert!("0x2".parse::<Binning>().is_err());
        assert!("2xtwo".parse::<Binning>().is_err());
    }

    #[test]
    fn test_binning_unbinned() {
        assert!(Binning::UNBINNED.is_unbinned());
        assert!(!Binning::new(2, 2).is_unbinned());
        assert!(!Binning::new(1, 2).is_unbinned());
    }
}
