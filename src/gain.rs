//! Detector gain annotation for captured images.
//!
//! The readout chain of the STX-6303E head digitizes with a different gain
//! once pixels are binned, so the calibration value stamped into each image
//! has to match the binning in effect at exposure time.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::abort::AbortToken;
use crate::image::Image;
use crate::traits::{Binning, Camera, CameraInfo, Result, Window};

/// Header keyword written by [`GainAnnotated`].
pub const GAIN_KEY: &str = "DET-GAIN";

/// Header comment written alongside the gain value.
pub const GAIN_COMMENT: &str = "Detector gain [e-/ADU]";

/// Gain values in electrons per ADU, keyed by binning class.
///
/// Two classes are known for this head: unbinned readout and everything
/// else. The lookup is total, so every binning pair maps to a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainTable {
    /// Gain for unbinned (1x1) readout.
    pub unbinned: f64,
    /// Gain for any binned readout.
    pub binned: f64,
}

impl Default for GainTable {
    fn default() -> Self {
        // STX-6303E calibration
        Self {
            unbinned: 1.4,
            binned: 2.3,
        }
    }
}

impl GainTable {
    /// Create a gain table from explicit calibration values.
    #[must_use]
    pub const fn new(unbinned: f64, binned: f64) -> Self {
        Self { unbinned, binned }
    }

    /// Gain for the given binning factor.
    #[must_use]
    pub fn gain_for(&self, binning: Binning) -> f64 {
        if binning.is_unbinned() {
            self.unbinned
        } else {
            self.binned
        }
    }
}

/// Decorator that stamps the detector gain into every captured image.
///
/// Wraps any [`Camera`]; the exposure itself is delegated unchanged, then the
/// gain matching the camera's current binning is written under
/// [`GAIN_KEY`]. A failed exposure is propagated as-is with no header
/// mutation and no retry.
pub struct GainAnnotated<C> {
    inner: C,
    table: GainTable,
}

impl<C: Camera> GainAnnotated<C> {
    /// Wrap a camera with the default gain table.
    #[must_use]
    pub fn new(inner: C) -> Self {
        Self::with_table(inner, GainTable::default())
    }

    /// Wrap a camera with an explicit gain table.
    #[must_use]
    pub const fn with_table(inner: C, table: GainTable) -> Self {
        Self { inner, table }
    }

    /// The wrapped camera.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Mutable access to the wrapped camera.
    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Unwrap, returning the inner camera.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Camera> Camera for GainAnnotated<C> {
    fn info(&self) -> &CameraInfo {
        self.inner.info()
    }

    fn binning(&self) -> Result<Binning> {
        self.inner.binning()
    }

    fn set_binning(&mut self, binning: Binning) -> Result<()> {
        self.inner.set_binning(binning)
    }

    fn window(&self) -> Result<Window> {
        self.inner.window()
    }

    fn set_window(&mut self, window: Window) -> Result<()> {
        self.inner.set_window(window)
    }

    fn expose(
        &mut self,
        exposure: Duration,
        open_shutter: bool,
        abort: &AbortToken,
    ) -> Result<Image> {
        let mut image = self.inner.expose(exposure, open_shutter, abort)?;

        // gain differs in binned images
        let binning = self.inner.binning()?;
        let gain = self.table.gain_for(binning);
        tracing::debug!(%binning, gain, "annotating detector gain");
        image.header.set(GAIN_KEY, gain, GAIN_COMMENT);

        Ok(image)
    }
}
