//! Mock camera for use without SBIG hardware.
//!
//! Also backs the demo binary in builds without the vendor SDK, so it is
//! compiled unconditionally rather than gated to tests.

use std::time::Duration;

use chrono::Utc;

use crate::abort::AbortToken;
use crate::image::{HeaderValue, Image};
use crate::traits::{Binning, Camera, CameraError, CameraInfo, Result, Window};

/// Poll granularity of the simulated integration loop.
const ABORT_POLL: Duration = Duration::from_millis(5);

/// Test pattern types for mock frame generation.
#[derive(Debug, Clone, Copy)]
pub enum TestPattern {
    /// Horizontal ramp from dark to bright across the full 16-bit range.
    Gradient,
    /// Every pixel set to the given value.
    Flat(u16),
    /// Deterministic noise seeded by the exposure counter.
    Noise,
}

/// Mock camera producing synthetic 16-bit frames.
pub struct MockCamera {
    info: CameraInfo,
    binning: Binning,
    window: Window,
    pattern: TestPattern,
    extra_cards: Vec<(String, HeaderValue, String)>,
    fail_next: Option<CameraError>,
    exposures: u32,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCamera {
    /// Create a new mock camera with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            info: CameraInfo {
                model: "Mock SBIG".to_owned(),
                serial: "0".to_owned(),
                driver: "mock".to_owned(),
            },
            binning: Binning::UNBINNED,
            window: Window::new(0, 0, 640, 480),
            pattern: TestPattern::Gradient,
            extra_cards: Vec::new(),
            fail_next: None,
            exposures: 0,
        }
    }

    /// Set the identity reported by this mock.
    #[must_use]
    pub fn with_info(mut self, info: CameraInfo) -> Self {
        self.info = info;
        self
    }

    /// Set the initial binning factor.
    #[must_use]
    pub fn with_binning(mut self, binning: Binning) -> Self {
        self.binning = binning;
        self
    }

    /// Set the initial readout window.
    #[must_use]
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    /// Set the test pattern used for frame generation.
    #[must_use]
    pub fn with_pattern(mut self, pattern: TestPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Stamp an extra header card into every captured frame.
    #[must_use]
    pub fn with_header_card(
        mut self,
        key: &str,
        value: impl Into<HeaderValue>,
        comment: &str,
    ) -> Self {
        self.extra_cards
            .push((key.to_owned(), value.into(), comment.to_owned()));
        self
    }

    /// Make the next call to [`Camera::expose`] fail with `error`.
    pub fn fail_next_exposure(&mut self, error: CameraError) {
        self.fail_next = Some(error);
    }

    /// Number of successful exposures so far.
    #[must_use]
    pub fn exposures(&self) -> u32 {
        self.exposures
    }

    fn generate_frame(&self, width: u32, height: u32) -> Vec<u16> {
        let pixels = (width * height) as usize;
        match self.pattern {
            TestPattern::Gradient => (0..pixels)
                .map(|i| {
                    #[allow(clippy::cast_possible_truncation)]
                    let x = (i as u32) % width.max(1);
                    ramp_value(x, width)
                })
                .collect(),
            TestPattern::Flat(value) => vec![value; pixels],
            TestPattern::Noise => {
                let mut state = u64::from(self.exposures).wrapping_add(0x9E37_79B9);
                (0..pixels)
                    .map(|_| {
                        // xorshift64, deterministic per exposure
                        state ^= state << 13;
                        state ^= state >> 7;
                        state ^= state << 17;
                        #[allow(clippy::cast_possible_truncation)]
                        {
                            (state & 0xFFFF) as u16
                        }
                    })
                    .collect()
            }
        }
    }
}

/// Map column `x` of a `width`-pixel row onto the full 16-bit range.
#[allow(clippy::cast_possible_truncation)]
fn ramp_value(x: u32, width: u32) -> u16 {
    if width <= 1 {
        return 0;
    }
    ((u64::from(x) * 0xFFFF) / u64::from(width - 1)) as u16
}

impl Camera for MockCamera {
    fn info(&self) -> &CameraInfo {
        &self.info
    }

    fn binning(&self) -> Result<Binning> {
        Ok(self.binning)
    }

    fn set_binning(&mut self, binning: Binning) -> Result<()> {
        if binning.x == 0 || binning.y == 0 {
            return Err(CameraError::Unsupported(format!(
                "binning factors must be positive, got {binning}"
            )));
        }
        self.binning = binning;
        Ok(())
    }

    fn window(&self) -> Result<Window> {
        Ok(self.window)
    }

    fn set_window(&mut self, window: Window) -> Result<()> {
        if window.width == 0 || window.height == 0 {
            return Err(CameraError::Unsupported(
                "readout window must be non-empty".to_owned(),
            ));
        }
        self.window = window;
        Ok(())
    }

    fn expose(
        &mut self,
        exposure: Duration,
        open_shutter: bool,
        abort: &AbortToken,
    ) -> Result<Image> {
        if let Some(error) = self.fail_next.take() {
            return Err(error);
        }

        let start = Utc::now();

        // simulated integration, sliced so aborts are seen promptly
        let mut remaining = exposure;
        while !remaining.is_zero() {
            if abort.is_aborted() {
                return Err(CameraError::Aborted);
            }
            let step = remaining.min(ABORT_POLL);
            std::thread::sleep(step);
            remaining = remaining.saturating_sub(step);
        }
        if abort.is_aborted() {
            return Err(CameraError::Aborted);
        }

        let width = (self.window.width / self.binning.x).max(1);
        let height = (self.window.height / self.binning.y).max(1);
        let data = self.generate_frame(width, height);

        let mut image = Image::new(width, height, data);
        image.stamp_exposure_cards(
            &self.info,
            exposure,
            open_shutter,
            self.binning,
            self.window,
            start,
        );
        for (key, value, comment) in &self.extra_cards {
            image.header.set(key, value.clone(), comment);
        }

        self.exposures += 1;
        tracing::trace!(
            sequence = self.exposures,
            width,
            height,
            "mock exposure complete"
        );
        Ok(image)
    }
}
