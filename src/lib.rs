//! sbig-cam: a capture library for SBIG astronomical CCD cameras.
//!
//! This library provides trait-based abstractions over the SBIG Universal
//! Driver, a mock camera for hardware-free use, and a decorator that stamps
//! the detector gain matching the binning in effect into every captured
//! image's FITS-style header.

pub mod abort;
pub mod config;
pub mod fits;
pub mod gain;
pub mod image;
pub mod mock;
pub mod traits;
pub mod validation;

#[cfg(feature = "sbig_hardware")]
pub mod driver;

pub use abort::AbortToken;
pub use config::CaptureConfig;
pub use gain::{GainAnnotated, GainTable, GAIN_COMMENT, GAIN_KEY};
pub use image::{Card, Header, HeaderValue, Image};
pub use mock::MockCamera;
pub use traits::{Binning, Camera, CameraError, CameraInfo, Window};

#[cfg(feature = "sbig_hardware")]
pub use driver::SbigCamera;
