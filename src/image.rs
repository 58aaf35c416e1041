//! Captured images and their FITS-style headers.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::traits::{Binning, CameraInfo, Window};

/// A single header value.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    /// FITS logical value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Character string value.
    Str(String),
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => write!(f, "T"),
            Self::Bool(false) => write!(f, "F"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for HeaderValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for HeaderValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for HeaderValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// One header entry: key, value and comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Header keyword.
    pub key: String,
    /// Value stored under the keyword.
    pub value: HeaderValue,
    /// Human-readable comment for the keyword.
    pub comment: String,
}

/// Ordered key to (value, comment) mapping in the FITS convention.
///
/// Insertion order is preserved; setting an existing key replaces its value
/// and comment in place without moving the card.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    /// Create an empty header.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value` with the given comment.
    ///
    /// An existing card for `key` is overwritten in place, keeping its slot
    /// in the card order; otherwise the card is appended.
    pub fn set(&mut self, key: &str, value: impl Into<HeaderValue>, comment: &str) {
        let value = value.into();
        if let Some(card) = self.cards.iter_mut().find(|card| card.key == key) {
            card.value = value;
            card.comment = comment.to_owned();
        } else {
            self.cards.push(Card {
                key: key.to_owned(),
                value,
                comment: comment.to_owned(),
            });
        }
    }

    /// Value stored under `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.cards
            .iter()
            .find(|card| card.key == key)
            .map(|card| &card.value)
    }

    /// Comment stored under `key`, if present.
    #[must_use]
    pub fn comment(&self, key: &str) -> Option<&str> {
        self.cards
            .iter()
            .find(|card| card.key == key)
            .map(|card| card.comment.as_str())
    }

    /// Whether the header contains `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.cards.iter().any(|card| card.key == key)
    }

    /// Iterate over the cards in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// Number of cards in the header.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the header is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// A captured frame: 16-bit pixel buffer plus header.
#[derive(Debug, Clone)]
pub struct Image {
    /// Frame width in binned pixels.
    pub width: u32,
    /// Frame height in binned pixels.
    pub height: u32,
    /// Row-major pixel data, `width * height` elements.
    pub data: Vec<u16>,
    /// FITS-style metadata attached to the frame.
    pub header: Header,
}

impl Image {
    /// Create an image from raw pixel data with an empty header.
    #[must_use]
    pub fn new(width: u32, height: u32, data: Vec<u16>) -> Self {
        Self {
            width,
            height,
            data,
            header: Header::new(),
        }
    }

    /// Pixel value at `(x, y)`, bounds-checked.
    #[must_use]
    pub fn pixel_at(&self, x: u32, y: u32) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) as usize).copied()
    }

    /// Stamp the baseline exposure cards every capture carries.
    ///
    /// Called by camera implementations once readout completes; `start` is
    /// the UTC time integration began.
    pub fn stamp_exposure_cards(
        &mut self,
        info: &CameraInfo,
        exposure: Duration,
        open_shutter: bool,
        binning: Binning,
        window: Window,
        start: DateTime<Utc>,
    ) {
        let date_obs = start.format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
        self.header
            .set("EXPTIME", exposure.as_secs_f64(), "Exposure time [s]");
        self.header
            .set("DATE-OBS", date_obs, "UTC start of exposure");
        self.header
            .set("INSTRUME", info.model.as_str(), "Camera model");
        self.header
            .set("IMAGETYP", if open_shutter { "light" } else { "dark" }, "Frame type");
        self.header.set("XBINNING", binning.x, "Binning factor x");
        self.header.set("YBINNING", binning.y, "Binning factor y");
        self.header
            .set("XORGSUBF", window.left, "Sub-frame origin x");
        self.header.set("YORGSUBF", window.top, "Sub-frame origin y");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_preserves_insertion_order() {
        let mut header = Header::new();
        header.set("ALPHA", 1_i64, "first");
        header.set("BETA", 2_i64, "second");
        header.set("GAMMA", 3_i64, "third");

        let keys: Vec<&str> = header.iter().map(|card| card.key.as_str()).collect();
        assert_eq!(keys, ["ALPHA", "BETA", "GAMMA"]);
    }

    #[test]
    fn test_header_set_replaces_in_place() {
        let mut header = Header::new();
        header.set("ALPHA", 1_i64, "first");
        header.set("BETA", 2_i64, "second");
        header.set("ALPHA", 9_i64, "updated");

        let keys: Vec<&str> = header.iter().map(|card| card.key.as_str()).collect();
        assert_eq!(keys, ["ALPHA", "BETA"], "overwrite must keep the slot");
        assert_eq!(header.get("ALPHA"), Some(&HeaderValue::Int(9)));
        assert_eq!(header.comment("ALPHA"), Some("updated"));
    }

    #[test]
    fn test_pixel_at_bounds() {
        let image = Image::new(2, 2, vec![10, 20, 30, 40]);
        assert_eq!(image.pixel_at(0, 0), Some(10));
        assert_eq!(image.pixel_at(1, 1), Some(40));
        assert_eq!(image.pixel_at(2, 0), None);
        assert_eq!(image.pixel_at(0, 2), None);
    }

    #[test]
    fn test_stamp_exposure_cards() {
        let mut image = Image::new(1, 1, vec![0]);
        let info = CameraInfo {
            model: "SBIG STX-6303E".to_owned(),
            ..CameraInfo::default()
        };
        image.stamp_exposure_cards(
            &info,
            Duration::from_millis(1500),
            false,
            Binning::new(2, 2),
            Window::new(0, 0, 64, 64),
            Utc::now(),
        );

        assert_eq!(image.header.get("EXPTIME"), Some(&HeaderValue::Float(1.5)));
        assert_eq!(
            image.header.get("IMAGETYP"),
            Some(&HeaderValue::Str("dark".to_owned()))
        );
        assert_eq!(image.header.get("XBINNING"), Some(&HeaderValue::Int(2)));
        assert!(image.header.contains("DATE-OBS"));
    }
}
