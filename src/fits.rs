//! Minimal single-HDU FITS serialization for captured images.
//!
//! Writes standard 80-byte header cards in 2880-byte blocks followed by
//! 16-bit big-endian pixel data offset by `BZERO`, so unsigned camera
//! counts survive the signed storage format. No external FITS library is
//! required.

use std::path::Path;

use crate::image::{HeaderValue, Image};
use crate::traits::{CameraError, Result};

const BLOCK_SIZE: usize = 2880;
const CARD_SIZE: usize = 80;
const BZERO: i32 = 32768;

/// Keys written by the structural preamble; image header cards colliding
/// with them are skipped rather than duplicated.
const STRUCTURAL_KEYS: [&str; 8] = [
    "SIMPLE", "BITPIX", "NAXIS", "NAXIS1", "NAXIS2", "BZERO", "BSCALE", "END",
];

/// Serialize `image` into an in-memory FITS file.
pub fn to_bytes(image: &Image) -> Result<Vec<u8>> {
    let expected = image.width as usize * image.height as usize;
    if image.data.len() != expected {
        return Err(CameraError::MalformedImage(format!(
            "pixel buffer holds {} values, dimensions require {expected}",
            image.data.len()
        )));
    }

    let mut out = Vec::new();

    // header unit
    push_card(&mut out, "SIMPLE", &HeaderValue::Bool(true), "conforms to FITS standard");
    push_card(&mut out, "BITPIX", &HeaderValue::Int(16), "bits per data value");
    push_card(&mut out, "NAXIS", &HeaderValue::Int(2), "number of data axes");
    push_card(
        &mut out,
        "NAXIS1",
        &HeaderValue::Int(i64::from(image.width)),
        "length of data axis 1",
    );
    push_card(
        &mut out,
        "NAXIS2",
        &HeaderValue::Int(i64::from(image.height)),
        "length of data axis 2",
    );
    push_card(
        &mut out,
        "BZERO",
        &HeaderValue::Int(i64::from(BZERO)),
        "offset applied to stored values",
    );
    push_card(&mut out, "BSCALE", &HeaderValue::Int(1), "scaling of stored values");

    for card in image.header.iter() {
        if STRUCTURAL_KEYS.contains(&card.key.as_str()) {
            continue;
        }
        push_card(&mut out, &card.key, &card.value, &card.comment);
    }

    push_end_card(&mut out);
    pad_to_block(&mut out, b' ');

    // data unit: big-endian signed 16-bit, offset so 0 ADU maps to -32768
    for &px in &image.data {
        #[allow(clippy::cast_possible_truncation)]
        let stored = (i32::from(px) - BZERO) as i16;
        out.extend_from_slice(&stored.to_be_bytes());
    }
    pad_to_block(&mut out, 0);

    Ok(out)
}

/// Write `image` to `path` as a FITS file.
pub fn write_image(image: &Image, path: &Path) -> Result<()> {
    let bytes = to_bytes(image)?;
    std::fs::write(path, bytes)?;
    tracing::debug!(path = %path.display(), "wrote FITS image");
    Ok(())
}

fn push_card(out: &mut Vec<u8>, key: &str, value: &HeaderValue, comment: &str) {
    let mut card = format!("{:<8}= {}", truncate(key, 8), format_value(value));
    if !comment.is_empty() {
        card.push_str(" / ");
        card.push_str(comment);
    }
    push_padded(out, &card);
}

fn push_end_card(out: &mut Vec<u8>) {
    push_padded(out, "END");
}

/// Pad or truncate `card` to exactly one 80-byte record.
fn push_padded(out: &mut Vec<u8>, card: &str) {
    let mut bytes: Vec<u8> = card.bytes().take(CARD_SIZE).collect();
    bytes.resize(CARD_SIZE, b' ');
    out.extend_from_slice(&bytes);
}

fn pad_to_block(out: &mut Vec<u8>, fill: u8) {
    let remainder = out.len() % BLOCK_SIZE;
    if remainder != 0 {
        out.resize(out.len() + BLOCK_SIZE - remainder, fill);
    }
}

fn truncate(key: &str, max: usize) -> &str {
    if key.len() > max {
        &key[..max]
    } else {
        key
    }
}

/// Format a value into the fixed 20-column value field. Strings are quoted
/// and left-justified; everything else is right-justified per the standard.
fn format_value(value: &HeaderValue) -> String {
    match value {
        HeaderValue::Bool(true) => format!("{:>20}", "T"),
        HeaderValue::Bool(false) => format!("{:>20}", "F"),
        HeaderValue::Int(v) => format!("{v:>20}"),
        HeaderValue::Float(v) => format!("{:>20}", format_float(*v)),
        HeaderValue::Str(v) => {
            let escaped = v.replace('\'', "''");
            format!("{:<20}", format!("'{escaped:<8}'"))
        }
    }
}

/// Render a real value with an explicit decimal point, as FITS requires.
fn format_float(v: f64) -> String {
    let rendered = format!("{v}");
    if rendered.contains('.') || rendered.contains('e') || rendered.contains('E') {
        rendered
    } else {
        format!("{rendered}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gain::{GAIN_COMMENT, GAIN_KEY};

    fn sample_image() -> Image {
        let mut image = Image::new(4, 2, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        image.header.set(GAIN_KEY, 1.4, GAIN_COMMENT);
        image
    }

    #[test]
    fn test_output_is_block_aligned() {
        let bytes = to_bytes(&sample_image()).expect("serialization failed");
        assert!(bytes.len() >= 2 * BLOCK_SIZE);
        assert_eq!(bytes.len() % BLOCK_SIZE, 0);
    }

    #[test]
    fn test_preamble_and_gain_card() {
        let bytes = to_bytes(&sample_image()).expect("serialization failed");
        let header = String::from_utf8_lossy(&bytes[..BLOCK_SIZE]);

        assert!(header.starts_with("SIMPLE  ="));
        assert!(header.contains("BITPIX  ="));
        assert!(header.contains("DET-GAIN="));
        assert!(header.contains("1.4 / Detector gain [e-/ADU]"));
        assert!(header.contains("END"));
    }

    #[test]
    fn test_pixel_encoding_uses_bzero_offset() {
        let image = Image::new(1, 1, vec![32768]);
        let bytes = to_bytes(&image).expect("serialization failed");

        // 32768 ADU stores as 0 once BZERO is subtracted
        let data = &bytes[BLOCK_SIZE..BLOCK_SIZE + 2];
        assert_eq!(data, &[0, 0]);
    }

    #[test]
    fn test_structural_keys_not_duplicated() {
        let mut image = sample_image();
        image.header.set("BITPIX", 8_i64, "bogus");
        let bytes = to_bytes(&image).expect("serialization failed");
        let header = String::from_utf8_lossy(&bytes[..BLOCK_SIZE]);

        assert_eq!(header.matches("BITPIX  =").count(), 1);
    }

    #[test]
    fn test_mismatched_buffer_rejected() {
        let image = Image::new(4, 4, vec![0; 3]);
        assert!(matches!(
            to_bytes(&image),
            Err(CameraError::MalformedImage(_))
        ));
    }

    #[test]
    fn test_float_formatting_keeps_decimal_point() {
        assert_eq!(format_float(1.4), "1.4");
        assert_eq!(format_float(32768.0), "32768.0");
    }
}
