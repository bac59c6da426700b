//! # Raster Preparation
//!
//! Turns pixel sources into the `(row_width, packed bytes)` payloads that
//! [`Printer::print_image`](crate::printer::Printer::print_image) consumes.
//! Everything protocol- or timing-related stays out of this module; it only
//! produces bitmap bytes.
//!
//! ## Payload Format
//!
//! Rows are packed MSB-first, one bit per dot, with inverted polarity:
//! a **0 bit prints ink**, a 1 bit leaves the paper blank. Rows are padded
//! to whole bytes with blank bits.
//!
//! ## Grayscale Conversion
//!
//! Continuous-tone images are thresholded with Bayer 8×8 ordered dithering:
//! deterministic, no error diffusion, and the regular halftone pattern suits
//! thermal heads well.

use image::DynamicImage;
use qrcode::{Color, QrCode};

use crate::error::BrasaError;
use crate::printer::{DOTS_PER_LINE, MAX_ROW_BYTES};

/// A packed monochrome bitmap ready for `print_image`.
///
/// Invariant: `data.len()` is a multiple of `row_width`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    /// Row width in bytes
    pub row_width: u8,
    /// `height * row_width` packed bytes, top row first, 0-bit = ink
    pub data: Vec<u8>,
}

impl Raster {
    /// Height in dot rows.
    pub fn height(&self) -> usize {
        self.data.len() / self.row_width as usize
    }
}

/// Bayer 8×8 threshold matrix, values 0-63.
#[rustfmt::skip]
const BAYER_8X8: [[u8; 8]; 8] = [
    [ 0, 32,  8, 40,  2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44,  4, 36, 14, 46,  6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [ 3, 35, 11, 43,  1, 33,  9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47,  7, 39, 13, 45,  5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Whether the dot at (x, y) with the given darkness (0.0 = white,
/// 1.0 = black) should print ink.
fn should_ink(x: u32, y: u32, darkness: f32) -> bool {
    let threshold =
        (BAYER_8X8[(y % 8) as usize][(x % 8) as usize] as f32 + 0.5) / 64.0;
    darkness > threshold
}

/// Load an image file and convert it for printing.
pub fn load_image(path: &std::path::Path) -> Result<Raster, BrasaError> {
    let img = image::open(path)?;
    Ok(image_to_raster(&img))
}

/// Convert a decoded image: downscale to the head width if necessary,
/// grayscale, dither, pack.
pub fn image_to_raster(img: &DynamicImage) -> Raster {
    let scaled;
    let img = if img.width() > DOTS_PER_LINE as u32 {
        scaled = img.resize(
            DOTS_PER_LINE as u32,
            u32::MAX,
            image::imageops::FilterType::Triangle,
        );
        &scaled
    } else {
        img
    };

    let gray = img.to_luma8();
    let (width, height) = gray.dimensions();
    let row_width = width.div_ceil(8) as u8;

    let mut data = Vec::with_capacity(row_width as usize * height as usize);
    for y in 0..height {
        for byte_col in 0..row_width as u32 {
            // blank (1) bits everywhere, then clear where ink goes
            let mut byte = 0xFFu8;
            for bit in 0..8 {
                let x = byte_col * 8 + bit;
                if x >= width {
                    break;
                }
                let darkness = 1.0 - gray.get_pixel(x, y).0[0] as f32 / 255.0;
                if should_ink(x, y, darkness) {
                    byte &= !(0x80 >> bit);
                }
            }
            data.push(byte);
        }
    }

    Raster { row_width, data }
}

/// Render a QR code, one module per byte column (8×8 dots per module).
///
/// Dark modules print ink (0x00 under the inverted payload polarity).
pub fn qr_to_raster(text: &str) -> Result<Raster, BrasaError> {
    let code =
        QrCode::new(text.as_bytes()).map_err(|e| BrasaError::InvalidValue(format!("qr: {}", e)))?;

    let width = code.width();
    if width > MAX_ROW_BYTES as usize {
        return Err(BrasaError::InvalidValue(format!(
            "qr code is {} modules wide, the head fits {}",
            width, MAX_ROW_BYTES
        )));
    }

    let colors = code.to_colors();
    let mut data = Vec::with_capacity(width * width * 8);
    for module_row in colors.chunks(width) {
        let row: Vec<u8> = module_row
            .iter()
            .map(|&c| if c == Color::Dark { 0x00 } else { 0xFF })
            .collect();
        // one module is 8 dots tall
        for _ in 0..8 {
            data.extend_from_slice(&row);
        }
    }

    Ok(Raster {
        row_width: width as u8,
        data,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_black_image_packs_to_ink() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 2, Luma([0u8])));
        let raster = image_to_raster(&img);
        assert_eq!(raster.row_width, 2);
        assert_eq!(raster.height(), 2);
        assert!(raster.data.iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_white_image_packs_to_blank() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 2, Luma([255u8])));
        let raster = image_to_raster(&img);
        assert!(raster.data.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_row_padding_is_blank() {
        // 12 dots wide: last 4 bits of each row byte pair are padding
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(12, 1, Luma([0u8])));
        let raster = image_to_raster(&img);
        assert_eq!(raster.row_width, 2);
        assert_eq!(raster.data, vec![0x00, 0x0F]);
    }

    #[test]
    fn test_mid_gray_dithers_to_mix() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([128u8])));
        let raster = image_to_raster(&img);
        let ink_bits: u32 = raster.data.iter().map(|b| b.count_zeros()).sum();
        let total_bits = raster.data.len() as u32 * 8;
        // Roughly half the dots print
        assert!(ink_bits > total_bits / 3);
        assert!(ink_bits < 2 * total_bits / 3);
    }

    #[test]
    fn test_wide_image_downscaled() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(800, 100, Luma([0u8])));
        let raster = image_to_raster(&img);
        assert_eq!(raster.row_width, 48);
    }

    #[test]
    fn test_bayer_extremes() {
        assert!(should_ink(0, 0, 1.0));
        assert!(!should_ink(0, 0, 0.0));
        // darkness 1.0 inks every cell of the matrix
        for y in 0..8 {
            for x in 0..8 {
                assert!(should_ink(x, y, 1.0));
            }
        }
    }

    #[test]
    fn test_qr_raster_shape() {
        let raster = qr_to_raster("https://example.com").unwrap();
        let width = raster.row_width as usize;
        assert_eq!(raster.data.len() % width, 0);
        // square: width modules * 8 dot rows each
        assert_eq!(raster.height(), width * 8);
        // dark modules present
        assert!(raster.data.contains(&0x00));
        assert!(raster.data.contains(&0xFF));
    }

    #[test]
    fn test_qr_fits_head() {
        let raster = qr_to_raster("short").unwrap();
        assert!(raster.row_width <= MAX_ROW_BYTES);
    }
}
