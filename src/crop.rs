//! Cropping screenshots of a portrait social-media post down to the photo.
//!
//! The photo sits in a fixed vertical band of the screen.  That band is cut
//! out first; then any near-white rows at its bottom (caption background,
//! padding) are trimmed.

use image::{DynamicImage, GenericImageView, GrayImage};
use log::{debug, info};
use std::path::Path;

/// Fraction of the height above the photo band.
pub const TOP_FRACTION: f64 = 0.20;
/// Fraction of the height where the photo band ends.
pub const BOTTOM_FRACTION: f64 = 0.75;
/// Grey levels above this count as white.
pub const WHITE_THRESHOLD: u8 = 245;
/// A row holds content when its summed ink (255 per non-white pixel)
/// exceeds this.
pub const CONTENT_INK: u64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("nothing left after cropping a {width}x{height} image")]
    Empty { width: u32, height: u32 },
}

/// Rows of the source image that end up in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub top: u32,
    pub height: u32,
}

/// `(top, bottom)` row bounds of the photo band for an image `height`
/// pixels tall.
pub fn band(height: u32) -> (u32, u32) {
    let h = f64::from(height);
    ((h * TOP_FRACTION) as u32, (h * BOTTOM_FRACTION) as u32)
}

fn row_ink(gray: &GrayImage, y: u32) -> u64 {
    (0..gray.width())
        .filter(|&x| gray.get_pixel(x, y)[0] <= WHITE_THRESHOLD)
        .map(|_| 255u64)
        .sum()
}

/// Number of leading rows to keep: everything up to the last row with
/// content.  A band without any content row is kept whole.
pub fn content_rows(gray: &GrayImage) -> u32 {
    (0..gray.height())
        .rev()
        .find(|&y| row_ink(gray, y) > CONTENT_INK)
        .map(|y| y + 1)
        .unwrap_or(gray.height())
}

/// Where to cut `img`.
pub fn crop_box(img: &DynamicImage) -> CropBox {
    let (top, bottom) = band(img.height());
    let band_img = img.crop_imm(0, top, img.width(), bottom - top);
    let height = content_rows(&band_img.to_luma8());
    debug!("band rows {}..{}, keeping {} row(s)", top, bottom, height);
    CropBox { top, height }
}

/// Cut `img` down to its photo, returning the rows used and the result.
pub fn crop(img: &DynamicImage) -> Result<(CropBox, DynamicImage), CropError> {
    let b = crop_box(img);
    if b.height == 0 || img.width() == 0 {
        return Err(CropError::Empty {
            width: img.width(),
            height: img.height(),
        });
    }
    Ok((b, img.crop_imm(0, b.top, img.width(), b.height)))
}

/// Crop `input` and write the result to `output`.  The output format
/// follows the output file's extension.
pub fn crop_file(input: &Path, output: &Path) -> Result<CropBox, CropError> {
    let img = image::open(input)?;
    let (width, height) = img.dimensions();
    info!("cropping {} ({}x{})", input.display(), width, height);
    let (b, cropped) = crop(&img)?;
    cropped.save(output)?;
    info!(
        "saved {} (rows {}..{})",
        output.display(),
        b.top,
        b.top + b.height
    );
    Ok(b)
}
