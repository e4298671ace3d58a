use image::{DynamicImage, GrayImage, Luma};
use std::io::Cursor;
use thiserror::Error;

/// Captures shorter than this are upscaled; Tesseract misreads small terminal fonts.
const MIN_OCR_HEIGHT: u32 = 400;
/// Captures larger than this on either side are scaled down.
const MAX_OCR_SIDE: u32 = 2800;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Process raw capture bytes (PNG / JPEG / …) and return normalized PNG bytes ready for OCR.
pub fn prepare_capture(data: &[u8]) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data)?;
    encode_as_png(normalize(img))
}

/// Rescale, grayscale, dark-on-light, contrast stretch.
fn normalize(img: DynamicImage) -> DynamicImage {
    let img = if img.width() > MAX_OCR_SIDE || img.height() > MAX_OCR_SIDE {
        img.resize(MAX_OCR_SIDE, MAX_OCR_SIDE, image::imageops::FilterType::Lanczos3)
    } else if img.height() > 0 && img.height() < MIN_OCR_HEIGHT {
        let scale = MIN_OCR_HEIGHT.div_ceil(img.height()).min(4);
        img.resize(
            img.width() * scale,
            img.height() * scale,
            image::imageops::FilterType::CatmullRom,
        )
    } else {
        img
    };

    let mut gray: GrayImage = img.to_luma8();

    // Terminal captures are often light text on a dark background.
    if mean_luma(&gray) < 128 {
        image::imageops::invert(&mut gray);
    }

    stretch_contrast(&mut gray);
    DynamicImage::ImageLuma8(gray)
}

/// Maps the darkest pixel to 0 and the brightest to 255. Flat images are left alone.
fn stretch_contrast(gray: &mut GrayImage) {
    let Some(lo) = gray.pixels().map(|p| p[0]).min() else {
        return;
    };
    let hi = gray.pixels().map(|p| p[0]).max().unwrap_or(lo);
    if hi <= lo {
        return;
    }
    let span = u16::from(hi - lo);
    for Luma([v]) in gray.pixels_mut() {
        *v = (u16::from(*v - lo) * 255 / span) as u8;
    }
}

fn mean_luma(gray: &GrayImage) -> u64 {
    let count = gray.width() as u64 * gray.height() as u64;
    if count == 0 {
        return 255;
    }
    gray.pixels().map(|p| p[0] as u64).sum::<u64>() / count
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}
