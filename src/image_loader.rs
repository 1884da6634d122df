//! # Logo Loading
//!
//! Resolves the branding logo from a data URI, raw base64, or a file path,
//! and prepares it for PDF embedding. JPEG bytes pass through untouched (PDF
//! decodes DCT natively); PNG is decoded to RGB with a separate alpha plane
//! for the soft mask.

use std::io::Cursor;

use base64::Engine;
use image::ImageFormat;

/// An image ready for embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

impl LoadedImage {
    /// Width over height; 1.0 for a degenerate image.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height_px == 0 {
            1.0
        } else {
            self.width_px as f64 / self.height_px as f64
        }
    }
}

/// Pixel data in a form the PDF writer consumes directly.
#[derive(Debug, Clone)]
pub enum ImagePixelData {
    /// Raw JPEG bytes, embedded with DCTDecode.
    Jpeg { data: Vec<u8>, grayscale: bool },
    /// width * height * 3 RGB bytes, plus width * height alpha bytes when
    /// any pixel is not fully opaque.
    Decoded { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// Load an image from a source string.
pub fn load_image(src: &str) -> Result<LoadedImage, String> {
    let bytes = read_source_bytes(src.trim())?;
    decode_image_bytes(&bytes)
}

fn read_source_bytes(src: &str) -> Result<Vec<u8>, String> {
    if let Some(rest) = src.strip_prefix("data:") {
        let (_, payload) = rest
            .split_once(',')
            .ok_or_else(|| "Invalid data URI: missing comma".to_string())?;
        return base64_decode(payload);
    }

    // Only explicit path prefixes count as files; base64 text may contain '/'.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        return std::fs::read(src).map_err(|e| format!("Failed to read logo '{}': {}", src, e));
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| format!("Base64 decode error: {}", e))
}

fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage, String> {
    match image::guess_format(data) {
        Ok(ImageFormat::Jpeg) => decode_jpeg(data),
        Ok(ImageFormat::Png) => decode_png(data),
        Ok(other) => Err(format!("Unsupported logo format {:?} (expected JPEG or PNG)", other)),
        Err(_) => Err("Unrecognised logo data (expected JPEG or PNG)".to_string()),
    }
}

fn decode_jpeg(data: &[u8]) -> Result<LoadedImage, String> {
    let (width, height) = image::io::Reader::with_format(Cursor::new(data), ImageFormat::Jpeg)
        .into_dimensions()
        .map_err(|e| format!("Failed to read JPEG dimensions: {}", e))?;

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            grayscale: jpeg_component_count(data) == Some(1),
        },
        width_px: width,
        height_px: height,
    })
}

/// Walk the JPEG markers to the start-of-frame segment and read its
/// component count.
fn jpeg_component_count(data: &[u8]) -> Option<u8> {
    let mut i = 2;
    while i + 3 < data.len() && data[i] == 0xFF {
        let marker = data[i + 1];
        if matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF) {
            return data.get(i + 9).copied();
        }
        let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + seg_len;
    }
    None
}

fn decode_png(data: &[u8]) -> Result<LoadedImage, String> {
    let rgba = image::load_from_memory_with_format(data, ImageFormat::Png)
        .map_err(|e| format!("Failed to decode PNG: {}", e))?
        .to_rgba8();

    let (width, height) = rgba.dimensions();
    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);

    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }
    let opaque = alpha.iter().all(|&a| a == 255);

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: (!opaque).then_some(alpha),
        },
        width_px: width,
        height_px: height,
    })
}
