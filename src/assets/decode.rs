use std::sync::Arc;

use anyhow::Context;
use base64::Engine as _;

use crate::foundation::error::{CanvasError, CanvasResult};
use crate::foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};

/// Decoded raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Wrap already-premultiplied bytes, checking the buffer length.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> CanvasResult<Self> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if rgba8_premul.len() != expected {
            return Err(CanvasError::resource(format!(
                "image buffer is {} bytes, expected {expected} for {width}x{height}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Solid single-color image; handy for placeholders and tests.
    pub fn solid(width: u32, height: u32, rgba_premul: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity((width as usize) * (height as usize) * 4);
        for _ in 0..(width as usize) * (height as usize) {
            data.extend_from_slice(&rgba_premul);
        }
        Self {
            width,
            height,
            rgba8_premul: Arc::new(data),
        }
    }

    /// Encode back to PNG (straight alpha).
    pub fn to_png(&self) -> CanvasResult<Vec<u8>> {
        let mut straight = self.rgba8_premul.as_ref().clone();
        unpremultiply_rgba8_in_place(&mut straight);
        encode_png(self.width, self.height, straight)
    }
}

/// Decode encoded image bytes (PNG, JPEG, WebP, ...) and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> CanvasResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Encode straight-alpha RGBA8 pixels as PNG.
pub fn encode_png(width: u32, height: u32, rgba8_straight: Vec<u8>) -> CanvasResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(width, height, rgba8_straight)
        .ok_or_else(|| CanvasError::render("rgba buffer does not match image dimensions"))?;
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .context("encode png")?;
    Ok(out.into_inner())
}

/// Whether `source` is an inline `data:` URL.
pub fn is_data_url(source: &str) -> bool {
    source
        .get(..5)
        .is_some_and(|p| p.eq_ignore_ascii_case("data:"))
}

/// Extract the payload bytes of a `data:` URL. Only `;base64` payloads are decoded; anything
/// else is returned verbatim.
pub fn decode_data_url(source: &str) -> CanvasResult<Vec<u8>> {
    if !is_data_url(source) {
        return Err(CanvasError::resource("not a data: URL"));
    }
    let (meta, payload) = source[5..]
        .split_once(',')
        .ok_or_else(|| CanvasError::resource("data: URL has no payload separator"))?;
    if meta.to_ascii_lowercase().ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| CanvasError::resource(format!("invalid base64 in data: URL: {e}")))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

/// Build a base64 `data:` URL.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
