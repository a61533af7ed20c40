//! Raster payloads.
//!
//! Image decals carry their pixels as self-contained base64 data URIs so the
//! serialized surface never references external files.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// Decoded RGBA pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel, straight alpha).
    pub data: Vec<u8>,
    /// Format the pixels were decoded from.
    pub format: ImageFormat,
}

impl DecodedImage {
    /// RGBA bytes of the pixel at `(x, y)`.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// Rasterized SVG.
    Svg,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/webp" => Self::WebP,
            "image/svg+xml" => Self::Svg,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }

    /// MIME type for data URIs.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Svg => "image/svg+xml",
            Self::Unknown => "application/octet-stream",
        }
    }
}

/// An image ready to be embedded as a decal.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    /// Base64 data URI of the original bytes.
    pub data_uri: String,
    /// Intrinsic width in pixels.
    pub width: u32,
    /// Intrinsic height in pixels.
    pub height: u32,
}

/// Decode a raster image and wrap its original bytes in a data URI.
///
/// # Errors
///
/// Returns an error if the bytes are not a decodable PNG, JPEG or WebP image.
pub fn embed_image(bytes: &[u8]) -> RenderResult<ImagePayload> {
    let format = ImageFormat::from_magic_bytes(bytes);
    if matches!(format, ImageFormat::Unknown | ImageFormat::Svg) {
        return Err(RenderError::Unsupported(
            "image payload is not PNG, JPEG or WebP".to_string(),
        ));
    }
    let decoded = load_image_from_bytes(bytes)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(ImagePayload {
        data_uri: format!("data:{};base64,{encoded}", format.mime()),
        width: decoded.width,
        height: decoded.height,
    })
}

/// Scale `(width, height)` down so the longer side is at most `max`,
/// preserving aspect ratio. Smaller sizes pass through unchanged.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fit_within(width: u32, height: u32, max: f32) -> (f32, f32) {
    let (w, h) = (width as f32, height as f32);
    let longest = w.max(h);
    if longest <= max || longest <= 0.0 {
        return (w, h);
    }
    let scale = max / longest;
    (w * scale, h * scale)
}

/// Load an image from raw bytes.
///
/// # Errors
///
/// Returns an error if the image cannot be decoded.
pub fn load_image_from_bytes(data: &[u8]) -> RenderResult<DecodedImage> {
    let format = ImageFormat::from_magic_bytes(data);

    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(DecodedImage {
        width,
        height,
        data: rgba.into_raw(),
        format,
    })
}

/// Split a data URI into its MIME type and payload bytes.
///
/// Supports both `;base64` and percent-encoded payloads.
///
/// # Errors
///
/// Returns an error if the data URI is malformed.
pub fn parse_data_uri(uri: &str) -> RenderResult<(String, Vec<u8>)> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    // Find the comma separating metadata from data
    let (metadata, encoded_data) = uri_data
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    let mime = metadata.split(';').next().unwrap_or_default().to_string();
    let bytes = if metadata.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(encoded_data)
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?
    } else {
        urlencoding::decode_binary(encoded_data.as_bytes()).into_owned()
    };

    Ok((mime, bytes))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn decode_data_uri(uri: &str) -> RenderResult<DecodedImage> {
        let (_, bytes) = parse_data_uri(uri)?;
        load_image_from_bytes(&bytes)
    }

    /// 1x1 red PNG.
    pub(crate) const RED_PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 128, 255, 255]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png)
            .expect("encode png");
        buf.into_inner()
    }

    #[test]
    fn test_format_detection_from_mime() {
        assert_eq!(ImageFormat::from_mime("image/png"), ImageFormat::Png);
        assert_eq!(ImageFormat::from_mime("image/JPEG"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_mime("image/svg+xml"), ImageFormat::Svg);
        assert_eq!(ImageFormat::from_mime("text/plain"), ImageFormat::Unknown);
    }

    #[test]
    fn test_format_detection_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            ImageFormat::Jpeg
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBP"),
            ImageFormat::WebP
        );
    }

    #[test]
    fn test_data_uri_parsing() {
        let data_uri = format!("data:image/png;base64,{RED_PIXEL_PNG}");
        let texture = decode_data_uri(&data_uri).expect("valid data uri");
        assert_eq!(texture.width, 1);
        assert_eq!(texture.height, 1);
        assert_eq!(texture.format, ImageFormat::Png);
    }

    #[test]
    fn test_percent_encoded_data_uri() {
        let (mime, bytes) =
            parse_data_uri("data:image/svg+xml,%3Csvg%2F%3E").expect("valid data uri");
        assert_eq!(mime, "image/svg+xml");
        assert_eq!(bytes, b"<svg/>");
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(decode_data_uri("not a data uri").is_err());
        assert!(decode_data_uri("data:image/png").is_err());
    }

    #[test]
    fn test_embed_image_reads_intrinsic_size() {
        let payload = embed_image(&png_bytes(300, 150)).expect("embed");
        assert_eq!((payload.width, payload.height), (300, 150));
        assert!(payload.data_uri.starts_with("data:image/png;base64,"));

        let roundtrip = decode_data_uri(&payload.data_uri).expect("decode");
        assert_eq!(roundtrip.width, 300);
    }

    #[test]
    fn test_embed_rejects_non_images() {
        assert!(embed_image(b"plain text, not an image").is_err());
    }

    #[test]
    fn test_fit_within_preserves_aspect() {
        assert_eq!(fit_within(2048, 1024, 1024.0), (1024.0, 512.0));
        assert_eq!(fit_within(300, 150, 1024.0), (300.0, 150.0));
    }
}
