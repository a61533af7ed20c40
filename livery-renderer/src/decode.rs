//! Texture decoding.
//!
//! Turns a texture source string (serialized SVG, an SVG data URI, or a raster
//! data URI) into RGBA pixels at the texture resolution, using the
//! usvg/resvg/tiny-skia pipeline for vector sources.

use std::sync::Arc;

use crate::bridge::DecodeTicket;
use crate::error::{RenderError, RenderResult};
use crate::image::{load_image_from_bytes, parse_data_uri, DecodedImage, ImageFormat};
use crate::serializer::SVG_DATA_URI_PREFIX;

/// Font set used to shape text decals.
pub use usvg::fontdb::Database as FontDatabase;

/// Decodes texture sources.
pub trait Decoder {
    /// Decode `source` into pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is unsupported or malformed.
    fn decode(&self, source: &str) -> RenderResult<DecodedImage>;
}

/// Rasterizes SVG sources to a square texture.
#[derive(Debug, Clone)]
pub struct SvgDecoder {
    texture_size: u32,
    fontdb: Arc<FontDatabase>,
}

impl SvgDecoder {
    /// Create a decoder producing `texture_size`×`texture_size` pixels, with
    /// system fonts loaded for text decals.
    #[must_use]
    pub fn new(texture_size: u32) -> Self {
        let mut fontdb = FontDatabase::new();
        fontdb.load_system_fonts();
        tracing::debug!("Loaded {} font faces for texture decoding", fontdb.len());
        Self::with_fonts(texture_size, Arc::new(fontdb))
    }

    /// Create a decoder with an explicit font database.
    #[must_use]
    pub fn with_fonts(texture_size: u32, fontdb: Arc<FontDatabase>) -> Self {
        Self {
            texture_size: texture_size.max(1),
            fontdb,
        }
    }

    /// Output side length in pixels.
    #[must_use]
    pub fn texture_size(&self) -> u32 {
        self.texture_size
    }

    /// Rasterize SVG markup to a texture-sized pixmap.
    #[allow(clippy::cast_precision_loss)]
    fn rasterize(&self, svg: &[u8]) -> RenderResult<DecodedImage> {
        let mut opt = usvg::Options::default();
        opt.fontdb = Arc::clone(&self.fontdb);
        let tree = usvg::Tree::from_data(svg, &opt)
            .map_err(|e| RenderError::Decode(format!("SVG parsing failed: {e}")))?;

        let size = self.texture_size;
        let mut pixmap = tiny_skia::Pixmap::new(size, size)
            .ok_or_else(|| RenderError::Decode("Failed to create pixmap".to_string()))?;

        let view = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            size as f32 / view.width(),
            size as f32 / view.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let mut data = Vec::with_capacity(pixmap.data().len());
        for pixel in pixmap.pixels() {
            let c = pixel.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(DecodedImage {
            width: size,
            height: size,
            data,
            format: ImageFormat::Svg,
        })
    }
}

impl Decoder for SvgDecoder {
    fn decode(&self, source: &str) -> RenderResult<DecodedImage> {
        let trimmed = source.trim_start();
        if trimmed.starts_with('<') {
            return self.rasterize(trimmed.as_bytes());
        }
        if source.starts_with(SVG_DATA_URI_PREFIX) || source.starts_with("data:image/svg+xml;") {
            let (_, bytes) = parse_data_uri(source)?;
            return self.rasterize(&bytes);
        }
        if source.starts_with("data:image/") {
            let (mime, bytes) = parse_data_uri(source)?;
            return match ImageFormat::from_mime(&mime) {
                ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP => {
                    load_image_from_bytes(&bytes)
                }
                _ => Err(RenderError::Unsupported(mime)),
            };
        }
        Err(RenderError::Unsupported(
            source.chars().take(32).collect::<String>(),
        ))
    }
}

/// A decode request: the ticket from [`crate::TextureBridge::repoint`] and
/// the source it was issued for.
#[derive(Debug, Clone)]
pub struct PendingDecode {
    /// Ticket to hand back on completion.
    pub ticket: DecodeTicket,
    /// Source to decode.
    pub source: String,
}

impl PendingDecode {
    /// Bundle a ticket with its source.
    #[must_use]
    pub fn new(ticket: DecodeTicket, source: impl Into<String>) -> Self {
        Self {
            ticket,
            source: source.into(),
        }
    }

    /// Decode on the current thread.
    pub fn run<D: Decoder + ?Sized>(
        self,
        decoder: &D,
    ) -> (DecodeTicket, RenderResult<DecodedImage>) {
        let result = decoder.decode(&self.source);
        (self.ticket, result)
    }

    /// Decode on tokio's blocking pool.
    pub async fn run_blocking<D>(
        self,
        decoder: Arc<D>,
    ) -> (DecodeTicket, RenderResult<DecodedImage>)
    where
        D: Decoder + Send + Sync + ?Sized + 'static,
    {
        let ticket = self.ticket;
        let source = self.source;
        let joined = tokio::task::spawn_blocking(move || decoder.decode(&source)).await;
        let result = joined
            .map_err(|e| RenderError::Task(e.to_string()))
            .and_then(|r| r);
        (ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::tests::RED_PIXEL_PNG;
    use crate::serializer::to_data_uri;

    const BLUE_SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100"><rect width="100" height="100" fill="#0000ff"/></svg>"##;

    fn decoder() -> SvgDecoder {
        SvgDecoder::with_fonts(16, Arc::new(FontDatabase::new()))
    }

    #[test]
    fn test_rasterizes_markup_at_texture_size() {
        let image = decoder().decode(BLUE_SQUARE).expect("decode");
        assert_eq!((image.width, image.height), (16, 16));
        assert_eq!(image.pixel(8, 8), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_decodes_svg_data_uri() {
        let image = decoder().decode(&to_data_uri(BLUE_SQUARE)).expect("decode");
        assert_eq!(image.pixel(0, 0), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_decodes_raster_data_uri() {
        let uri = format!("data:image/png;base64,{RED_PIXEL_PNG}");
        let image = decoder().decode(&uri).expect("decode");
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.format, ImageFormat::Png);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(decoder().decode("<svg").is_err());
        assert!(decoder().decode("https://example.com/texture.png").is_err());
        assert!(decoder().decode("data:text/plain,hello").is_err());
    }

    #[tokio::test]
    async fn test_run_blocking_returns_ticket() {
        let mut bridge = crate::TextureBridge::new();
        let ticket = bridge.repoint(BLUE_SQUARE);
        let pending = PendingDecode::new(ticket, BLUE_SQUARE);
        let (returned, result) = pending.run_blocking(Arc::new(decoder())).await;
        assert_eq!(returned, ticket);
        assert!(result.is_ok());
    }
}
