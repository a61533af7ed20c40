//! Rendered extents of decals.
//!
//! Text extents are estimated from the font size since no font is shaped at
//! this layer; the serializer places text with the same anchor, so the
//! estimate and the painted glyphs share their reference point.

use crate::element::{DecalElement, DecalKind, TextAnchor};
use crate::geometry::Rect;

/// Average glyph advance relative to font size.
pub const AVERAGE_GLYPH_ADVANCE: f32 = 0.6;

/// Line box height relative to font size.
pub const LINE_HEIGHT: f32 = 1.2;

/// Estimated width and height of a single line of text.
#[must_use]
#[allow(clippy::cast_precision_loss)] // glyph counts are small
pub fn text_extent(content: &str, font_size: f32) -> (f32, f32) {
    let glyphs = content.chars().count() as f32;
    (glyphs * font_size * AVERAGE_GLYPH_ADVANCE, font_size * LINE_HEIGHT)
}

/// The decal's content box in its own coordinates, before any transform.
#[must_use]
pub fn content_box(element: &DecalElement) -> Rect {
    match &element.kind {
        DecalKind::Text {
            content,
            font_size,
            anchor,
            ..
        } => {
            let (w, h) = text_extent(content, *font_size);
            match anchor {
                TextAnchor::Center => Rect::new(-w / 2.0, -h / 2.0, w, h),
                TextAnchor::TopLeft => Rect::new(0.0, 0.0, w, h),
            }
        }
        DecalKind::Image { width, height, .. } => {
            Rect::new(-width / 2.0, -height / 2.0, *width, *height)
        }
    }
}

/// Axis-aligned canvas-space bounds of the decal under its full transform.
#[must_use]
pub fn visual_bounds(element: &DecalElement) -> Rect {
    content_box(element).transformed(&element.canvas_transform())
}
