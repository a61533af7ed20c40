//! Partial element updates and validation of user-entered values.
//!
//! Values typed into edit prompts are untrusted. Every `parse_*` helper
//! rejects bad input so the caller can keep the previous value.

use serde::{Deserialize, Serialize};

use crate::element::{DecalElement, DecalKind, Scale, TextAnchor};
use crate::error::{CoreError, CoreResult};
use crate::geometry::{Affine, Point};

/// Smallest accepted font size in canvas units.
pub const MIN_FONT_SIZE: f32 = 1.0;
/// Largest accepted font size in canvas units.
pub const MAX_FONT_SIZE: f32 = 4096.0;
/// Maximum text content length in bytes.
pub const MAX_TEXT_LEN: usize = 4096;

/// A partial update merged into an existing decal.
///
/// Absent fields leave the element untouched. Text fields are ignored on
/// image decals and image fields on text decals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementPatch {
    /// New position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    /// New rotation in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    /// New resize scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Scale>,
    /// New placement frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<Affine>,
    /// New text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// New font size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// New text color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// New text anchor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<TextAnchor>,
    /// New image display width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// New image display height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
}

impl ElementPatch {
    /// Empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the position.
    #[must_use]
    pub fn position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the rotation.
    #[must_use]
    pub fn rotation(mut self, degrees: f32) -> Self {
        self.rotation = Some(degrees);
        self
    }

    /// Set the resize scale.
    #[must_use]
    pub fn scale(mut self, scale: Scale) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Set the text content.
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the font size.
    #[must_use]
    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Set the text color.
    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Check whether the patch carries no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate every present field, normalizing colors and rotations.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidValue`] naming the first rejected field.
    pub fn validated(&self) -> CoreResult<Self> {
        let rotation = match self.rotation {
            Some(degrees) if !degrees.is_finite() => {
                return Err(invalid("rotation", "must be finite"));
            }
            other => other.map(normalize_degrees),
        };
        if let Some(scale) = self.scale {
            if !(scale.x.is_finite() && scale.y.is_finite()) || scale.x == 0.0 || scale.y == 0.0 {
                return Err(invalid("scale", "must be finite and non-zero"));
            }
        }
        if let Some(frame) = self.frame {
            let coefficients = [frame.a, frame.b, frame.c, frame.d, frame.e, frame.f];
            if !coefficients.iter().all(|c| c.is_finite()) {
                return Err(invalid("frame", "coefficients must be finite"));
            }
        }
        for (field, value) in [("width", self.width), ("height", self.height)] {
            if value.is_some_and(|v| !v.is_finite() || v <= 0.0) {
                return Err(invalid(field, "must be a positive number"));
            }
        }
        Ok(Self {
            position: self.position.map(check_position).transpose()?,
            rotation,
            scale: self.scale,
            frame: self.frame,
            content: self.content.as_deref().map(parse_text).transpose()?,
            font_size: self.font_size.map(check_font_size).transpose()?,
            color: self.color.as_deref().map(parse_color).transpose()?,
            anchor: self.anchor,
            width: self.width,
            height: self.height,
        })
    }

    /// Merge the patch into `element`.
    pub fn apply_to(&self, element: &mut DecalElement) {
        if let Some(position) = self.position {
            element.position = position;
        }
        if let Some(rotation) = self.rotation {
            element.rotation = rotation;
        }
        if let Some(scale) = self.scale {
            element.scale = scale;
        }
        if let Some(frame) = self.frame {
            element.frame = frame;
        }

        match &mut element.kind {
            DecalKind::Text {
                content,
                font_size,
                color,
                anchor,
            } => {
                if let Some(value) = &self.content {
                    content.clone_from(value);
                }
                if let Some(value) = self.font_size {
                    *font_size = value;
                }
                if let Some(value) = &self.color {
                    color.clone_from(value);
                }
                if let Some(value) = self.anchor {
                    *anchor = value;
                }
            }
            DecalKind::Image { width, height, .. } => {
                if let Some(value) = self.width {
                    *width = value;
                }
                if let Some(value) = self.height {
                    *height = value;
                }
            }
        }
    }
}

/// Validate replacement text content.
///
/// # Errors
///
/// Returns [`CoreError::InvalidValue`] for blank or overlong text.
pub fn parse_text(input: &str) -> CoreResult<String> {
    if input.trim().is_empty() {
        return Err(invalid("text", "text is empty"));
    }
    if input.len() > MAX_TEXT_LEN {
        return Err(invalid(
            "text",
            format!("text too long (max {MAX_TEXT_LEN} bytes)"),
        ));
    }
    Ok(input.to_string())
}

/// Parse a font size typed by the user.
///
/// # Errors
///
/// Returns [`CoreError::InvalidValue`] for non-numeric or out-of-range input.
pub fn parse_font_size(input: &str) -> CoreResult<f32> {
    let size: f32 = input
        .trim()
        .parse()
        .map_err(|_| invalid("font_size", format!("not a number: {input:?}")))?;
    check_font_size(size)
}

/// Check a numeric font size against the accepted range.
///
/// # Errors
///
/// Returns [`CoreError::InvalidValue`] for non-finite or out-of-range sizes.
pub fn check_font_size(size: f32) -> CoreResult<f32> {
    if !size.is_finite() || !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size) {
        return Err(invalid(
            "font_size",
            format!("must be between {MIN_FONT_SIZE} and {MAX_FONT_SIZE}"),
        ));
    }
    Ok(size)
}

/// Check that a position has finite coordinates.
///
/// # Errors
///
/// Returns [`CoreError::InvalidValue`] for NaN or infinite coordinates.
pub fn check_position(position: Point) -> CoreResult<Point> {
    if position.x.is_finite() && position.y.is_finite() {
        Ok(position)
    } else {
        Err(invalid("position", "coordinates must be finite"))
    }
}

/// Parse a `#rgb` or `#rrggbb` hex color, normalized to lowercase.
///
/// # Errors
///
/// Returns [`CoreError::InvalidValue`] for anything else.
pub fn parse_color(input: &str) -> CoreResult<String> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix('#')
        .ok_or_else(|| invalid("color", "missing leading '#'"))?;
    if !matches!(digits.len(), 3 | 6) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("color", format!("not a hex color: {input:?}")));
    }
    Ok(trimmed.to_ascii_lowercase())
}

/// Parse a rotation in degrees, normalized to `[0, 360)`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidValue`] for non-numeric or non-finite input.
pub fn parse_rotation(input: &str) -> CoreResult<f32> {
    let degrees: f32 = input
        .trim()
        .parse()
        .map_err(|_| invalid("rotation", format!("not a number: {input:?}")))?;
    if !degrees.is_finite() {
        return Err(invalid("rotation", "must be finite"));
    }
    Ok(normalize_degrees(degrees))
}

/// Wrap an angle into `[0, 360)`.
#[must_use]
pub fn normalize_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> CoreError {
    CoreError::InvalidValue {
        field,
        reason: reason.into(),
    }
}
