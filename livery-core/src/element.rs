//! Decal elements - the text and image stickers painted onto the texture.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Affine, Point};

/// Unique identifier for a decal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if `s` is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which point of a text decal its position refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    /// Position is the center of the text box.
    #[default]
    Center,
    /// Position is the top-left corner of the text box.
    TopLeft,
}

/// The content of a decal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DecalKind {
    /// A text label.
    Text {
        /// Text content.
        content: String,
        /// Font size in canvas units.
        font_size: f32,
        /// Fill color as hex.
        color: String,
        /// Anchor semantics of `position`.
        #[serde(default)]
        anchor: TextAnchor,
    },

    /// An embedded raster image, centered on its position.
    Image {
        /// Self-contained base64 data URI.
        data_uri: String,
        /// Pixel width of the source asset.
        intrinsic_width: u32,
        /// Pixel height of the source asset.
        intrinsic_height: u32,
        /// Display width in canvas units.
        width: f32,
        /// Display height in canvas units.
        height: f32,
    },
}

impl DecalKind {
    /// Short name of the variant, as reported to selection observers.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
        }
    }
}

/// Per-axis scale applied by resize handles. Negative values mirror.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    /// Horizontal scale.
    pub x: f32,
    /// Vertical scale.
    pub y: f32,
}

impl Default for Scale {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

/// A decal with its content and placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecalElement {
    /// Unique identifier, assigned by the store.
    pub id: ElementId,
    /// Position in the placement frame.
    pub position: Point,
    /// Rotation in degrees around `position`.
    #[serde(default)]
    pub rotation: f32,
    /// Resize scale.
    #[serde(default)]
    pub scale: Scale,
    /// Placement frame mapping the decal's coordinates into canvas space,
    /// e.g. a mirrored UV island.
    #[serde(default)]
    pub frame: Affine,
    /// Content.
    pub kind: DecalKind,
}

impl DecalElement {
    /// Create a decal with the given content at the origin.
    #[must_use]
    pub fn new(kind: DecalKind) -> Self {
        Self {
            id: ElementId::new(),
            position: Point::ORIGIN,
            rotation: 0.0,
            scale: Scale::default(),
            frame: Affine::IDENTITY,
            kind,
        }
    }

    /// Create a centered text decal.
    #[must_use]
    pub fn text(content: impl Into<String>, font_size: f32, color: impl Into<String>) -> Self {
        Self::new(DecalKind::Text {
            content: content.into(),
            font_size,
            color: color.into(),
            anchor: TextAnchor::Center,
        })
    }

    /// Set the position.
    #[must_use]
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    /// Set the rotation in degrees.
    #[must_use]
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    /// Set the resize scale.
    #[must_use]
    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    /// Set the placement frame.
    #[must_use]
    pub fn with_frame(mut self, frame: Affine) -> Self {
        self.frame = frame;
        self
    }

    /// Transform from the decal's own content box to its placement frame:
    /// `translate(position) rotate(rotation) scale(scale)`.
    #[must_use]
    pub fn local_transform(&self) -> Affine {
        Affine::translate(self.position.x, self.position.y)
            .then(&Affine::rotate_degrees(self.rotation))
            .then(&Affine::scale(self.scale.x, self.scale.y))
    }

    /// Full transform from content box to canvas space.
    #[must_use]
    pub fn canvas_transform(&self) -> Affine {
        self.frame.then(&self.local_transform())
    }

    /// Text content, if this is a text decal.
    #[must_use]
    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            DecalKind::Text { content, .. } => Some(content),
            DecalKind::Image { .. } => None,
        }
    }
}
