//! Canonical saved form of the decal surface.

use serde::{Deserialize, Serialize};

use crate::element::DecalElement;
use crate::error::{CoreError, CoreResult};
use crate::store::DecalStore;

/// Background color of a fresh surface.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// The unit of save/load: ordered decals plus the base color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDocument {
    /// Base paint color as hex.
    #[serde(default = "SurfaceDocument::default_background")]
    pub background: String,
    /// Decals in paint order.
    #[serde(default)]
    pub elements: Vec<DecalElement>,
}

impl Default for SurfaceDocument {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND.to_string(),
            elements: Vec::new(),
        }
    }
}

impl SurfaceDocument {
    fn default_background() -> String {
        DEFAULT_BACKGROUND.to_string()
    }

    /// Snapshot a store.
    #[must_use]
    pub fn from_store(store: &DecalStore, background: impl Into<String>) -> Self {
        Self {
            background: background.into(),
            elements: store.iter().cloned().collect(),
        }
    }

    /// Replace the contents of `store` with this document's decals.
    pub fn restore_into(self, store: &mut DecalStore) -> String {
        store.restore(self.elements);
        self.background
    }

    /// Serialize the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(CoreError::Serialization)
    }

    /// Deserialize a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(CoreError::Serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn test_json_roundtrip_preserves_order() {
        let mut store = DecalStore::new();
        store.add(DecalElement::text("A", 10.0, "#111111").with_position(Point::new(1.0, 2.0)));
        store.add(DecalElement::text("B", 20.0, "#222222").with_rotation(45.0));

        let doc = SurfaceDocument::from_store(&store, "#ff0000");
        let json = doc.to_json().expect("serialize");
        let parsed = SurfaceDocument::from_json(&json).expect("deserialize");
        assert_eq!(parsed, doc);

        let mut restored = DecalStore::new();
        let background = parsed.restore_into(&mut restored);
        assert_eq!(background, "#ff0000");
        assert_eq!(restored.ids(), store.ids());
    }

    #[test]
    fn test_missing_fields_default() {
        let doc = SurfaceDocument::from_json("{}").expect("deserialize");
        assert_eq!(doc, SurfaceDocument::default());
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(SurfaceDocument::from_json("<svg/>").is_err());
    }
}
