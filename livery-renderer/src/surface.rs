//! The visual surface: an SVG node tree regenerated from the decal model.
//!
//! ```text
//! <svg viewBox="0 0 4096 4096" style="background-color:…;user-select:none">
//!   <rect id="hit-area"/>                    transparent pointer target
//!   <g inkscape:label="stencil_left">…</g>   guide layers (never textured)
//!   <g id="<decal id>">…</g>                 one group per decal, paint order
//!   <metadata id="livery-document">…</metadata>
//!   <rect id="selection-rect"/>              selection indicator
//! </svg>
//! ```
//!
//! The base paint color only appears in the root `style`, for the editor's
//! preview. The texture is transparent outside the decals; the consumer
//! paints the base color with its own material.

use livery_core::controller::SelectionIndicator;
use livery_core::element::{DecalElement, DecalKind, TextAnchor};
use livery_core::geometry::{Affine, Rect};
use livery_core::{EditorConfig, SurfaceDocument};

use crate::error::RenderResult;

/// Id of the node carrying the embedded surface document.
pub const DOCUMENT_NODE_ID: &str = "livery-document";

/// Id of the selection indicator node.
pub const SELECTION_RECT_ID: &str = "selection-rect";

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const INKSCAPE_NS: &str = "http://www.inkscape.org/namespaces/inkscape";
const LABEL_ATTR: &str = "inkscape:label";

/// A node of the visual surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgNode {
    /// Element name.
    pub name: &'static str,
    /// Attributes in insertion order.
    pub attributes: Vec<(&'static str, String)>,
    /// Character content.
    pub text: Option<String>,
    /// Child nodes in paint order.
    pub children: Vec<SvgNode>,
}

impl SvgNode {
    /// Create an empty node.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attributes.push((key, value.into()));
        self
    }

    /// Set the character content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child.
    #[must_use]
    pub fn child(mut self, node: SvgNode) -> Self {
        self.children.push(node);
        self
    }

    /// Look up an attribute value.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The node's `id` attribute.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// The node's layer label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.attribute(LABEL_ATTR)
    }

    /// Depth-first search by `id`.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&SvgNode> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_id(id))
    }
}

/// An authoring overlay (stencil outline, placement frame) drawn on the
/// surface but never on the texture.
#[derive(Debug, Clone, PartialEq)]
pub struct GuideLayer {
    /// Layer label; matches an entry of the exclude set.
    pub label: String,
    /// Overlay content.
    pub nodes: Vec<SvgNode>,
}

impl GuideLayer {
    /// A dashed outline of `region`.
    #[must_use]
    pub fn outline(label: impl Into<String>, region: Rect) -> Self {
        let rect = SvgNode::new("rect")
            .attr("x", fmt_num(region.x))
            .attr("y", fmt_num(region.y))
            .attr("width", fmt_num(region.width))
            .attr("height", fmt_num(region.height))
            .attr("fill", "none")
            .attr("stroke", "#888888")
            .attr("stroke-width", "4")
            .attr("stroke-dasharray", "24 12");
        Self {
            label: label.into(),
            nodes: vec![rect],
        }
    }

    fn into_node(self) -> SvgNode {
        let mut group = SvgNode::new("g")
            .attr("id", self.label.clone())
            .attr(LABEL_ATTR, self.label);
        group.children = self.nodes;
        group
    }
}

/// The rendered authoring surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    root: SvgNode,
}

impl Surface {
    /// Build the surface for `document`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be embedded.
    pub fn build(
        document: &SurfaceDocument,
        guides: &[GuideLayer],
        indicator: Option<&SelectionIndicator>,
        config: &EditorConfig,
    ) -> RenderResult<Self> {
        let size = fmt_num(config.canvas_size);
        let mut root = SvgNode::new("svg")
            .attr("xmlns", SVG_NS)
            .attr("xmlns:inkscape", INKSCAPE_NS)
            .attr("width", size.clone())
            .attr("height", size.clone())
            .attr("viewBox", format!("0 0 {size} {size}"))
            .attr(
                "style",
                format!("background-color:{};user-select:none", document.background),
            );

        root.children.push(
            SvgNode::new("rect")
                .attr("id", "hit-area")
                .attr("width", size.clone())
                .attr("height", size)
                .attr("fill", "#000000")
                .attr("fill-opacity", "0"),
        );
        root.children
            .extend(guides.iter().cloned().map(GuideLayer::into_node));
        root.children
            .extend(document.elements.iter().map(decal_node));
        root.children.push(
            SvgNode::new("metadata")
                .attr("id", DOCUMENT_NODE_ID)
                .with_text(embedded_document(document).to_json()?),
        );
        root.children.push(selection_node(indicator));

        Ok(Self { root })
    }

    /// Root `<svg>` node.
    #[must_use]
    pub fn root(&self) -> &SvgNode {
        &self.root
    }
}

/// The document as embedded in the metadata node. Image payloads are left
/// out; they are already carried by each decal's `href`.
fn embedded_document(document: &SurfaceDocument) -> SurfaceDocument {
    let mut embedded = document.clone();
    for element in &mut embedded.elements {
        if let DecalKind::Image { data_uri, .. } = &mut element.kind {
            data_uri.clear();
        }
    }
    embedded
}

fn decal_node(element: &DecalElement) -> SvgNode {
    let id = element.id.to_string();
    let group = SvgNode::new("g")
        .attr("id", id.clone())
        .attr(LABEL_ATTR, id)
        .attr("transform", fmt_matrix(&element.canvas_transform()));

    let content = match &element.kind {
        DecalKind::Text {
            content,
            font_size,
            color,
            anchor,
        } => {
            let text = SvgNode::new("text")
                .attr("x", "0")
                .attr("font-size", fmt_num(*font_size))
                .attr("fill", color.clone())
                .attr("font-family", "sans-serif");
            match anchor {
                TextAnchor::Center => text
                    .attr("y", "0")
                    .attr("text-anchor", "middle")
                    .attr("dominant-baseline", "central"),
                TextAnchor::TopLeft => text.attr("y", fmt_num(*font_size)),
            }
            .with_text(content.clone())
        }
        DecalKind::Image {
            data_uri,
            width,
            height,
            ..
        } => SvgNode::new("image")
            .attr("x", fmt_num(-width / 2.0))
            .attr("y", fmt_num(-height / 2.0))
            .attr("width", fmt_num(*width))
            .attr("height", fmt_num(*height))
            .attr("preserveAspectRatio", "none")
            .attr("href", data_uri.clone()),
    };
    group.child(content)
}

fn selection_node(indicator: Option<&SelectionIndicator>) -> SvgNode {
    let bounds = indicator.map_or(Rect::default(), |i| i.bounds);
    let node = SvgNode::new("rect")
        .attr("id", SELECTION_RECT_ID)
        .attr(LABEL_ATTR, SELECTION_RECT_ID)
        .attr("x", fmt_num(bounds.x))
        .attr("y", fmt_num(bounds.y))
        .attr("width", fmt_num(bounds.width))
        .attr("height", fmt_num(bounds.height))
        .attr("fill", "none")
        .attr("stroke", "#1e90ff")
        .attr("stroke-width", "6")
        .attr("stroke-dasharray", "18 10");
    if indicator.is_some() {
        node
    } else {
        node.attr("display", "none")
    }
}

/// Format a number with at most three decimals and no trailing zeros.
#[must_use]
pub fn fmt_num(value: f32) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let mut s = format!("{value:.3}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

fn fmt_matrix(t: &Affine) -> String {
    format!(
        "matrix({} {} {} {} {} {})",
        fmt_num(t.a),
        fmt_num(t.b),
        fmt_num(t.c),
        fmt_num(t.d),
        fmt_num(t.e),
        fmt_num(t.f)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use livery_core::geometry::Point;
    use livery_core::{DecalStore, ElementId};

    fn document_with_text() -> (SurfaceDocument, ElementId) {
        let mut store = DecalStore::new();
        let id = store.add(
            DecalElement::text("HELLO", 120.0, "#ff0000").with_position(Point::new(100.0, 200.0)),
        );
        (SurfaceDocument::from_store(&store, "#336699"), id)
    }

    #[test]
    fn test_root_layout() {
        let (doc, id) = document_with_text();
        let guides = [GuideLayer::outline("stencil_left", Rect::new(0.0, 0.0, 10.0, 10.0))];
        let surface =
            Surface::build(&doc, &guides, None, &EditorConfig::default()).expect("build");
        let root = surface.root();

        assert_eq!(root.attribute("viewBox"), Some("0 0 4096 4096"));
        assert_eq!(
            root.attribute("style"),
            Some("background-color:#336699;user-select:none")
        );
        let order: Vec<_> = root
            .children
            .iter()
            .map(|c| c.id().or(c.label()).unwrap_or(c.name))
            .collect();
        let id = id.to_string();
        assert_eq!(
            order,
            [
                "hit-area",
                "stencil_left",
                id.as_str(),
                DOCUMENT_NODE_ID,
                SELECTION_RECT_ID
            ]
        );
    }

    #[test]
    fn test_decal_group_carries_transform_and_text() {
        let (doc, id) = document_with_text();
        let surface = Surface::build(&doc, &[], None, &EditorConfig::default()).expect("build");
        let group = surface.root().find_by_id(&id.to_string()).expect("decal group");
        assert_eq!(group.attribute("transform"), Some("matrix(1 0 0 1 100 200)"));
        let text = &group.children[0];
        assert_eq!(text.text.as_deref(), Some("HELLO"));
        assert_eq!(text.attribute("text-anchor"), Some("middle"));
    }

    #[test]
    fn test_selection_rect_hidden_without_indicator() {
        let (doc, id) = document_with_text();
        let config = EditorConfig::default();
        let hidden = Surface::build(&doc, &[], None, &config).expect("build");
        let rect = hidden.root().find_by_id(SELECTION_RECT_ID).expect("rect");
        assert_eq!(rect.attribute("display"), Some("none"));

        let indicator = SelectionIndicator {
            element_id: id,
            bounds: Rect::new(1.0, 2.0, 3.0, 4.0),
        };
        let shown = Surface::build(&doc, &[], Some(&indicator), &config).expect("build");
        let rect = shown.root().find_by_id(SELECTION_RECT_ID).expect("rect");
        assert_eq!(rect.attribute("display"), None);
        assert_eq!(rect.attribute("width"), Some("3"));
    }

    #[test]
    fn test_no_opaque_base_layer() {
        let (doc, _) = document_with_text();
        let surface = Surface::build(&doc, &[], None, &EditorConfig::default()).expect("build");
        let root = surface.root();
        assert!(root
            .children
            .iter()
            .all(|c| c.attribute("fill") != Some("#336699")));
        assert_eq!(
            root.find_by_id("hit-area").and_then(|n| n.attribute("fill-opacity")),
            Some("0")
        );
    }

    #[test]
    fn test_metadata_omits_image_payload() {
        let mut store = DecalStore::new();
        let id = store.add(DecalElement::new(DecalKind::Image {
            data_uri: "data:image/png;base64,QUJD".to_string(),
            intrinsic_width: 2,
            intrinsic_height: 2,
            width: 20.0,
            height: 20.0,
        }));
        let doc = SurfaceDocument::from_store(&store, "#ffffff");
        let surface = Surface::build(&doc, &[], None, &EditorConfig::default()).expect("build");
        let root = surface.root();

        let metadata = root.find_by_id(DOCUMENT_NODE_ID).expect("metadata");
        assert!(!metadata.text.as_deref().unwrap_or_default().contains("QUJD"));
        let group = root.find_by_id(&id.to_string()).expect("decal group");
        assert_eq!(
            group.children[0].attribute("href"),
            Some("data:image/png;base64,QUJD")
        );
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(4096.0), "4096");
        assert_eq!(fmt_num(0.5), "0.5");
        assert_eq!(fmt_num(-0.0001), "0");
        assert_eq!(fmt_num(1.23456), "1.235");
        assert_eq!(fmt_num(f32::NAN), "0");
    }
}
