//! Texture serialization.
//!
//! Walks the visual surface and writes SVG markup containing only what belongs
//! on the texture: overlay layers named in the [`ExcludeSet`] are dropped with
//! their whole subtree, and the root's preview background declaration is
//! removed so the texture stays transparent outside the decals.

use std::collections::BTreeSet;
use std::fmt::Write;

use livery_core::config::DEFAULT_EXCLUDE_LABELS;
use livery_core::element::DecalKind;
use livery_core::SurfaceDocument;

use crate::surface::{Surface, SvgNode, DOCUMENT_NODE_ID};

/// Prefix of SVG data URIs.
pub const SVG_DATA_URI_PREFIX: &str = "data:image/svg+xml,";

/// Labels and ids stripped from the serialized texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludeSet {
    labels: BTreeSet<String>,
}

impl Default for ExcludeSet {
    fn default() -> Self {
        Self::from_labels(DEFAULT_EXCLUDE_LABELS)
    }
}

impl ExcludeSet {
    /// Build an exclude set from labels.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether a label or id is excluded.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.labels.contains(name)
    }

    /// Check whether a node is excluded by its label or its id.
    #[must_use]
    pub fn excludes(&self, node: &SvgNode) -> bool {
        node.label().is_some_and(|l| self.contains(l)) || node.id().is_some_and(|i| self.contains(i))
    }
}

/// Serialize the surface to self-contained SVG markup.
///
/// The output is a pure function of the surface and the exclude set.
#[must_use]
pub fn serialize(surface: &Surface, exclude: &ExcludeSet) -> String {
    let root = surface.root();
    let mut out = String::with_capacity(4096);
    let attributes = root.attributes.iter().filter_map(|(k, v)| {
        if *k == "style" {
            let stripped = strip_declaration(v, "background-color");
            (!stripped.is_empty()).then_some((*k, stripped))
        } else {
            Some((*k, v.clone()))
        }
    });
    open_tag(&mut out, root.name, attributes);
    write_body(&mut out, root, exclude);
    out
}

/// Wrap SVG markup in a percent-encoded data URI.
#[must_use]
pub fn to_data_uri(svg: &str) -> String {
    format!("{SVG_DATA_URI_PREFIX}{}", urlencoding::encode(svg))
}

/// Recover the surface document embedded in serialized markup.
///
/// Image payloads are read back from each decal's `href`. Returns `None` for
/// markup this crate did not produce.
#[must_use]
pub fn parse_document(svg: &str) -> Option<SurfaceDocument> {
    let marker = format!("<metadata id=\"{DOCUMENT_NODE_ID}\">");
    let start = svg.find(&marker)? + marker.len();
    let len = svg[start..].find("</metadata>")?;
    let json = unescape_xml(&svg[start..start + len]);
    let mut document = match SurfaceDocument::from_json(&json) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!("Embedded surface document is unreadable: {e}");
            return None;
        }
    };
    for element in &mut document.elements {
        if let DecalKind::Image { data_uri, .. } = &mut element.kind {
            if data_uri.is_empty() {
                let Some(href) = decal_href(svg, &element.id.to_string()) else {
                    tracing::warn!("Image decal {} has no payload in the markup", element.id);
                    return None;
                };
                *data_uri = href;
            }
        }
    }
    Some(document)
}

/// The `href` of the image inside the decal group with `id`.
fn decal_href(svg: &str, id: &str) -> Option<String> {
    let group = svg.find(&format!("<g id=\"{id}\""))?;
    let rest = &svg[group..];
    let end = rest.find("</g>")?;
    let attr = " href=\"";
    let value_start = rest[..end].find(attr)? + attr.len();
    let value_len = rest[value_start..end].find('"')?;
    Some(unescape_xml(&rest[value_start..value_start + value_len]))
}

fn write_node(out: &mut String, node: &SvgNode, exclude: &ExcludeSet) {
    if exclude.excludes(node) {
        return;
    }
    open_tag(
        out,
        node.name,
        node.attributes.iter().map(|(k, v)| (*k, v.clone())),
    );
    write_body(out, node, exclude);
}

/// Writes content and the closing tag for a node whose start tag is open
/// (missing its final `>`).
fn write_body(out: &mut String, node: &SvgNode, exclude: &ExcludeSet) {
    if node.children.is_empty() && node.text.is_none() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if let Some(text) = &node.text {
        out.push_str(&escape_xml(text));
    }
    for child in &node.children {
        write_node(out, child, exclude);
    }
    let _ = write!(out, "</{}>", node.name);
}

fn open_tag(
    out: &mut String,
    name: &str,
    attributes: impl Iterator<Item = (&'static str, String)>,
) {
    let _ = write!(out, "<{name}");
    for (key, value) in attributes {
        let _ = write!(out, " {key}=\"{}\"", escape_xml(&value));
    }
}

/// Remove the first declaration of `property` from an inline style, leaving
/// every other declaration as written.
fn strip_declaration(style: &str, property: &str) -> String {
    let mut removed = false;
    style
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| {
            if removed {
                return true;
            }
            let name = decl.split(':').next().unwrap_or_default().trim();
            if name.eq_ignore_ascii_case(property) {
                removed = true;
                false
            } else {
                true
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn unescape_xml(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
