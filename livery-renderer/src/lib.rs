//! # Livery Renderer
//!
//! Texture pipeline between the 2D decal surface and a 3D material.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────┐   ┌────────────┐   ┌──────────┐
//! │ Surface  │──▶│ Serializer │──▶│ data URI │──▶│  Decoder   │──▶│  Bridge  │
//! │ (SVG)    │   │ (excludes) │   │          │   │ (resvg)    │   │ version++│
//! └──────────┘   └────────────┘   └──────────┘   └────────────┘   └────┬─────┘
//!                                                                      ▼
//!                                                              MaterialBinding
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bridge;
pub mod decode;
pub mod error;
pub mod image;
pub mod material;
pub mod serializer;
pub mod surface;

pub use bridge::{DecodeOutcome, DecodeTicket, TextureBridge};
pub use decode::{Decoder, FontDatabase, PendingDecode, SvgDecoder};
pub use error::{RenderError, RenderResult};
pub use image::{DecodedImage, ImageFormat, ImagePayload};
pub use material::{MaterialBinding, TextureConsumer};
pub use serializer::{parse_document, serialize, to_data_uri, ExcludeSet};
pub use surface::{GuideLayer, Surface, SvgNode};
