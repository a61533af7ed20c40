//! # Livery Core
//!
//! Decal model and interaction logic for painting a texture from a 2D
//! authoring surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 livery-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Decal Store       │  Surface Controller    │
//! │  - Elements        │  - Selection           │
//! │  - Paint order     │  - Drag gestures       │
//! │  - Patches         │  - Frame correction    │
//! ├─────────────────────────────────────────────┤
//! │  Sync State        │  Configuration         │
//! │  - Dirty tracking  │  - Defaults + env      │
//! │  - Coalescing      │  - Editor mode         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Rendering the surface to a texture lives in `livery-renderer`; the editing
//! session tying both together lives in `livery-editor`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod controller;
pub mod document;
pub mod element;
pub mod error;
pub mod event;
pub mod geometry;
pub mod metrics;
pub mod patch;
pub mod state;
pub mod store;

pub use config::{EditorConfig, EditorMode};
pub use controller::{
    DragState, ElementProperties, GestureOutcome, SelectionIndicator, SelectionObserver,
    SurfaceController, TransformCommit, Viewport,
};
pub use document::SurfaceDocument;
pub use element::{DecalElement, DecalKind, ElementId, Scale, TextAnchor};
pub use error::{CoreError, CoreResult};
pub use event::{PointerEvent, PointerPhase};
pub use geometry::{Affine, Point, Rect};
pub use patch::ElementPatch;
pub use state::{ResyncScheduler, SyncState};
pub use store::DecalStore;

/// Side of the square canvas in canvas units.
pub const CANVAS_SIZE: f32 = 4096.0;

/// Livery core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
