//! # Livery Editor
//!
//! Editing session tying the decal model to the texture pipeline.
//!
//! ```no_run
//! use std::time::Instant;
//! use livery_editor::{TextProps, TextureEditor};
//! use livery_core::EditorConfig;
//!
//! livery_editor::init_tracing();
//! let mut editor = TextureEditor::new(EditorConfig::from_env());
//! editor.add_text_element(TextProps::new("HELLO"));
//!
//! // Once per frame:
//! if let Some(pending) = editor.poll(Instant::now()) {
//!     # let decoder = livery_renderer::SvgDecoder::new(512);
//!     let (ticket, result) = pending.run(&decoder);
//!     editor.complete_resync(ticket, result);
//! }
//! editor.save();
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod persistence;
pub mod session;
pub mod telemetry;

pub use error::StorageError;
pub use persistence::{
    FileSlotStorage, MemorySlotStorage, PersistenceAdapter, SlotStorage, STORAGE_KEY,
};
pub use session::{stencil_guides, TextProps, TextureEditor};
pub use telemetry::init_tracing;
