//! The editing session.
//!
//! [`TextureEditor`] owns the decal store, the surface controller, the resync
//! scheduler, the texture bridge and the saved slot, and is the only place
//! that mutates the store. Every mutation marks the surface dirty; the host
//! drives resyncs by calling [`TextureEditor::poll`] from its frame loop (or
//! [`TextureEditor::flush`] to resync inline).
//!
//! Invalid input, unknown ids and failed decodes never surface as errors:
//! they are logged and the operation does nothing.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use livery_core::controller::{GestureOutcome, SelectionObserver, TransformCommit, Viewport};
use livery_core::document::DEFAULT_BACKGROUND;
use livery_core::element::{DecalElement, DecalKind, ElementId, TextAnchor};
use livery_core::geometry::{Point, Rect};
use livery_core::patch::{self, ElementPatch};
use livery_core::state::{ResyncScheduler, SyncState};
use livery_core::{
    CoreResult, DecalStore, EditorConfig, EditorMode, ElementProperties, PointerEvent,
    SurfaceController, SurfaceDocument,
};
use livery_renderer::image::{embed_image, fit_within};
use livery_renderer::{
    parse_document, serialize, to_data_uri, DecodeOutcome, DecodeTicket, DecodedImage, Decoder,
    ExcludeSet, GuideLayer, PendingDecode, RenderResult, Surface, SvgDecoder, TextureBridge,
};
use tokio::sync::watch;

use crate::persistence::{FileSlotStorage, PersistenceAdapter};

/// Font size of a new text decal when none is given.
pub const DEFAULT_FONT_SIZE: f32 = 160.0;

/// Color of a new text decal when none is given.
pub const DEFAULT_TEXT_COLOR: &str = "#000000";

/// Properties of a text decal to add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextProps {
    /// Text content.
    pub content: String,
    /// Font size in canvas units.
    pub font_size: f32,
    /// Fill color as hex.
    pub color: String,
    /// Position; the canvas center when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Text anchor.
    pub anchor: TextAnchor,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            content: "TEXT".to_string(),
            font_size: DEFAULT_FONT_SIZE,
            color: DEFAULT_TEXT_COLOR.to_string(),
            position: None,
            rotation: 0.0,
            anchor: TextAnchor::Center,
        }
    }
}

impl TextProps {
    /// Text props with default styling.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    fn into_element(self, center: Point) -> CoreResult<DecalElement> {
        let content = patch::parse_text(&self.content)?;
        let font_size = patch::check_font_size(self.font_size)?;
        let color = patch::parse_color(&self.color)?;
        let rotation = patch::parse_rotation(&self.rotation.to_string())?;
        let position = patch::check_position(self.position.unwrap_or(center))?;
        Ok(DecalElement::new(DecalKind::Text {
            content,
            font_size,
            color,
            anchor: self.anchor,
        })
        .with_position(position)
        .with_rotation(rotation))
    }
}

/// Overlay outlines of the printable faces plus the canvas frame.
#[must_use]
pub fn stencil_guides(canvas_size: f32) -> Vec<GuideLayer> {
    let panel = canvas_size / 4.0;
    vec![
        GuideLayer::outline("stencil_lid", Rect::new(panel, 0.0, panel, panel)),
        GuideLayer::outline("stencil_left", Rect::new(0.0, panel, panel, panel)),
        GuideLayer::outline("stencil_front", Rect::new(panel, panel, panel, panel)),
        GuideLayer::outline("stencil_right", Rect::new(panel * 2.0, panel, panel, panel)),
        GuideLayer::outline("stencil_back", Rect::new(panel * 3.0, panel, panel, panel)),
        GuideLayer::outline("frame", Rect::new(0.0, 0.0, canvas_size, canvas_size)),
    ]
}

/// A decal authoring session bound to one texture.
pub struct TextureEditor {
    config: EditorConfig,
    store: DecalStore,
    background: String,
    controller: SurfaceController,
    scheduler: ResyncScheduler,
    bridge: TextureBridge,
    decoder: Arc<dyn Decoder + Send + Sync>,
    persistence: PersistenceAdapter,
    guides: Vec<GuideLayer>,
    exclude: ExcludeSet,
}

impl std::fmt::Debug for TextureEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureEditor")
            .field("mode", &self.config.mode)
            .field("elements", &self.store.len())
            .field("background", &self.background)
            .field("sync", &self.scheduler.state())
            .field("version", &self.bridge.version())
            .finish_non_exhaustive()
    }
}

impl TextureEditor {
    /// Start a session with the system font set and the configured storage.
    ///
    /// An unusable data directory falls back to in-memory saves.
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        let persistence = match &config.data_dir {
            Some(dir) => match FileSlotStorage::new(dir) {
                Ok(storage) => PersistenceAdapter::new(storage),
                Err(e) => {
                    tracing::warn!(
                        "Data directory {} unusable, saves stay in memory: {e}",
                        dir.display()
                    );
                    PersistenceAdapter::in_memory()
                }
            },
            None => PersistenceAdapter::in_memory(),
        };
        let decoder = Arc::new(SvgDecoder::new(config.texture_size));
        Self::with_parts(config, decoder, persistence)
    }

    /// Start a session with an explicit decoder and storage.
    #[must_use]
    pub fn with_parts(
        config: EditorConfig,
        decoder: Arc<dyn Decoder + Send + Sync>,
        persistence: PersistenceAdapter,
    ) -> Self {
        let viewport = Viewport {
            display_width: config.display_size,
            display_height: config.display_size,
            canvas_size: config.canvas_size,
        };
        let exclude = ExcludeSet::from_labels(config.exclude_labels.iter().cloned());
        tracing::info!(
            mode = ?config.mode,
            texture_size = config.texture_size,
            "Texture editor started"
        );
        Self {
            scheduler: ResyncScheduler::new(config.debounce()),
            guides: stencil_guides(config.canvas_size),
            controller: SurfaceController::new(viewport),
            store: DecalStore::new(),
            background: DEFAULT_BACKGROUND.to_string(),
            bridge: TextureBridge::new(),
            decoder,
            persistence,
            exclude,
            config,
        }
    }

    // ------------------------------------------------------------------
    // Authoring actions
    // ------------------------------------------------------------------

    /// Add a text decal. Returns its id, or `None` if the props are invalid
    /// or authoring is disabled.
    pub fn add_text_element(&mut self, props: TextProps) -> Option<ElementId> {
        if !self.authoring_allowed("add_text_element") {
            return None;
        }
        let center = self.canvas_center();
        match props.into_element(center) {
            Ok(element) => {
                let id = self.store.add(element);
                self.mark_dirty();
                Some(id)
            }
            Err(e) => {
                tracing::warn!("Text decal rejected: {e}");
                None
            }
        }
    }

    /// Add an image decal from PNG, JPEG or WebP bytes, centered and scaled
    /// to fit the configured maximum dimension.
    pub fn add_image_element(&mut self, bytes: &[u8]) -> Option<ElementId> {
        if !self.authoring_allowed("add_image_element") {
            return None;
        }
        let payload = match embed_image(bytes) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Image decal rejected: {e}");
                return None;
            }
        };
        let (width, height) =
            fit_within(payload.width, payload.height, self.config.max_image_dimension);
        let element = DecalElement::new(DecalKind::Image {
            data_uri: payload.data_uri,
            intrinsic_width: payload.width,
            intrinsic_height: payload.height,
            width,
            height,
        })
        .with_position(self.canvas_center());
        let id = self.store.add(element);
        self.mark_dirty();
        Some(id)
    }

    /// Merge a patch into a decal.
    ///
    /// Every field is validated first; if any is rejected the decal keeps
    /// all of its previous values.
    pub fn update_element(&mut self, id: ElementId, patch: &ElementPatch) -> bool {
        if !self.authoring_allowed("update_element") || patch.is_empty() {
            return false;
        }
        let patch = match patch.validated() {
            Ok(patch) => patch,
            Err(e) => {
                tracing::warn!("Update of {id} rejected: {e}");
                return false;
            }
        };
        if !self.store.update(id, &patch) {
            return false;
        }
        self.controller.refresh_indicator(&self.store);
        self.mark_dirty();
        true
    }

    /// Remove a decal, dropping it from the selection.
    pub fn remove_element(&mut self, id: ElementId) -> bool {
        if !self.authoring_allowed("remove_element") {
            return false;
        }
        if self.store.remove(id).is_none() {
            return false;
        }
        self.controller.forget(id);
        self.mark_dirty();
        true
    }

    /// Change the base paint color.
    pub fn set_background_color(&mut self, input: &str) -> bool {
        if !self.authoring_allowed("set_background_color") {
            return false;
        }
        match patch::parse_color(input) {
            Ok(color) => {
                self.background = color;
                self.mark_dirty();
                true
            }
            Err(e) => {
                tracing::warn!("Background color rejected: {e}");
                false
            }
        }
    }

    /// Replace a text decal's content with user input.
    pub fn edit_text(&mut self, id: ElementId, input: &str) -> bool {
        self.edit_text_field(
            id,
            "text",
            patch::parse_text(input).map(|v| ElementPatch::new().content(v)),
        )
    }

    /// Change a text decal's font size from user input.
    pub fn edit_font_size(&mut self, id: ElementId, input: &str) -> bool {
        self.edit_text_field(
            id,
            "font size",
            patch::parse_font_size(input).map(|v| ElementPatch::new().font_size(v)),
        )
    }

    /// Change a text decal's color from user input.
    pub fn edit_color(&mut self, id: ElementId, input: &str) -> bool {
        self.edit_text_field(
            id,
            "color",
            patch::parse_color(input).map(|v| ElementPatch::new().color(v)),
        )
    }

    /// Change a decal's rotation from user input.
    pub fn edit_rotation(&mut self, id: ElementId, input: &str) -> bool {
        match patch::parse_rotation(input) {
            Ok(degrees) => self.update_element(id, &ElementPatch::new().rotation(degrees)),
            Err(e) => {
                tracing::warn!("Rotation edit on {id} rejected: {e}");
                false
            }
        }
    }

    /// Apply a resize/rotate handle result and resync without waiting.
    pub fn commit_transform(&mut self, id: ElementId, commit: TransformCommit) -> bool {
        if !self.authoring_allowed("commit_transform") {
            return false;
        }
        if !self.controller.commit_transform(&mut self.store, id, commit) {
            return false;
        }
        self.scheduler.request_immediate();
        true
    }

    fn edit_text_field(
        &mut self,
        id: ElementId,
        field: &str,
        parsed: CoreResult<ElementPatch>,
    ) -> bool {
        let is_text = self
            .store
            .get(id)
            .is_some_and(|e| matches!(e.kind, DecalKind::Text { .. }));
        if !is_text {
            tracing::debug!("Edit of {field} ignored, {id} is not a text decal");
            return false;
        }
        match parsed {
            Ok(patch) => self.update_element(id, &patch),
            Err(e) => {
                tracing::warn!("Edit of {field} on {id} rejected: {e}");
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Pointer input and selection
    // ------------------------------------------------------------------

    /// Forward a pointer event to the surface controller.
    ///
    /// Moves do not mark the surface dirty; the committed position is
    /// resynced as soon as the gesture ends.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> GestureOutcome {
        if self.config.mode == EditorMode::Basic {
            return GestureOutcome::Ignored;
        }
        let outcome = self.controller.handle(&mut self.store, event);
        match outcome {
            GestureOutcome::Committed(_) | GestureOutcome::Cancelled(_) => {
                self.scheduler.request_immediate();
            }
            GestureOutcome::Ignored | GestureOutcome::Started(_) | GestureOutcome::Moved(_) => {}
        }
        outcome
    }

    /// Select a decal without dragging it.
    pub fn select(&mut self, id: ElementId) -> bool {
        self.controller.select(&self.store, id)
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.controller.clear_selection();
    }

    /// Properties of the selected decal.
    #[must_use]
    pub fn selected_properties(&self) -> Option<ElementProperties> {
        let id = self.controller.selected()?;
        self.store.get(id).map(ElementProperties::from)
    }

    /// Install the property panel.
    pub fn set_selection_observer(&mut self, observer: Box<dyn SelectionObserver>) {
        self.controller.set_observer(observer);
    }

    /// Update the on-screen size of the surface.
    pub fn set_display_size(&mut self, width: f32, height: f32) {
        self.controller.set_viewport(Viewport {
            display_width: width,
            display_height: height,
            canvas_size: self.config.canvas_size,
        });
    }

    /// Replace the authoring overlays.
    pub fn set_guides(&mut self, guides: Vec<GuideLayer>) {
        self.guides = guides;
    }

    // ------------------------------------------------------------------
    // Texture sync
    // ------------------------------------------------------------------

    /// Start a resync if one is due at `now`.
    ///
    /// The returned request must be decoded and passed to
    /// [`Self::complete_resync`].
    pub fn poll(&mut self, now: Instant) -> Option<PendingDecode> {
        if self.controller.is_dragging() || !self.scheduler.is_due(now) {
            return None;
        }
        self.begin_resync()
    }

    /// Serialize the surface and repoint the texture at it.
    pub fn begin_resync(&mut self) -> Option<PendingDecode> {
        let svg = match self.serialized() {
            Ok(svg) => svg,
            Err(e) => {
                tracing::warn!("Surface serialization failed: {e}");
                return None;
            }
        };
        let source = to_data_uri(&svg);
        let ticket = self.bridge.repoint(&source);
        self.scheduler.started(ticket.seq());
        Some(PendingDecode::new(ticket, source))
    }

    /// Hand a finished decode back to the bridge.
    pub fn complete_resync(
        &mut self,
        ticket: DecodeTicket,
        result: RenderResult<DecodedImage>,
    ) -> DecodeOutcome {
        let outcome = self.bridge.complete(ticket, result);
        self.scheduler.finished(ticket.seq());
        outcome
    }

    /// Resync now, decoding on the current thread.
    pub fn flush(&mut self) -> Option<DecodeOutcome> {
        let pending = self.begin_resync()?;
        let (ticket, result) = pending.run(self.decoder.as_ref());
        Some(self.complete_resync(ticket, result))
    }

    /// Resync now, decoding on tokio's blocking pool.
    pub async fn resync(&mut self) -> Option<DecodeOutcome> {
        let pending = self.begin_resync()?;
        let (ticket, result) = pending.run_blocking(Arc::clone(&self.decoder)).await;
        Some(self.complete_resync(ticket, result))
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Save the serialized surface to the single slot.
    pub fn save(&mut self) -> bool {
        match self.serialized() {
            Ok(svg) => self.persistence.save(&svg),
            Err(e) => {
                tracing::warn!("Surface serialization failed, nothing saved: {e}");
                false
            }
        }
    }

    /// Restore the saved surface, replacing the current one.
    ///
    /// Returns `false` if nothing was saved or the saved value is not a
    /// surface this editor wrote.
    pub fn load(&mut self) -> bool {
        let Some(svg) = self.persistence.load() else {
            tracing::debug!("No saved surface");
            return false;
        };
        let Some(document) = parse_document(&svg) else {
            tracing::warn!("Saved surface is unreadable, ignoring it");
            return false;
        };
        self.controller.reset();
        self.background = document.restore_into(&mut self.store);
        self.scheduler.request_immediate();
        tracing::info!(elements = self.store.len(), "Restored saved surface");
        true
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Build the visual surface as currently shown.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface document cannot be embedded.
    pub fn surface(&self) -> RenderResult<Surface> {
        let document = SurfaceDocument::from_store(&self.store, self.background.clone());
        let indicator = self.controller.indicator();
        Surface::build(&document, &self.guides, indicator.as_ref(), &self.config)
    }

    /// The texture markup for the current surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be built.
    pub fn serialized(&self) -> RenderResult<String> {
        Ok(serialize(&self.surface()?, &self.exclude))
    }

    /// Decals in paint order.
    #[must_use]
    pub fn store(&self) -> &DecalStore {
        &self.store
    }

    /// Base paint color.
    #[must_use]
    pub fn background(&self) -> &str {
        &self.background
    }

    /// Surface controller.
    #[must_use]
    pub fn controller(&self) -> &SurfaceController {
        &self.controller
    }

    /// Texture bridge (read-only for consumers).
    #[must_use]
    pub fn bridge(&self) -> &TextureBridge {
        &self.bridge
    }

    /// Watch the texture version.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.bridge.subscribe()
    }

    /// Current texture version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.bridge.version()
    }

    /// Current sync state.
    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.scheduler.state()
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    fn canvas_center(&self) -> Point {
        let half = self.config.canvas_size / 2.0;
        Point::new(half, half)
    }

    fn mark_dirty(&mut self) {
        self.scheduler.mark_dirty(Instant::now());
    }

    fn authoring_allowed(&self, action: &str) -> bool {
        if self.config.mode == EditorMode::Basic {
            tracing::info!("{action} ignored in basic mode");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livery_renderer::FontDatabase;
    use std::time::Duration;

    fn editor() -> TextureEditor {
        let config = EditorConfig {
            texture_size: 16,
            ..EditorConfig::default()
        };
        TextureEditor::with_parts(config, headless_decoder(), PersistenceAdapter::in_memory())
    }

    fn headless_decoder() -> Arc<SvgDecoder> {
        Arc::new(SvgDecoder::with_fonts(16, Arc::new(FontDatabase::new())))
    }

    #[test]
    fn test_invalid_text_props_rejected() {
        let mut editor = editor();
        assert!(editor.add_text_element(TextProps::new("   ")).is_none());
        let bad_color = TextProps {
            color: "red".to_string(),
            ..TextProps::new("OK")
        };
        assert!(editor.add_text_element(bad_color).is_none());
        assert!(editor.store().is_empty());
        assert_eq!(editor.sync_state(), SyncState::Clean);
    }

    #[test]
    fn test_mutations_coalesce_until_quiet() {
        let mut editor = editor();
        let id = editor.add_text_element(TextProps::new("A")).expect("added");
        assert!(editor.edit_text(id, "AB"));
        assert!(editor.edit_color(id, "#FF0000"));
        assert_eq!(editor.sync_state(), SyncState::Dirty);

        assert!(editor.poll(Instant::now()).is_none());
        let later = Instant::now() + Duration::from_millis(editor.config().debounce_ms + 1);
        let pending = editor.poll(later).expect("resync due");
        assert!(matches!(editor.sync_state(), SyncState::Resyncing { .. }));

        let (ticket, result) = pending.run(headless_decoder().as_ref());
        assert_eq!(
            editor.complete_resync(ticket, result),
            DecodeOutcome::Applied { version: 1 }
        );
        assert_eq!(editor.sync_state(), SyncState::Clean);
    }

    #[test]
    fn test_edits_validate_input() {
        let mut editor = editor();
        let id = editor.add_text_element(TextProps::new("SIZE")).expect("added");
        assert!(!editor.edit_font_size(id, "huge"));
        assert!(!editor.edit_font_size(id, "0"));
        assert!(editor.edit_font_size(id, "48"));
        assert!(!editor.edit_rotation(id, "NaN"));
        assert!(editor.edit_rotation(id, "-90"));

        let element = editor.store().get(id).expect("exists");
        assert!((element.rotation - 270.0).abs() < 1e-4);
        assert!(matches!(
            element.kind,
            DecalKind::Text { font_size, .. } if (font_size - 48.0).abs() < f32::EPSILON
        ));
    }

    #[test]
    fn test_basic_mode_ignores_authoring() {
        let config = EditorConfig {
            mode: EditorMode::Basic,
            texture_size: 16,
            ..EditorConfig::default()
        };
        let mut editor =
            TextureEditor::with_parts(config, headless_decoder(), PersistenceAdapter::in_memory());
        assert!(editor.add_text_element(TextProps::new("NOPE")).is_none());
        assert!(!editor.set_background_color("#000000"));
        assert_eq!(editor.background(), DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_pointer_up_requests_immediate_resync() {
        let mut editor = editor();
        let id = editor.add_text_element(TextProps::new("DRAG")).expect("added");
        editor.flush();

        editor.handle_pointer(&PointerEvent::down(10.0, 10.0, id));
        editor.handle_pointer(&PointerEvent::moved(20.0, 10.0));
        assert_eq!(editor.sync_state(), SyncState::Clean);
        assert!(editor.poll(Instant::now()).is_none());

        editor.handle_pointer(&PointerEvent::up(20.0, 10.0));
        assert!(editor.poll(Instant::now()).is_some());
    }

    #[test]
    fn test_non_finite_position_rejected() {
        let mut editor = editor();
        let props = TextProps {
            position: Some(Point::new(f32::INFINITY, 10.0)),
            ..TextProps::new("FAR")
        };
        assert!(editor.add_text_element(props).is_none());
        assert!(editor.store().is_empty());
    }

    #[test]
    fn test_text_props_from_json() {
        let props: TextProps =
            serde_json::from_str(r##"{"content": "HI", "color": "#00ff00"}"##).expect("props");
        assert_eq!(props.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(props.position, None);
    }
}
