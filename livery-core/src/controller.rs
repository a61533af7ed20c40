//! Interactive surface controller: selection, drag gestures and the
//! selection indicator.
//!
//! ```text
//!            pointer_down
//!   Idle ───────────────────▶ Dragging { element, start_screen, start_position }
//!    ▲                              │ pointer_move: position = start + Δ
//!    └──────────────────────────────┘
//!        pointer_up (commit) / cancel (revert)
//! ```
//!
//! Drags are exclusive: while one decal is being dragged, presses on any decal
//! and selection changes are ignored.

use serde::Serialize;

use crate::element::{DecalElement, DecalKind, ElementId, Scale};
use crate::event::{PointerEvent, PointerPhase};
use crate::geometry::{Affine, Point, Rect};
use crate::metrics;
use crate::patch::normalize_degrees;
use crate::store::DecalStore;
use crate::CANVAS_SIZE;

/// Smallest side, in canvas units, a resize may shrink a decal to.
pub const MIN_TRANSFORM_SIZE: f32 = 20.0;

/// Angles rotation snaps to.
pub const ROTATION_SNAPS: [f32; 4] = [0.0, 90.0, 180.0, 270.0];

/// Distance in degrees within which rotation snaps.
pub const ROTATION_SNAP_TOLERANCE: f32 = 5.0;

/// Mapping between the on-screen surface and canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Displayed width in screen pixels.
    pub display_width: f32,
    /// Displayed height in screen pixels.
    pub display_height: f32,
    /// Side of the square canvas in canvas units.
    pub canvas_size: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::square(crate::config::DEFAULT_DISPLAY_SIZE)
    }
}

impl Viewport {
    /// Viewport for a surface displayed at the given pixel size.
    #[must_use]
    pub fn new(display_width: f32, display_height: f32) -> Self {
        Self {
            display_width,
            display_height,
            canvas_size: CANVAS_SIZE,
        }
    }

    /// Viewport for a square display.
    #[must_use]
    pub fn square(display_size: f32) -> Self {
        Self::new(display_size, display_size)
    }

    /// Canvas units per horizontal screen pixel.
    #[must_use]
    pub fn scale_x(&self) -> f32 {
        Self::ratio(self.canvas_size, self.display_width)
    }

    /// Canvas units per vertical screen pixel.
    #[must_use]
    pub fn scale_y(&self) -> f32 {
        Self::ratio(self.canvas_size, self.display_height)
    }

    /// Convert a screen-space delta to canvas space.
    #[must_use]
    pub fn to_canvas_delta(&self, delta: Point) -> Point {
        Point::new(delta.x * self.scale_x(), delta.y * self.scale_y())
    }

    fn ratio(canvas: f32, display: f32) -> f32 {
        if display > 0.0 && display.is_finite() {
            canvas / display
        } else {
            1.0
        }
    }
}

/// Properties of the selected decal, reported to the selection observer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementProperties {
    /// Selected decal.
    pub id: ElementId,
    /// `"text"` or `"image"`.
    pub kind: &'static str,
    /// Text content, for text decals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Font size, for text decals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// Fill color, for text decals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Position in the placement frame.
    pub position: Point,
    /// Rotation in degrees.
    pub rotation: f32,
}

impl From<&DecalElement> for ElementProperties {
    fn from(element: &DecalElement) -> Self {
        let (text, font_size, color) = match &element.kind {
            DecalKind::Text {
                content,
                font_size,
                color,
                ..
            } => (Some(content.clone()), Some(*font_size), Some(color.clone())),
            DecalKind::Image { .. } => (None, None, None),
        };
        Self {
            id: element.id,
            kind: element.kind.name(),
            text,
            font_size,
            color,
            position: element.position,
            rotation: element.rotation,
        }
    }
}

/// Receives selection changes (the host's property panel).
pub trait SelectionObserver {
    /// A decal became selected.
    fn on_selected(&mut self, properties: &ElementProperties);

    /// The selection was cleared.
    fn on_cleared(&mut self) {}
}

/// Gesture state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// A decal is being dragged.
    Dragging {
        /// The dragged decal.
        element_id: ElementId,
        /// Screen point of the pointer press.
        start_screen: Point,
        /// Decal position at the pointer press.
        start_position: Point,
    },
}

/// The on-surface selection rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionIndicator {
    /// Selected decal.
    pub element_id: ElementId,
    /// Canvas-space bounds of its rendered geometry.
    pub bounds: Rect,
}

/// Result of a resize/rotate handle interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformCommit {
    /// Final position.
    pub position: Point,
    /// Final rotation in degrees.
    pub rotation: f32,
    /// Final resize scale.
    pub scale: Scale,
}

/// What a pointer event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Nothing changed.
    Ignored,
    /// A drag started on the decal.
    Started(ElementId),
    /// The dragged decal moved.
    Moved(ElementId),
    /// The drag ended; the decal's position is final.
    Committed(ElementId),
    /// The drag was aborted and the decal returned to its start position.
    Cancelled(ElementId),
}

/// Translates pointer input into selection and transform commits.
#[derive(Default)]
pub struct SurfaceController {
    viewport: Viewport,
    drag: DragState,
    selected: Option<ElementId>,
    indicator: Option<SelectionIndicator>,
    observer: Option<Box<dyn SelectionObserver>>,
}

impl std::fmt::Debug for SurfaceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceController")
            .field("viewport", &self.viewport)
            .field("drag", &self.drag)
            .field("selected", &self.selected)
            .field("indicator", &self.indicator)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl SurfaceController {
    /// Create a controller for the given viewport.
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// Install the selection observer.
    pub fn set_observer(&mut self, observer: Box<dyn SelectionObserver>) {
        self.observer = Some(observer);
    }

    /// Update the display size (e.g. after a window resize).
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Current viewport.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Current gesture state.
    #[must_use]
    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Check whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Selected decal, if any.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    /// Current selection rectangle, if a decal is selected.
    #[must_use]
    pub fn indicator(&self) -> Option<SelectionIndicator> {
        self.indicator
    }

    /// Dispatch a pointer event.
    pub fn handle(&mut self, store: &mut DecalStore, event: &PointerEvent) -> GestureOutcome {
        match event.phase {
            PointerPhase::Down => match event.target {
                Some(id) if self.pointer_down(store, event.screen_point(), id) => {
                    GestureOutcome::Started(id)
                }
                _ => GestureOutcome::Ignored,
            },
            PointerPhase::Move => match self.pointer_move(store, event.screen_point()) {
                Some(id) => GestureOutcome::Moved(id),
                None => GestureOutcome::Ignored,
            },
            PointerPhase::Up => match self.pointer_up(store) {
                Some(id) => GestureOutcome::Committed(id),
                None => GestureOutcome::Ignored,
            },
            PointerPhase::Cancel => match self.pointer_cancel(store) {
                Some(id) => GestureOutcome::Cancelled(id),
                None => GestureOutcome::Ignored,
            },
        }
    }

    /// Begin dragging `id`. Returns `false` if the press was ignored.
    pub fn pointer_down(&mut self, store: &DecalStore, screen: Point, id: ElementId) -> bool {
        if let DragState::Dragging { element_id, .. } = self.drag {
            if element_id == id {
                tracing::debug!("Repeated pointer down on {id} ignored");
            } else {
                tracing::debug!("Pointer down on {id} ignored while dragging {element_id}");
            }
            return false;
        }
        let Some(element) = store.get(id) else {
            tracing::debug!("Pointer down on unknown decal {id}");
            return false;
        };

        self.drag = DragState::Dragging {
            element_id: id,
            start_screen: screen,
            start_position: element.position,
        };
        self.apply_selection(element);
        tracing::debug!("Drag started on {id}");
        true
    }

    /// Move the dragged decal. Returns the decal moved, if any.
    pub fn pointer_move(&mut self, store: &mut DecalStore, screen: Point) -> Option<ElementId> {
        let DragState::Dragging {
            element_id,
            start_screen,
            start_position,
        } = self.drag
        else {
            return None;
        };
        let Some(element) = store.get_mut(element_id) else {
            tracing::debug!("Dragged decal {element_id} disappeared, ending drag");
            self.drag = DragState::Idle;
            return None;
        };

        let canvas_delta = self.viewport.to_canvas_delta(screen - start_screen);
        element.position = start_position + delta_in_frame(&element.frame, canvas_delta);

        let bounds = metrics::visual_bounds(element);
        self.indicator = Some(SelectionIndicator {
            element_id,
            bounds,
        });
        Some(element_id)
    }

    /// End the drag, committing the current position.
    pub fn pointer_up(&mut self, store: &DecalStore) -> Option<ElementId> {
        let DragState::Dragging { element_id, .. } = std::mem::take(&mut self.drag) else {
            return None;
        };
        if !store.contains(element_id) {
            return None;
        }
        tracing::debug!("Drag committed on {element_id}");
        Some(element_id)
    }

    /// Abort the drag and put the decal back where it started.
    pub fn pointer_cancel(&mut self, store: &mut DecalStore) -> Option<ElementId> {
        let DragState::Dragging {
            element_id,
            start_position,
            ..
        } = std::mem::take(&mut self.drag)
        else {
            return None;
        };
        let element = store.get_mut(element_id)?;
        element.position = start_position;
        let bounds = metrics::visual_bounds(element);
        self.indicator = Some(SelectionIndicator {
            element_id,
            bounds,
        });
        tracing::debug!("Drag cancelled on {element_id}");
        Some(element_id)
    }

    /// Select a decal without starting a drag.
    ///
    /// Ignored while a drag is in progress.
    pub fn select(&mut self, store: &DecalStore, id: ElementId) -> bool {
        if self.is_dragging() {
            tracing::debug!("Selection of {id} ignored during drag");
            return false;
        }
        let Some(element) = store.get(id) else {
            tracing::debug!("Select ignored, decal not found: {id}");
            return false;
        };
        self.apply_selection(element);
        true
    }

    /// Clear the selection. Ignored while a drag is in progress.
    pub fn clear_selection(&mut self) {
        if self.is_dragging() {
            return;
        }
        self.drop_selection();
    }

    /// Forget a decal that left the store: ends its drag and clears it from
    /// the selection.
    pub fn forget(&mut self, id: ElementId) {
        if let DragState::Dragging { element_id, .. } = self.drag {
            if element_id == id {
                self.drag = DragState::Idle;
            }
        }
        if self.selected == Some(id) {
            self.drop_selection();
        }
    }

    /// Drop all gesture and selection state (e.g. after loading a document).
    pub fn reset(&mut self) {
        self.drag = DragState::Idle;
        self.drop_selection();
    }

    /// Recompute the indicator after the selected decal changed outside a
    /// gesture (property edits, transform commits).
    pub fn refresh_indicator(&mut self, store: &DecalStore) {
        let Some(id) = self.selected else {
            return;
        };
        match store.get(id) {
            Some(element) => {
                self.indicator = Some(SelectionIndicator {
                    element_id: id,
                    bounds: metrics::visual_bounds(element),
                });
            }
            None => self.drop_selection(),
        }
    }

    /// Apply a resize/rotate handle result in one step.
    ///
    /// Rotation snaps to right angles within [`ROTATION_SNAP_TOLERANCE`].
    /// A resize that would shrink either side below [`MIN_TRANSFORM_SIZE`] is
    /// rejected and the previous transform kept.
    pub fn commit_transform(
        &mut self,
        store: &mut DecalStore,
        id: ElementId,
        commit: TransformCommit,
    ) -> bool {
        if self.is_dragging() {
            tracing::debug!("Transform of {id} ignored during drag");
            return false;
        }
        let Some(element) = store.get_mut(id) else {
            tracing::debug!("Transform ignored, decal not found: {id}");
            return false;
        };
        let content = metrics::content_box(element);
        let width = content.width * commit.scale.x.abs();
        let height = content.height * commit.scale.y.abs();
        if width < MIN_TRANSFORM_SIZE || height < MIN_TRANSFORM_SIZE {
            tracing::debug!("Transform of {id} rejected: {width}x{height} below minimum size");
            return false;
        }

        element.position = commit.position;
        element.rotation = snap_rotation(commit.rotation);
        element.scale = commit.scale;
        self.refresh_indicator(store);
        true
    }

    fn apply_selection(&mut self, element: &DecalElement) {
        self.selected = Some(element.id);
        self.indicator = Some(SelectionIndicator {
            element_id: element.id,
            bounds: metrics::visual_bounds(element),
        });
        if let Some(observer) = self.observer.as_mut() {
            observer.on_selected(&ElementProperties::from(element));
        }
    }

    fn drop_selection(&mut self) {
        let had_selection = self.selected.take().is_some();
        self.indicator = None;
        if had_selection {
            if let Some(observer) = self.observer.as_mut() {
                observer.on_cleared();
            }
        }
    }
}

/// Express a canvas-space delta in the decal's placement frame.
///
/// Only the linear part of the frame matters; a singular frame falls back to
/// the unmodified delta.
#[must_use]
pub fn delta_in_frame(frame: &Affine, canvas_delta: Point) -> Point {
    if frame.is_identity() {
        return canvas_delta;
    }
    if let Some(inverse) = frame.linear().inverse() {
        inverse.apply_vector(canvas_delta)
    } else {
        tracing::warn!("Singular placement frame, applying drag delta unmodified");
        canvas_delta
    }
}

/// Snap an angle to the nearest right angle when within tolerance.
#[must_use]
pub fn snap_rotation(degrees: f32) -> f32 {
    let normalized = normalize_degrees(degrees);
    for snap in ROTATION_SNAPS.iter().copied().chain(std::iter::once(360.0)) {
        if (normalized - snap).abs() <= ROTATION_SNAP_TOLERANCE {
            return normalize_degrees(snap);
        }
    }
    normalized
}
