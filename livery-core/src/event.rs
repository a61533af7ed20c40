//! Pointer input for the authoring surface.
//!
//! Coordinates are screen pixels relative to the displayed surface. The host
//! performs hit-testing with its own picking and reports the decal under the
//! pointer as `target`.

use serde::{Deserialize, Serialize};

use crate::element::ElementId;
use crate::geometry::Point;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button released.
    Up,
    /// Gesture aborted by the host (focus loss, pointer capture lost).
    Cancel,
}

/// A pointer event on the authoring surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Phase of this event.
    pub phase: PointerPhase,
    /// X position in screen pixels.
    pub x: f32,
    /// Y position in screen pixels.
    pub y: f32,
    /// Decal under the pointer, as picked by the host.
    pub target: Option<ElementId>,
}

impl PointerEvent {
    /// Pointer pressed on a decal.
    #[must_use]
    pub fn down(x: f32, y: f32, target: ElementId) -> Self {
        Self {
            phase: PointerPhase::Down,
            x,
            y,
            target: Some(target),
        }
    }

    /// Pointer moved.
    #[must_use]
    pub fn moved(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Move,
            x,
            y,
            target: None,
        }
    }

    /// Pointer released.
    #[must_use]
    pub fn up(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Up,
            x,
            y,
            target: None,
        }
    }

    /// Gesture cancelled.
    #[must_use]
    pub fn cancel() -> Self {
        Self {
            phase: PointerPhase::Cancel,
            x: 0.0,
            y: 0.0,
            target: None,
        }
    }

    /// Screen position.
    #[must_use]
    pub fn screen_point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}
