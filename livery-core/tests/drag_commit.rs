//! Drag gesture integration tests
//!
//! Drives the surface controller through full pointer sequences and checks
//! that committed positions follow the pointer in canvas space.

use livery_core::{
    Affine, DecalElement, DecalStore, GestureOutcome, Point, PointerEvent, SurfaceController,
    Viewport,
};
use proptest::prelude::*;

fn approx(a: Point, b: Point, tolerance: f32) -> bool {
    (a.x - b.x).abs() <= tolerance && (a.y - b.y).abs() <= tolerance
}

fn drag(
    store: &mut DecalStore,
    controller: &mut SurfaceController,
    id: livery_core::ElementId,
    from: Point,
    to: Point,
) -> GestureOutcome {
    controller.handle(store, &PointerEvent::down(from.x, from.y, id));
    controller.handle(store, &PointerEvent::moved(to.x, to.y));
    controller.handle(store, &PointerEvent::up(to.x, to.y))
}

proptest! {
    #[test]
    fn committed_position_matches_scaled_delta(
        dx in -300.0f32..300.0,
        dy in -300.0f32..300.0,
        display in 128.0f32..2048.0,
    ) {
        let mut store = DecalStore::new();
        let start = Point::new(2048.0, 2048.0);
        let id = store.add(DecalElement::text("P", 40.0, "#000000").with_position(start));
        let mut controller = SurfaceController::new(Viewport::square(display));

        let outcome = drag(&mut store, &mut controller, id, Point::ORIGIN, Point::new(dx, dy));
        prop_assert_eq!(outcome, GestureOutcome::Committed(id));

        let k = 4096.0 / display;
        let expected = Point::new(start.x + dx * k, start.y + dy * k);
        let actual = store.get(id).expect("element exists").position;
        prop_assert!(approx(actual, expected, 0.05), "{actual:?} != {expected:?}");
    }

    #[test]
    fn rendered_origin_follows_pointer_in_any_frame(
        dx in -200.0f32..200.0,
        dy in -200.0f32..200.0,
        angle in prop::sample::select(vec![0.0f32, 90.0, 180.0, 270.0]),
        mirror in any::<bool>(),
    ) {
        let mut store = DecalStore::new();
        let flip = if mirror { -1.0 } else { 1.0 };
        let frame = Affine::translate(2048.0, 2048.0)
            .then(&Affine::rotate_degrees(angle))
            .then(&Affine::scale(flip, 1.0));
        let id = store.add(DecalElement::text("F", 40.0, "#000000").with_frame(frame));
        let mut controller = SurfaceController::new(Viewport::square(4096.0));

        let before = store.get(id).expect("exists").canvas_transform().apply(Point::ORIGIN);
        drag(&mut store, &mut controller, id, Point::ORIGIN, Point::new(dx, dy));
        let after = store.get(id).expect("exists").canvas_transform().apply(Point::ORIGIN);

        let expected = Point::new(before.x + dx, before.y + dy);
        prop_assert!(approx(after, expected, 0.05), "{after:?} != {expected:?}");
    }
}

#[test]
fn second_gesture_starts_from_committed_position() {
    let mut store = DecalStore::new();
    let id = store.add(DecalElement::text("TWICE", 40.0, "#000000"));
    let mut controller = SurfaceController::new(Viewport::square(1024.0));

    drag(&mut store, &mut controller, id, Point::ORIGIN, Point::new(10.0, 0.0));
    drag(&mut store, &mut controller, id, Point::new(50.0, 50.0), Point::new(50.0, 60.0));

    let position = store.get(id).expect("exists").position;
    assert!(approx(position, Point::new(40.0, 40.0), 1e-3));
}

#[test]
fn removed_element_ends_gesture() {
    let mut store = DecalStore::new();
    let id = store.add(DecalElement::text("GONE", 40.0, "#000000"));
    let mut controller = SurfaceController::new(Viewport::square(512.0));

    controller.handle(&mut store, &PointerEvent::down(0.0, 0.0, id));
    store.remove(id);
    controller.forget(id);

    assert!(!controller.is_dragging());
    assert_eq!(controller.selected(), None);
    assert_eq!(
        controller.handle(&mut store, &PointerEvent::up(5.0, 5.0)),
        GestureOutcome::Ignored
    );
}
