//! End-to-end editing scenarios (livery-editor).
//!
//! Each test drives a `TextureEditor` the way a host would: authoring
//! actions, pointer events, resyncs and save/load.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use livery_core::element::DecalKind;
use livery_core::geometry::Point;
use livery_core::patch::ElementPatch;
use livery_core::{
    EditorConfig, EditorMode, ElementProperties, PointerEvent, SelectionObserver, SyncState,
};
use livery_editor::{FileSlotStorage, PersistenceAdapter, TextProps, TextureEditor};
use livery_renderer::{DecodeOutcome, FontDatabase, SvgDecoder};

fn decoder() -> Arc<SvgDecoder> {
    Arc::new(SvgDecoder::with_fonts(32, Arc::new(FontDatabase::new())))
}

fn config() -> EditorConfig {
    EditorConfig {
        texture_size: 32,
        ..EditorConfig::default()
    }
}

fn editor_with(config: EditorConfig, persistence: PersistenceAdapter) -> TextureEditor {
    TextureEditor::with_parts(config, decoder(), persistence)
}

fn editor() -> TextureEditor {
    editor_with(config(), PersistenceAdapter::in_memory())
}

fn hello() -> TextProps {
    TextProps {
        content: "HELLO".to_string(),
        font_size: 100.0,
        color: "#000000".to_string(),
        position: Some(Point::new(2048.0, 2048.0)),
        rotation: 0.0,
        ..TextProps::default()
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([255, 0, 0, 255]),
    ));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}

#[derive(Clone, Default)]
struct RecordingPanel {
    shown: Arc<Mutex<Vec<Option<ElementProperties>>>>,
}

impl SelectionObserver for RecordingPanel {
    fn on_selected(&mut self, properties: &ElementProperties) {
        self.shown
            .lock()
            .expect("lock")
            .push(Some(properties.clone()));
    }

    fn on_cleared(&mut self) {
        self.shown.lock().expect("lock").push(None);
    }
}

#[test]
fn add_and_sync() {
    let mut editor = editor();
    let id = editor.add_text_element(hello()).expect("added");
    assert_eq!(editor.store().len(), 1);
    assert!(editor.store().contains(id));

    let before = editor.version();
    let outcome = editor.flush().expect("resync started");
    assert_eq!(outcome, DecodeOutcome::Applied { version: before + 1 });
    assert_eq!(editor.version(), before + 1);
    assert!(editor
        .bridge()
        .source()
        .expect("decode target source")
        .contains("HELLO"));
    assert!(editor.bridge().image().is_some());
}

#[test]
fn remove_clears_selection() {
    let mut editor = editor();
    let panel = RecordingPanel::default();
    editor.set_selection_observer(Box::new(panel.clone()));

    let a = editor.add_text_element(TextProps::new("A")).expect("added");
    assert!(editor.select(a));
    assert_eq!(editor.controller().selected(), Some(a));

    assert!(editor.remove_element(a));
    assert!(!editor.store().contains(a));
    assert_eq!(editor.controller().selected(), None);
    assert!(editor.controller().indicator().is_none());
    assert!(editor.selected_properties().is_none());

    let shown = panel.shown.lock().expect("lock");
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[0].as_ref().map(|p| p.id), Some(a));
    assert!(shown[1].is_none());
}

#[test]
fn stale_decode_is_discarded() {
    let mut editor = editor();
    let id = editor.add_text_element(TextProps::new("FIRST")).expect("added");
    let d1 = editor.begin_resync().expect("d1");

    assert!(editor.edit_text(id, "SECOND"));
    let d2 = editor.begin_resync().expect("d2");
    let d2_source = d2.source.clone();

    let (t2, r2) = d2.run(decoder().as_ref());
    assert_eq!(
        editor.complete_resync(t2, r2),
        DecodeOutcome::Applied { version: 1 }
    );

    let (t1, r1) = d1.run(decoder().as_ref());
    assert_eq!(editor.complete_resync(t1, r1), DecodeOutcome::Stale);

    assert_eq!(editor.version(), 1);
    assert_eq!(editor.bridge().source(), Some(d2_source.as_str()));
    assert_eq!(editor.sync_state(), SyncState::Clean);
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut first = editor_with(
        config(),
        PersistenceAdapter::new(FileSlotStorage::new(dir.path()).expect("storage")),
    );
    first.add_text_element(hello()).expect("text");
    first
        .add_text_element(TextProps {
            color: "#ff8800".to_string(),
            rotation: 45.0,
            position: Some(Point::new(100.0, 300.0)),
            ..TextProps::new("SIDE")
        })
        .expect("text");
    first.add_image_element(&png_bytes(8, 4)).expect("image");
    assert!(first.set_background_color("#3366CC"));
    assert!(first.save());

    // The image payload is stored once, in the decal's href.
    let saved = std::fs::read_to_string(dir.path().join("robot-painting-texture-svg.svg"))
        .expect("saved slot");
    assert_eq!(saved.matches("data:image/png;base64,").count(), 1);

    let mut second = editor_with(
        config(),
        PersistenceAdapter::new(FileSlotStorage::new(dir.path()).expect("storage")),
    );
    assert!(second.load());

    let restored: Vec<_> = second.store().iter().cloned().collect();
    let original: Vec<_> = first.store().iter().cloned().collect();
    assert_eq!(restored, original);
    assert_eq!(second.background(), "#3366cc");
    assert_eq!(
        second.serialized().expect("serialize"),
        first.serialized().expect("serialize")
    );

    // A load schedules a resync of the restored surface right away.
    assert!(second.poll(Instant::now()).is_some());
}

#[test]
fn load_without_save_is_absent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut editor = editor_with(
        config(),
        PersistenceAdapter::new(FileSlotStorage::new(dir.path()).expect("storage")),
    );
    assert!(!editor.load());

    std::fs::write(
        dir.path().join("robot-painting-texture-svg.svg"),
        "<svg>not ours</svg>",
    )
    .expect("write foreign slot");
    assert!(!editor.load());
    assert!(editor.store().is_empty());
}

#[test]
fn image_decal_is_scaled_to_fit() {
    let mut editor = editor_with(
        EditorConfig {
            max_image_dimension: 50.0,
            ..config()
        },
        PersistenceAdapter::in_memory(),
    );
    let id = editor.add_image_element(&png_bytes(200, 100)).expect("added");
    let element = editor.store().get(id).expect("exists");
    match &element.kind {
        DecalKind::Image {
            data_uri,
            intrinsic_width,
            intrinsic_height,
            width,
            height,
        } => {
            assert!(data_uri.starts_with("data:image/png;base64,"));
            assert_eq!((*intrinsic_width, *intrinsic_height), (200, 100));
            assert!((width - 50.0).abs() < 1e-4);
            assert!((height - 25.0).abs() < 1e-4);
        }
        DecalKind::Text { .. } => panic!("expected an image decal"),
    }
    assert_eq!(element.position, Point::new(2048.0, 2048.0));

    assert!(editor.add_image_element(b"definitely not an image").is_none());
    assert_eq!(editor.store().len(), 1);
}

#[test]
fn drag_commits_and_resyncs_on_pointer_up() {
    let mut editor = editor();
    let id = editor.add_text_element(hello()).expect("added");
    editor.flush();
    assert_eq!(editor.version(), 1);

    // 512 px display over a 4096 canvas: one pixel is eight units.
    editor.handle_pointer(&PointerEvent::down(100.0, 100.0, id));
    editor.handle_pointer(&PointerEvent::moved(105.0, 98.0));
    editor.handle_pointer(&PointerEvent::moved(110.0, 95.0));
    assert!(editor.poll(Instant::now()).is_none());
    editor.handle_pointer(&PointerEvent::up(110.0, 95.0));

    let position = editor.store().get(id).expect("exists").position;
    assert!((position.x - 2128.0).abs() < 1e-3);
    assert!((position.y - 2008.0).abs() < 1e-3);

    let pending = editor.poll(Instant::now()).expect("immediate resync");
    let (ticket, result) = pending.run(decoder().as_ref());
    assert_eq!(
        editor.complete_resync(ticket, result),
        DecodeOutcome::Applied { version: 2 }
    );
}

#[test]
fn invalid_edits_fail_closed() {
    let mut editor = editor();
    let text = editor.add_text_element(TextProps::new("KEEP")).expect("text");
    let image = editor.add_image_element(&png_bytes(4, 4)).expect("image");
    let before: Vec<_> = editor.store().iter().cloned().collect();

    assert!(!editor.edit_color(text, "blue"));
    assert!(!editor.edit_font_size(text, "-3"));
    assert!(!editor.edit_text(text, ""));
    assert!(!editor.edit_rotation(text, "quarter"));
    assert!(!editor.edit_font_size(image, "24"));
    assert!(!editor.edit_text(image, "nope"));
    assert!(!editor.set_background_color("#12"));
    assert!(!editor.remove_element(livery_core::element::ElementId::new()));

    let after: Vec<_> = editor.store().iter().cloned().collect();
    assert_eq!(before, after);
}

#[test]
fn invalid_patch_leaves_element_untouched() {
    let mut editor = editor();
    let id = editor.add_text_element(hello()).expect("added");
    let before = editor.store().get(id).cloned().expect("exists");

    let mixed = ElementPatch::new()
        .rotation(30.0)
        .color("not a color")
        .font_size(f32::NAN);
    assert!(!editor.update_element(id, &mixed));
    assert!(!editor.update_element(id, &ElementPatch::new().position(Point::new(f32::NAN, 1.0))));
    assert!(!editor.update_element(id, &ElementPatch::new().font_size(-12.0)));
    assert_eq!(editor.store().get(id), Some(&before));

    assert!(editor.update_element(id, &ElementPatch::new().color("#ABC").rotation(-45.0)));
    let after = editor.store().get(id).expect("exists");
    assert!((after.rotation - 315.0).abs() < 1e-4);
    assert!(matches!(&after.kind, DecalKind::Text { color, .. } if color == "#abc"));
}

#[test]
fn base_color_never_reaches_the_texture() {
    let mut editor = editor();
    assert!(editor.set_background_color("#3366cc"));
    assert_eq!(editor.flush(), Some(DecodeOutcome::Applied { version: 1 }));

    let image = editor.bridge().image().expect("decoded");
    assert_eq!(image.pixel(1, 1).map(|p| p[3]), Some(0));
    assert_eq!(image.pixel(31, 31).map(|p| p[3]), Some(0));

    let svg = editor.serialized().expect("serialize");
    assert!(!svg.contains("fill=\"#3366cc\""));
    assert!(!svg.contains("background-color"));
    // Still recoverable for the editor's preview after a reload.
    assert_eq!(
        livery_renderer::parse_document(&svg).map(|d| d.background),
        Some("#3366cc".to_string())
    );
}

#[test]
fn basic_mode_is_view_only() {
    let mut editor = editor_with(
        EditorConfig {
            mode: EditorMode::Basic,
            ..config()
        },
        PersistenceAdapter::in_memory(),
    );
    assert!(editor.add_text_element(hello()).is_none());
    assert!(editor.add_image_element(&png_bytes(4, 4)).is_none());
    assert!(editor.store().is_empty());

    // Sync still works: the bare surface reaches the texture.
    assert_eq!(editor.flush(), Some(DecodeOutcome::Applied { version: 1 }));
}

#[tokio::test]
async fn async_resync_decodes_off_thread() {
    let mut editor = editor();
    editor.add_text_element(hello()).expect("added");
    assert!(editor.set_background_color("#00ff00"));

    let mut versions = editor.subscribe();
    let outcome = editor.resync().await.expect("resync started");
    assert_eq!(outcome, DecodeOutcome::Applied { version: 1 });
    assert!(versions.has_changed().expect("bridge alive"));
    assert_eq!(*versions.borrow_and_update(), 1);

    // The base color is preview-only; the texture stays transparent around
    // the decals so the material's own paint shows through.
    let image = editor.bridge().image().expect("decoded");
    assert_eq!(image.pixel(0, 0).map(|p| p[3]), Some(0));
}
