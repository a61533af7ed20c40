//! Consumer side of the texture: the 3D material binding.
//!
//! The renderer's frame loop polls the bridge version; whenever it moved past
//! the last version seen, the material re-binds the texture and flags it for
//! upload before the next frame.

use crate::bridge::TextureBridge;
use crate::image::DecodedImage;

/// Something that re-binds itself to a freshly decoded texture.
pub trait TextureConsumer {
    /// Called once per observed version change.
    fn on_texture(&mut self, version: u64, image: &DecodedImage);
}

/// Tracks which texture version a material is bound to.
#[derive(Debug, Default)]
pub struct MaterialBinding<C> {
    consumer: C,
    last_seen: u64,
    needs_upload: bool,
}

impl<C: TextureConsumer> MaterialBinding<C> {
    /// Bind `consumer`; nothing is seen until the first poll.
    pub fn new(consumer: C) -> Self {
        Self {
            consumer,
            last_seen: 0,
            needs_upload: false,
        }
    }

    /// Re-bind if the bridge published a newer version. Returns `true` when
    /// the consumer was notified.
    pub fn poll(&mut self, bridge: &TextureBridge) -> bool {
        let version = bridge.version();
        if version <= self.last_seen {
            return false;
        }
        let Some(image) = bridge.image() else {
            return false;
        };
        self.last_seen = version;
        self.needs_upload = true;
        self.consumer.on_texture(version, &image);
        tracing::trace!(version, "Material re-bound");
        true
    }

    /// Version currently bound.
    #[must_use]
    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// Check whether the texture changed since the last upload.
    #[must_use]
    pub fn needs_upload(&self) -> bool {
        self.needs_upload
    }

    /// Acknowledge the upload.
    pub fn mark_uploaded(&mut self) {
        self.needs_upload = false;
    }

    /// The bound consumer.
    #[must_use]
    pub fn consumer(&self) -> &C {
        &self.consumer
    }
}
