//! Texture sync bridge.
//!
//! Owns the shared texture resource: the current source, its decoded pixels,
//! and a version counter that strictly increases each time new pixels are
//! applied. Consumers never touch the texture directly; they watch the version.
//!
//! Decodes are asynchronous and may complete out of order. Each
//! [`TextureBridge::repoint`] issues a ticket with a fresh sequence number, and
//! a completion is applied only if no newer request has already settled.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::RenderError;
use crate::image::DecodedImage;

/// Identifies one decode request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecodeTicket {
    seq: u64,
}

impl DecodeTicket {
    /// Sequence number of the request.
    #[must_use]
    pub fn seq(self) -> u64 {
        self.seq
    }
}

/// What happened to a completed decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum DecodeOutcome {
    /// The pixels were applied and published under `version`.
    Applied {
        /// New texture version.
        version: u64,
    },
    /// The decode failed; the texture is unchanged.
    Failed,
    /// A newer request already settled; the result was discarded.
    Stale,
}

/// The shared texture and its version.
#[derive(Debug, Clone, Default)]
pub(crate) struct TextureResource {
    source: Option<String>,
    image: Option<Arc<DecodedImage>>,
    version: u64,
}

/// Keeps the texture resource in step with the serialized surface.
#[derive(Debug)]
pub struct TextureBridge {
    resource: TextureResource,
    next_seq: u64,
    settled_seq: u64,
    in_flight: BTreeMap<u64, String>,
    version_tx: watch::Sender<u64>,
}

impl Default for TextureBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureBridge {
    /// Create a bridge with an empty texture at version 0.
    #[must_use]
    pub fn new() -> Self {
        let (version_tx, _) = watch::channel(0);
        Self {
            resource: TextureResource::default(),
            next_seq: 0,
            settled_seq: 0,
            in_flight: BTreeMap::new(),
            version_tx,
        }
    }

    /// Request a decode of `source`.
    ///
    /// The returned ticket must be passed back to [`Self::complete`].
    pub fn repoint(&mut self, source: &str) -> DecodeTicket {
        self.next_seq += 1;
        let ticket = DecodeTicket { seq: self.next_seq };
        self.in_flight.insert(ticket.seq, source.to_string());
        tracing::debug!(seq = ticket.seq, bytes = source.len(), "Texture repointed");
        ticket
    }

    /// Settle a decode request.
    pub fn complete(
        &mut self,
        ticket: DecodeTicket,
        result: Result<DecodedImage, RenderError>,
    ) -> DecodeOutcome {
        if ticket.seq <= self.settled_seq {
            tracing::debug!(
                seq = ticket.seq,
                settled = self.settled_seq,
                "Discarding stale decode"
            );
            return DecodeOutcome::Stale;
        }
        self.settled_seq = ticket.seq;
        let source = self.in_flight.remove(&ticket.seq);
        // Older requests can no longer apply.
        self.in_flight.retain(|&seq, _| seq > ticket.seq);

        match (result, source) {
            (Ok(image), Some(source)) => {
                self.resource.source = Some(source);
                self.resource.image = Some(Arc::new(image));
                let version = self.trigger_update();
                DecodeOutcome::Applied { version }
            }
            (Ok(_), None) => {
                tracing::warn!(seq = ticket.seq, "Decode completed for an unknown request");
                DecodeOutcome::Failed
            }
            (Err(e), _) => {
                tracing::warn!(seq = ticket.seq, "Texture decode failed: {e}");
                DecodeOutcome::Failed
            }
        }
    }

    /// Bump the version and notify subscribers.
    pub fn trigger_update(&mut self) -> u64 {
        self.resource.version += 1;
        let version = self.resource.version;
        self.version_tx.send_replace(version);
        tracing::debug!(version, "Texture version published");
        version
    }

    /// Watch the texture version.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version_tx.subscribe()
    }

    /// Current texture version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.resource.version
    }

    /// Source of the applied texture.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.resource.source.as_deref()
    }

    /// Pixels of the applied texture.
    #[must_use]
    pub fn image(&self) -> Option<Arc<DecodedImage>> {
        self.resource.image.clone()
    }

    /// Latest request not yet settled.
    #[must_use]
    pub fn pending(&self) -> Option<DecodeTicket> {
        self.in_flight
            .keys()
            .next_back()
            .map(|&seq| DecodeTicket { seq })
    }
}
