//! The decal store: authoritative in-memory collection of decals.
//!
//! Elements are addressed by [`ElementId`] and enumerated in insertion order,
//! which is also their paint order on the texture. The store never triggers a
//! resync by itself; the editing session marks the surface dirty after every
//! mutation it performs.

use std::collections::HashMap;

use crate::element::{DecalElement, ElementId};
use crate::patch::ElementPatch;

/// Ordered, id-addressable collection of decals.
#[derive(Debug, Clone, Default)]
pub struct DecalStore {
    /// All elements, indexed by ID.
    elements: HashMap<ElementId, DecalElement>,
    /// Insertion order.
    order: Vec<ElementId>,
}

impl DecalStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element under a fresh identifier and return it.
    ///
    /// Any ID already present on `element` is replaced.
    pub fn add(&mut self, mut element: DecalElement) -> ElementId {
        let mut id = ElementId::new();
        while self.elements.contains_key(&id) {
            id = ElementId::new();
        }
        element.id = id;
        self.order.push(id);
        self.elements.insert(id, element);
        tracing::debug!("Added decal {id}");
        id
    }

    /// Remove an element. Absent IDs are ignored.
    pub fn remove(&mut self, id: ElementId) -> Option<DecalElement> {
        let removed = self.elements.remove(&id);
        if removed.is_some() {
            self.order.retain(|&eid| eid != id);
        } else {
            tracing::debug!("Remove ignored, decal not found: {id}");
        }
        removed
    }

    /// Merge `patch` into an element. Returns `false` if the ID is absent.
    pub fn update(&mut self, id: ElementId, patch: &ElementPatch) -> bool {
        if let Some(element) = self.elements.get_mut(&id) {
            patch.apply_to(element);
            true
        } else {
            tracing::debug!("Update ignored, decal not found: {id}");
            false
        }
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&DecalElement> {
        self.elements.get(&id)
    }

    /// Get a mutable reference to an element by ID.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut DecalElement> {
        self.elements.get_mut(&id)
    }

    /// Check whether an element exists.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// Elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &DecalElement> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    /// IDs in insertion order.
    #[must_use]
    pub fn ids(&self) -> &[ElementId] {
        &self.order
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Remove all elements.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.order.clear();
    }

    /// Replace the whole collection, keeping the given IDs.
    ///
    /// Used when loading a saved document. Later duplicates of an ID are
    /// dropped.
    pub fn restore(&mut self, elements: impl IntoIterator<Item = DecalElement>) {
        self.clear();
        for element in elements {
            let id = element.id;
            if self.elements.contains_key(&id) {
                tracing::warn!("Dropping duplicate decal {id} while restoring");
                continue;
            }
            self.order.push(id);
            self.elements.insert(id, element);
        }
    }
}
