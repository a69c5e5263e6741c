use std::sync::Arc;

use crate::foundation::core::Vec2;
use crate::foundation::error::CanvasResult;
use crate::layer::model::{Layer, LayerId, LayerPatch};

const DUPLICATE_OFFSET: f64 = 20.0;

/// Ordered layer list, bottom-most first.
///
/// The list is shared behind an `Arc`: every edit returns a new stack and leaves the receiver
/// untouched, so history snapshots and in-flight renders can hold a stack by cheap clone.
/// Edits that would change nothing return `None`.
#[derive(Clone, Debug, Default)]
pub struct LayerStack {
    layers: Arc<Vec<Layer>>,
}

impl PartialEq for LayerStack {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.layers == other.layers
    }
}

impl LayerStack {
    /// Wrap a list of layers (bottom-most first).
    pub fn new(layers: Vec<Layer>) -> Self {
        Self {
            layers: Arc::new(layers),
        }
    }

    /// Whether two stacks share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.layers, &other.layers)
    }

    /// Layers, bottom-most first.
    pub fn as_slice(&self) -> &[Layer] {
        &self.layers
    }

    /// Iterate bottom-most first.
    pub fn iter(&self) -> std::slice::Iter<'_, Layer> {
        self.layers.iter()
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// True for an empty canvas.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Position of `id` in paint order.
    pub fn index_of(&self, id: &LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id() == id)
    }

    /// Look up a layer by id.
    pub fn get(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id() == id)
    }

    fn with_vec(&self, f: impl FnOnce(&mut Vec<Layer>)) -> Self {
        let mut layers = self.layers.as_ref().clone();
        f(&mut layers);
        Self::new(layers)
    }

    /// Append on top.
    pub fn push(&self, layer: Layer) -> Self {
        self.with_vec(|v| v.push(layer))
    }

    /// Merge `patch` into layer `id`. `Ok(None)` when the id is unknown.
    pub fn update(&self, id: &LayerId, patch: &LayerPatch) -> CanvasResult<Option<Self>> {
        let Some(idx) = self.index_of(id) else {
            return Ok(None);
        };
        let updated = self.layers[idx].apply(patch)?;
        if updated == self.layers[idx] {
            return Ok(None);
        }
        Ok(Some(self.with_vec(|v| v[idx] = updated)))
    }

    /// Swap in a full replacement for the layer with the same id.
    pub fn replace(&self, layer: Layer) -> Option<Self> {
        let idx = self.index_of(layer.id())?;
        if self.layers[idx] == layer {
            return None;
        }
        Some(self.with_vec(|v| v[idx] = layer))
    }

    /// Drop layer `id`.
    pub fn remove(&self, id: &LayerId) -> Option<Self> {
        let idx = self.index_of(id)?;
        Some(self.with_vec(|v| {
            v.remove(idx);
        }))
    }

    /// Move layer `id` to paint position `index` (clamped to the top).
    pub fn move_to(&self, id: &LayerId, index: usize) -> Option<Self> {
        let from = self.index_of(id)?;
        let to = index.min(self.len() - 1);
        if from == to {
            return None;
        }
        Some(self.with_vec(|v| {
            let layer = v.remove(from);
            v.insert(to, layer);
        }))
    }

    /// Raise layer `id` by one step. `None` when already on top.
    pub fn move_up(&self, id: &LayerId) -> Option<Self> {
        let from = self.index_of(id)?;
        self.move_to(id, from + 1)
    }

    /// Lower layer `id` by one step. `None` when already at the bottom.
    pub fn move_down(&self, id: &LayerId) -> Option<Self> {
        let from = self.index_of(id)?;
        self.move_to(id, from.checked_sub(1)?)
    }

    /// Insert a copy of layer `id` directly above it, offset and renamed. Returns the new id.
    pub fn duplicate(&self, id: &LayerId) -> Option<(Self, LayerId)> {
        let idx = self.index_of(id)?;
        let original = &self.layers[idx];
        let mut copy = original.duplicate().with_name(format!("{} copy", original.name));
        let offset = Vec2::new(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        copy.x += offset.x;
        copy.y += offset.y;
        let new_id = copy.id().clone();
        Some((self.with_vec(|v| v.insert(idx + 1, copy)), new_id))
    }
}

impl<'a> IntoIterator for &'a LayerStack {
    type Item = &'a Layer;
    type IntoIter = std::slice::Iter<'a, Layer>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<Vec<Layer>> for LayerStack {
    fn from(layers: Vec<Layer>) -> Self {
        Self::new(layers)
    }
}

impl serde::Serialize for LayerStack {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.layers.as_slice().serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for LayerStack {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Vec::<Layer>::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/stack.rs"]
mod tests;
