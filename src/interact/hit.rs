use crate::foundation::core::{Point, Vec2, rotate_vec};
use crate::foundation::settings::EngineSettings;
use crate::layer::model::Layer;
use crate::layer::stack::LayerStack;
use crate::render::chrome::{Handle, local_handle_offsets};

/// `p` in the layer's unrotated frame, relative to its center (scale not removed).
pub fn to_local(layer: &Layer, p: Point) -> Vec2 {
    rotate_vec(p - layer.center(), -layer.rotation)
}

/// Whether canvas point `p` falls inside the layer's rotated, scaled box (edges inclusive).
pub fn layer_contains(layer: &Layer, p: Point) -> bool {
    let local = to_local(layer, p);
    let size = layer.scaled_size();
    local.x.abs() <= size.width / 2.0 && local.y.abs() <= size.height / 2.0
}

/// Topmost visible, unlocked layer containing `p`.
pub fn topmost_at(stack: &LayerStack, p: Point) -> Option<&Layer> {
    stack
        .iter()
        .rev()
        .filter(|l| l.is_hittable())
        .find(|l| layer_contains(l, p))
}

/// Selection handle of `layer` under `p`, if any. The tolerance is the hit radius in screen
/// pixels converted to canvas units.
pub fn hit_handle(layer: &Layer, p: Point, zoom: f64, settings: &EngineSettings) -> Option<Handle> {
    let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
    let tolerance = settings.handle_hit_radius_px / zoom;
    let local = to_local(layer, p);
    local_handle_offsets(layer, zoom, settings)
        .into_iter()
        .find(|(handle, offset)| {
            let d = local - *offset;
            if handle.is_corner() {
                d.x.abs() <= tolerance && d.y.abs() <= tolerance
            } else {
                d.hypot() <= tolerance
            }
        })
        .map(|(handle, _)| handle)
}

#[cfg(test)]
#[path = "../../tests/unit/interact/hit.rs"]
mod tests;
