//! Selection chrome geometry, shared by the renderer and the hit-tester so that what is drawn is
//! exactly what can be grabbed.

use crate::foundation::core::{Point, Vec2, rotate_vec};
use crate::foundation::settings::EngineSettings;
use crate::layer::model::Layer;

/// Grabbable parts of the selection chrome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    /// Top-left corner (scale).
    TopLeft,
    /// Top-right corner (scale).
    TopRight,
    /// Bottom-right corner (scale).
    BottomRight,
    /// Bottom-left corner (scale).
    BottomLeft,
    /// Circle above the top edge (rotate).
    Rotate,
}

impl Handle {
    /// Corner handles in drawing order.
    pub const CORNERS: [Handle; 4] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomRight,
        Handle::BottomLeft,
    ];

    /// Whether this handle starts a scale gesture.
    pub fn is_corner(self) -> bool {
        self != Handle::Rotate
    }
}

/// Handle centers in the layer's unrotated frame: origin at the layer center, axes aligned with
/// the layer, distances in canvas units with scale already applied.
pub fn local_handle_offsets(layer: &Layer, zoom: f64, settings: &EngineSettings) -> [(Handle, Vec2); 5] {
    let size = layer.scaled_size();
    let hw = size.width / 2.0;
    let hh = size.height / 2.0;
    let rotate_offset = settings.rotate_handle_offset_px / zoom;
    [
        (Handle::TopLeft, Vec2::new(-hw, -hh)),
        (Handle::TopRight, Vec2::new(hw, -hh)),
        (Handle::BottomRight, Vec2::new(hw, hh)),
        (Handle::BottomLeft, Vec2::new(-hw, hh)),
        (Handle::Rotate, Vec2::new(0.0, -hh - rotate_offset)),
    ]
}

/// Canvas-space chrome for one selected layer.
#[derive(Clone, Debug, PartialEq)]
pub struct ChromeGeometry {
    /// Transformed corners of the local box, clockwise from top-left.
    pub outline: [Point; 4],
    /// Midpoint of the top edge; the rotation stem starts here.
    pub top_center: Point,
    /// Rotation handle center.
    pub rotate_handle: Point,
    /// Corner handle side length in canvas units.
    pub handle_size: f64,
    /// Outline stroke width in canvas units.
    pub line_width: f64,
    /// Layer rotation in degrees, for orienting corner squares.
    pub rotation: f64,
}

impl ChromeGeometry {
    /// Chrome for `layer` at `zoom`. Screen-pixel sizes are divided by `zoom` so the chrome keeps
    /// a constant on-screen size.
    pub fn for_layer(layer: &Layer, zoom: f64, settings: &EngineSettings) -> Self {
        let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
        let center = layer.center();
        let to_canvas = |v: Vec2| center + rotate_vec(v, layer.rotation);
        let offsets = local_handle_offsets(layer, zoom, settings);
        let hh = layer.scaled_size().height / 2.0;
        Self {
            outline: [
                to_canvas(offsets[0].1),
                to_canvas(offsets[1].1),
                to_canvas(offsets[2].1),
                to_canvas(offsets[3].1),
            ],
            top_center: to_canvas(Vec2::new(0.0, -hh)),
            rotate_handle: to_canvas(offsets[4].1),
            handle_size: settings.handle_size_px / zoom,
            line_width: settings.chrome_line_width_px / zoom,
            rotation: layer.rotation,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/chrome.rs"]
mod tests;
