use super::*;
use crate::foundation::core::Color;
use crate::layer::model::ShapeType;

fn box_layer(rotation: f64) -> Layer {
    let mut l = Layer::shape(ShapeType::Rectangle, Color::BLACK, Point::new(100.0, 100.0));
    l.width = 40.0;
    l.height = 20.0;
    l.rotation = rotation;
    l
}

fn close(a: Point, b: Point) -> bool {
    (a - b).hypot() < 1e-9
}

#[test]
fn outline_follows_rotation() {
    let s = EngineSettings::default();
    let g = ChromeGeometry::for_layer(&box_layer(0.0), 1.0, &s);
    assert!(close(g.outline[0], Point::new(80.0, 90.0)));
    assert!(close(g.outline[2], Point::new(120.0, 110.0)));
    assert!(close(g.rotate_handle, Point::new(100.0, 60.0)));

    let g = ChromeGeometry::for_layer(&box_layer(90.0), 1.0, &s);
    // Top-left (-20, -10) rotated a quarter turn lands at (10, -20) from the center.
    assert!(close(g.outline[0], Point::new(110.0, 80.0)));
    assert!(close(g.rotate_handle, Point::new(140.0, 100.0)));
}

#[test]
fn sizes_shrink_with_zoom() {
    let s = EngineSettings::default();
    let g = ChromeGeometry::for_layer(&box_layer(0.0), 2.0, &s);
    assert_eq!(g.handle_size, 5.0);
    assert_eq!(g.line_width, 1.0);
    assert!(close(g.rotate_handle, Point::new(100.0, 75.0)));
}

#[test]
fn scale_and_flip_use_magnitudes() {
    let s = EngineSettings::default();
    let mut l = box_layer(0.0);
    l.scale_x = -2.0;
    let offsets = local_handle_offsets(&l, 1.0, &s);
    assert_eq!(offsets[2], (Handle::BottomRight, Vec2::new(40.0, 10.0)));
    assert!(Handle::BottomRight.is_corner());
    assert!(!Handle::Rotate.is_corner());
}
