use super::*;
use crate::foundation::core::Color;
use crate::layer::model::ShapeType;

fn box_at(x: f64, y: f64, w: f64, h: f64, rotation: f64) -> Layer {
    let mut l = Layer::shape(ShapeType::Rectangle, Color::BLACK, Point::new(x, y));
    l.width = w;
    l.height = h;
    l.rotation = rotation;
    l
}

#[test]
fn rotation_aware_containment() {
    let flat = box_at(100.0, 100.0, 40.0, 20.0, 0.0);
    let turned = box_at(100.0, 100.0, 40.0, 20.0, 90.0);
    assert!(layer_contains(&flat, Point::new(100.0, 100.0)));
    assert!(layer_contains(&turned, Point::new(100.0, 100.0)));
    assert!(layer_contains(&flat, Point::new(115.0, 100.0)));
    assert!(!layer_contains(&turned, Point::new(115.0, 100.0)));
    assert!(layer_contains(&turned, Point::new(100.0, 115.0)));
}

#[test]
fn containment_uses_scale_magnitude() {
    let mut l = box_at(0.0, 0.0, 10.0, 10.0, 0.0);
    l.scale_x = -3.0;
    assert!(layer_contains(&l, Point::new(14.0, 0.0)));
    assert!(!layer_contains(&l, Point::new(16.0, 0.0)));
}

#[test]
fn topmost_wins_and_locked_is_skipped() {
    let a = box_at(50.0, 50.0, 100.0, 100.0, 0.0);
    let b = box_at(50.0, 50.0, 100.0, 100.0, 0.0);
    let mut c = box_at(50.0, 50.0, 100.0, 100.0, 0.0);
    let c_id = c.id().clone();
    let b_id = b.id().clone();
    let stack = LayerStack::new(vec![a, b, c.clone()]);
    assert_eq!(topmost_at(&stack, Point::new(50.0, 50.0)).map(|l| l.id()), Some(&c_id));

    c.locked = true;
    let stack = stack.replace(c).unwrap();
    assert_eq!(topmost_at(&stack, Point::new(50.0, 50.0)).map(|l| l.id()), Some(&b_id));
    assert!(topmost_at(&stack, Point::new(500.0, 500.0)).is_none());
}

#[test]
fn handles_follow_rotation_and_zoom() {
    let s = EngineSettings::default();
    let l = box_at(100.0, 100.0, 40.0, 20.0, 0.0);
    assert_eq!(hit_handle(&l, Point::new(121.0, 111.0), 1.0, &s), Some(Handle::BottomRight));
    assert_eq!(hit_handle(&l, Point::new(100.0, 60.0), 1.0, &s), Some(Handle::Rotate));
    assert_eq!(hit_handle(&l, Point::new(100.0, 100.0), 1.0, &s), None);

    let turned = box_at(100.0, 100.0, 40.0, 20.0, 90.0);
    assert_eq!(hit_handle(&turned, Point::new(140.0, 100.0), 1.0, &s), Some(Handle::Rotate));
    assert_eq!(hit_handle(&turned, Point::new(90.0, 120.0), 1.0, &s), Some(Handle::BottomRight));

    // At zoom 4 the tolerance shrinks to 3 canvas units.
    assert_eq!(hit_handle(&l, Point::new(125.0, 110.0), 1.0, &s), Some(Handle::BottomRight));
    assert_eq!(hit_handle(&l, Point::new(125.0, 110.0), 4.0, &s), None);
}
