use super::*;
use crate::foundation::core::Color;
use crate::layer::model::ShapeType;

fn setup() -> (LayerStack, LayerId, EngineSettings) {
    let mut l = Layer::shape(ShapeType::Rectangle, Color::BLACK, Point::new(100.0, 100.0));
    l.width = 40.0;
    l.height = 20.0;
    let id = l.id().clone();
    (LayerStack::new(vec![l]), id, EngineSettings::default())
}

#[test]
fn press_on_body_selects_and_moves() {
    let (stack, id, s) = setup();
    let mut c = TransformController::new();
    let down = c.pointer_down(&stack, None, Point::new(105.0, 102.0), 1.0, &s);
    assert_eq!(down.selection.as_ref(), Some(&id));
    assert!(matches!(c.gesture(), Gesture::Move { .. }));

    let moved = c.pointer_move(&stack, Point::new(115.0, 92.0), &s).unwrap();
    assert_eq!((moved.x, moved.y), (110.0, 90.0));
    // Baseline-relative: a second move does not accumulate.
    let moved = c.pointer_move(&stack, Point::new(106.0, 102.0), &s).unwrap();
    assert_eq!((moved.x, moved.y), (101.0, 100.0));

    let stack = stack.replace(moved).unwrap();
    assert!(c.pointer_up(&stack));
    assert!(!c.is_active());
}

#[test]
fn press_on_empty_canvas_clears_selection() {
    let (stack, id, s) = setup();
    let mut c = TransformController::new();
    let down = c.pointer_down(&stack, Some(&id), Point::new(500.0, 500.0), 1.0, &s);
    assert_eq!(down.selection, None);
    assert!(!c.is_active());
    assert!(c.pointer_move(&stack, Point::new(1.0, 1.0), &s).is_none());
    assert!(!c.pointer_up(&stack));
}

#[test]
fn click_without_drag_does_not_commit() {
    let (stack, _, s) = setup();
    let mut c = TransformController::new();
    c.pointer_down(&stack, None, Point::new(100.0, 100.0), 1.0, &s);
    assert!(!c.pointer_up(&stack));
}

#[test]
fn corner_drag_scales_uniformly() {
    let (stack, id, s) = setup();
    let mut c = TransformController::new();
    let start = Point::new(120.0, 110.0);
    c.pointer_down(&stack, Some(&id), start, 1.0, &s);
    assert!(matches!(c.gesture(), Gesture::Scale { handle: Handle::BottomRight, .. }));

    let p = Point::new(160.0, 130.0);
    let scaled = c.pointer_move(&stack, p, &s).unwrap();
    let factor = (p - Point::new(100.0, 100.0)).hypot() / (start - Point::new(100.0, 100.0)).hypot();
    assert!((scaled.scale_x - factor).abs() < 1e-12);
    assert_eq!(scaled.scale_x, scaled.scale_y);
    assert_eq!((scaled.x, scaled.y), (100.0, 100.0));
}

#[test]
fn scale_clamps_at_minimum_and_keeps_flip() {
    let (stack, _, s) = setup();
    let mut baseline = stack.as_slice()[0].clone();
    baseline.scale_x = -2.0;
    baseline.scale_y = 1.0;
    let (sx, sy) = scale_for_drag(&baseline, Point::new(120.0, 110.0), Point::new(100.0, 100.0), &s);
    assert!((sy - s.min_scale).abs() < 1e-12);
    assert!((sx + 2.0 * s.min_scale).abs() < 1e-12);
    assert_eq!(sx / sy, -2.0);
}

#[test]
fn scale_from_center_press_uses_epsilon() {
    let (stack, _, s) = setup();
    let baseline = stack.as_slice()[0].clone();
    let (sx, _) = scale_for_drag(&baseline, Point::new(100.0, 100.0), Point::new(103.0, 104.0), &s);
    assert!((sx - 5.0).abs() < 1e-12);
}

#[test]
fn rotate_handle_points_at_pointer() {
    let (stack, id, s) = setup();
    let mut c = TransformController::new();
    c.pointer_down(&stack, Some(&id), Point::new(100.0, 60.0), 1.0, &s);
    assert!(matches!(c.gesture(), Gesture::Rotate { .. }));

    let up = c.pointer_move(&stack, Point::new(100.0, 50.0), &s).unwrap();
    assert!(up.rotation.abs() < 1e-9);
    let right = c.pointer_move(&stack, Point::new(150.0, 100.0), &s).unwrap();
    assert!((right.rotation - 90.0).abs() < 1e-9);
}

#[test]
fn handles_ignored_when_not_selected_or_locked() {
    let (stack, id, s) = setup();
    let mut c = TransformController::new();
    // Rotation knob position, but nothing selected: empty canvas.
    let down = c.pointer_down(&stack, None, Point::new(100.0, 60.0), 1.0, &s);
    assert_eq!(down.selection, None);

    let mut locked = stack.get(&id).unwrap().clone();
    locked.locked = true;
    let stack = stack.replace(locked).unwrap();
    let down = c.pointer_down(&stack, Some(&id), Point::new(120.0, 110.0), 1.0, &s);
    assert_eq!(down.selection, None);
}

#[test]
fn deleted_layer_mid_gesture_is_a_noop() {
    let (stack, id, s) = setup();
    let mut c = TransformController::new();
    c.pointer_down(&stack, None, Point::new(100.0, 100.0), 1.0, &s);
    let emptied = stack.remove(&id).unwrap();
    assert!(c.pointer_move(&emptied, Point::new(130.0, 130.0), &s).is_none());
    assert!(!c.is_active());
    assert!(!c.pointer_up(&emptied));
}
