use super::*;
use crate::foundation::core::{Color, Point};
use crate::layer::model::{Layer, ShapeType};

fn stack(n: usize) -> LayerStack {
    LayerStack::new(
        (0..n)
            .map(|_| Layer::shape(ShapeType::Circle, Color::BLACK, Point::ZERO))
            .collect(),
    )
}

#[test]
fn undo_redo_walks_the_line() {
    let mut h = History::new(stack(0), 10);
    h.push(stack(1));
    h.push(stack(2));
    assert_eq!(h.undo().map(LayerStack::len), Some(1));
    assert_eq!(h.undo().map(LayerStack::len), Some(0));
    assert!(h.undo().is_none());
    assert_eq!(h.index(), 0);
    assert_eq!(h.redo().map(LayerStack::len), Some(1));
    assert_eq!(h.redo().map(LayerStack::len), Some(2));
    assert!(h.redo().is_none());
    assert_eq!(h.index(), 2);
}

#[test]
fn push_discards_redo_branch() {
    let mut h = History::new(stack(0), 10);
    h.push(stack(1));
    h.push(stack(2));
    h.undo();
    h.push(stack(5));
    assert!(!h.can_redo());
    assert_eq!(h.len(), 3);
    assert_eq!(h.current().map(LayerStack::len), Some(5));
}

#[test]
fn depth_limit_evicts_oldest() {
    let mut h = History::new(stack(0), 3);
    for n in 1..=5 {
        h.push(stack(n));
    }
    assert_eq!(h.len(), 3);
    assert_eq!(h.index(), 2);
    assert_eq!(h.undo().map(LayerStack::len), Some(4));
    assert_eq!(h.undo().map(LayerStack::len), Some(3));
    assert!(h.undo().is_none());
}

#[test]
fn reset_and_degenerate_depth() {
    let mut h = History::new(stack(0), 0);
    assert_eq!(h.max_depth(), 1);
    h.push(stack(1));
    assert_eq!(h.len(), 1);
    assert!(!h.can_undo());
    assert!(!h.can_redo());

    h.reset(stack(7));
    assert_eq!(h.current().map(LayerStack::len), Some(7));
    assert!(!h.is_empty());
}

#[test]
fn snapshots_are_shared_not_copied() {
    let s = stack(2);
    let mut h = History::new(LayerStack::default(), 5);
    h.push(s.clone());
    assert!(h.current().unwrap().ptr_eq(&s));
}

#[test]
fn amend_current_keeps_both_branches() {
    let mut h = History::new(stack(0), 10);
    h.push(stack(1));
    h.push(stack(2));
    h.undo();
    h.amend_current(stack(7));
    assert_eq!(h.len(), 3);
    assert_eq!(h.current().map(LayerStack::len), Some(7));
    assert_eq!(h.redo().map(LayerStack::len), Some(2));
    assert_eq!(h.undo().map(LayerStack::len), Some(7));
}
