use super::*;

fn text_layer() -> Layer {
    Layer::text("ADD TEXT", Point::new(640.0, 360.0))
}

#[test]
fn factories_assign_unique_ids_and_defaults() {
    let a = text_layer();
    let b = text_layer();
    assert_ne!(a.id(), b.id());
    assert_eq!(a.scale_x, 1.0);
    assert_eq!(a.opacity, 1.0);
    assert!(a.is_hittable());
    let LayerKind::Text(t) = a.kind() else {
        panic!("expected text");
    };
    assert_eq!(t.font_size, 72.0);
    assert_eq!(t.font_weight, 700);
    assert_eq!(t.fill, Color::WHITE);
    assert!((a.width - 8.0 * 72.0 * 0.6).abs() < 1e-9);
    assert!((a.height - 72.0 * 1.2).abs() < 1e-9);
}

#[test]
fn apply_merges_only_present_fields() {
    let layer = Layer::shape(ShapeType::Circle, Color::BLACK, Point::new(10.0, 20.0));
    let out = layer
        .apply(&LayerPatch {
            x: Some(50.0),
            opacity: Some(3.0),
            ..LayerPatch::default()
        })
        .unwrap();
    assert_eq!(out.x, 50.0);
    assert_eq!(out.y, 20.0);
    assert_eq!(out.opacity, 1.0);
    assert_eq!(out.id(), layer.id());
    assert_eq!(layer.x, 10.0);
}

#[test]
fn apply_rejects_zero_scale_and_kind_mismatch() {
    let layer = text_layer();
    assert!(layer.apply(&LayerPatch::scale(0.0, 1.0)).is_err());
    assert!(layer.apply(&LayerPatch::image_src("a.png")).is_err());
    assert!(layer.apply(&LayerPatch::scale(-1.0, 2.0)).is_ok());
}

#[test]
fn text_patch_can_clear_stroke() {
    let layer = text_layer();
    let stroke = TextStroke {
        color: Color::BLACK,
        width: 4.0,
    };
    let with_stroke = layer
        .apply(&LayerPatch {
            content: Some(ContentPatch::Text(TextPatch {
                stroke: Some(Some(stroke)),
                ..TextPatch::default()
            })),
            ..LayerPatch::default()
        })
        .unwrap();
    let LayerKind::Text(t) = with_stroke.kind() else {
        panic!("expected text");
    };
    assert_eq!(t.stroke, Some(stroke));

    let cleared = with_stroke
        .apply(&LayerPatch {
            content: Some(ContentPatch::Text(TextPatch {
                stroke: Some(None),
                ..TextPatch::default()
            })),
            ..LayerPatch::default()
        })
        .unwrap();
    let LayerKind::Text(t) = cleared.kind() else {
        panic!("expected text");
    };
    assert_eq!(t.stroke, None);
}

#[test]
fn transform_maps_local_corner() {
    let mut layer = Layer::shape(ShapeType::Rectangle, Color::BLACK, Point::new(100.0, 100.0));
    layer.width = 40.0;
    layer.height = 20.0;
    layer.rotation = 90.0;
    let p = layer.transform() * Point::new(20.0, 0.0);
    assert!((p.x - 100.0).abs() < 1e-9);
    assert!((p.y - 120.0).abs() < 1e-9);
}

#[test]
fn json_uses_type_tag_and_camel_case() {
    let layer = Layer::image("photos/cat.png", Point::new(1.0, 2.0), Size::new(3.0, 4.0));
    let v = serde_json::to_value(&layer).unwrap();
    assert_eq!(v["type"], "image");
    assert_eq!(v["scaleX"], 1.0);
    assert_eq!(v["src"], "photos/cat.png");
    assert_eq!(v["filters"]["brightness"], 100.0);

    let back: Layer = serde_json::from_value(v).unwrap();
    assert_eq!(back, layer);
}

#[test]
fn missing_optional_fields_take_defaults() {
    let json = r##"{"id":"s1","name":"Box","x":0,"y":0,"width":10,"height":10,
        "type":"shape","shapeType":"triangle","fill":"#ff0000"}"##;
    let layer: Layer = serde_json::from_str(json).unwrap();
    assert_eq!(layer.scale_y, 1.0);
    assert!(layer.visible);
    assert!(!layer.locked);
    assert_eq!(layer.id().as_str(), "s1");
}

#[test]
fn neutral_filters() {
    let mut f = ImageFilters::default();
    assert!(f.is_neutral());
    f.blur = 2.0;
    assert!(!f.is_neutral());
    assert!(!f.has_color_adjustments());
    f.sepia = 50.0;
    assert!(f.has_color_adjustments());
}

#[test]
fn only_font_and_text_edits_change_text_layout() {
    let recolor = TextPatch {
        fill: Some(Color::BLACK),
        align: Some(TextAlign::Left),
        shadow: Some(None),
        ..Default::default()
    };
    assert!(!recolor.changes_layout());
    assert!(!LayerPatch::text(recolor).changes_text_layout());

    let bigger = TextPatch {
        font_size: Some(200.0),
        ..Default::default()
    };
    assert!(LayerPatch::text(bigger).changes_text_layout());
    let heavier = TextPatch {
        font_weight: Some(400),
        ..Default::default()
    };
    assert!(heavier.changes_layout());
    assert!(!LayerPatch::rotation(10.0).changes_text_layout());
}
