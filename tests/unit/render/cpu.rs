use super::*;
use crate::assets::font::FontFace;
use crate::foundation::core::Size;
use crate::layer::model::{
    ContentPatch, ImageFilters, ImagePatch, LayerPatch, TextAlign, TextPatch, TextShadow,
    TextStroke,
};

const DEJAVU_SANS: &[u8] = include_bytes!("../../fixtures/fonts/DejaVuSans.ttf");

fn rect(center: Point, w: f64, h: f64, fill: Color) -> Layer {
    let mut l = Layer::shape(ShapeType::Rectangle, fill, center);
    l.width = w;
    l.height = h;
    l
}

fn render(layers: Vec<Layer>, selection: Option<&LayerId>, resources: &ResourceResolver) -> FrameRGBA {
    render_sized(CanvasSize::new(100, 100).unwrap(), layers, selection, resources)
}

fn render_sized(
    size: CanvasSize,
    layers: Vec<Layer>,
    selection: Option<&LayerId>,
    resources: &ResourceResolver,
) -> FrameRGBA {
    let stack = LayerStack::new(layers);
    let scene = Scene {
        size,
        background: Color::WHITE,
        layers: &stack,
        selection,
        zoom: 1.0,
    };
    CpuRenderer::new(EngineSettings::default())
        .render(&scene, resources)
        .unwrap()
}

fn near(px: [u8; 4], want: [u8; 4]) -> bool {
    px.iter()
        .zip(want.iter())
        .all(|(a, b)| (i16::from(*a) - i16::from(*b)).abs() <= 2)
}

#[test]
fn empty_scene_is_background() {
    let stack = LayerStack::default();
    let scene = Scene {
        size: CanvasSize::new(8, 4).unwrap(),
        background: Color::rgb(255, 0, 0),
        layers: &stack,
        selection: None,
        zoom: 1.0,
    };
    let frame = CpuRenderer::new(EngineSettings::default())
        .render(&scene, &ResourceResolver::new())
        .unwrap();
    assert_eq!((frame.width, frame.height), (8, 4));
    assert!(frame.premultiplied);
    assert!(frame.data.chunks_exact(4).all(|px| px == [255, 0, 0, 255]));
}

#[test]
fn rectangle_covers_its_box() {
    let frame = render(
        vec![rect(Point::new(50.0, 50.0), 20.0, 20.0, Color::BLACK)],
        None,
        &ResourceResolver::new(),
    );
    assert_eq!(frame.pixel(50, 50), Some([0, 0, 0, 255]));
    assert_eq!(frame.pixel(10, 10), Some([255, 255, 255, 255]));
}

#[test]
fn rotation_turns_the_box() {
    let mut l = rect(Point::new(50.0, 50.0), 40.0, 20.0, Color::BLACK);
    l.rotation = 90.0;
    let frame = render(vec![l], None, &ResourceResolver::new());
    assert_eq!(frame.pixel(50, 65), Some([0, 0, 0, 255]));
    assert_eq!(frame.pixel(66, 50), Some([255, 255, 255, 255]));
}

#[test]
fn later_layers_paint_on_top_with_opacity() {
    let bottom = rect(Point::new(50.0, 50.0), 20.0, 20.0, Color::rgb(255, 0, 0));
    let mut top = rect(Point::new(50.0, 50.0), 20.0, 20.0, Color::BLACK);
    top.opacity = 0.5;
    let frame = render(vec![bottom, top], None, &ResourceResolver::new());
    assert!(near(frame.pixel(50, 50).unwrap(), [127, 0, 0, 255]));
}

#[test]
fn hidden_and_degenerate_layers_draw_nothing() {
    let mut hidden = rect(Point::new(50.0, 50.0), 20.0, 20.0, Color::BLACK);
    hidden.visible = false;
    let flat = rect(Point::new(50.0, 50.0), 0.0, 20.0, Color::BLACK);
    let frame = render(vec![hidden, flat], None, &ResourceResolver::new());
    assert!(frame.data.chunks_exact(4).all(|px| px == [255, 255, 255, 255]));
}

#[test]
fn circle_and_triangle_geometry() {
    let mut circle = Layer::shape(ShapeType::Circle, Color::BLACK, Point::new(25.0, 25.0));
    circle.width = 20.0;
    circle.height = 20.0;
    let mut tri = Layer::shape(ShapeType::Triangle, Color::BLACK, Point::new(75.0, 75.0));
    tri.width = 20.0;
    tri.height = 20.0;
    let frame = render(vec![circle, tri], None, &ResourceResolver::new());

    assert_eq!(frame.pixel(25, 25), Some([0, 0, 0, 255]));
    assert_eq!(frame.pixel(16, 16), Some([255, 255, 255, 255]));
    // Apex at top center: top corners stay empty, bottom edge is filled.
    assert_eq!(frame.pixel(66, 66), Some([255, 255, 255, 255]));
    assert_eq!(frame.pixel(75, 83), Some([0, 0, 0, 255]));
}

#[test]
fn images_draw_only_when_ready() {
    let layer = Layer::image("blue.png", Point::new(50.0, 50.0), Size::new(20.0, 20.0));
    let mut resources = ResourceResolver::new();
    let pending = render(vec![layer.clone()], None, &resources);
    assert_eq!(pending.pixel(50, 50), Some([255, 255, 255, 255]));

    resources.prime_image("blue.png", PreparedImage::solid(2, 2, [0, 0, 255, 255]));
    let ready = render(vec![layer.clone()], None, &resources);
    assert_eq!(ready.pixel(50, 50), Some([0, 0, 255, 255]));
    assert_eq!(ready.pixel(5, 5), Some([255, 255, 255, 255]));

    let gray = layer
        .apply(&LayerPatch {
            content: Some(ContentPatch::Image(ImagePatch {
                src: None,
                filters: Some(ImageFilters {
                    grayscale: 100.0,
                    ..ImageFilters::default()
                }),
            })),
            ..LayerPatch::default()
        })
        .unwrap();
    let frame = render(vec![gray], None, &resources);
    let [r, g, b, a] = frame.pixel(50, 50).unwrap();
    assert_eq!(a, 255);
    assert_eq!(r, g);
    assert_eq!(g, b);
}

#[test]
fn text_without_any_font_is_skipped() {
    let text = Layer::text("Hello", Point::new(50.0, 50.0));
    let frame = render(vec![text], None, &ResourceResolver::new());
    assert!(frame.data.chunks_exact(4).all(|px| px == [255, 255, 255, 255]));
}

#[test]
fn selection_chrome_is_drawn_for_selected_layer() {
    let layer = rect(Point::new(50.0, 50.0), 40.0, 20.0, Color::BLACK);
    let id = layer.id().clone();
    let plain = render(vec![layer.clone()], None, &ResourceResolver::new());
    let chrome = render(vec![layer], Some(&id), &ResourceResolver::new());

    // Stem between the top edge (y = 40) and the rotation knob (y = 10).
    assert_eq!(plain.pixel(49, 25), Some([255, 255, 255, 255]));
    assert!(near(chrome.pixel(49, 25).unwrap(), [59, 130, 246, 255]));
    let ghost = LayerId::from_string("gone");
    let missing = render(vec![rect(Point::new(50.0, 50.0), 40.0, 20.0, Color::BLACK)], Some(&ghost), &ResourceResolver::new());
    assert_eq!(missing.pixel(49, 25), Some([255, 255, 255, 255]));
}

#[test]
fn rendering_is_deterministic() {
    let layers = vec![
        rect(Point::new(30.0, 30.0), 25.0, 15.0, Color::rgba(10, 200, 30, 180)),
        {
            let mut l = rect(Point::new(60.0, 55.0), 30.0, 30.0, Color::rgb(90, 0, 200));
            l.rotation = 33.0;
            l.opacity = 0.7;
            l
        },
    ];
    let a = render(layers.clone(), None, &ResourceResolver::new());
    let b = render(layers, None, &ResourceResolver::new());
    assert_eq!(a, b);
}

#[test]
fn oversized_image_is_skipped_without_aborting_the_frame() {
    let wide = Layer::image("strip.png", Point::new(50.0, 20.0), Size::new(80.0, 10.0));
    let below = rect(Point::new(50.0, 70.0), 20.0, 20.0, Color::BLACK);
    let mut resources = ResourceResolver::new();
    resources.prime_image("strip.png", PreparedImage::solid(70_000, 1, [255, 0, 0, 255]));

    let frame = render(vec![wide, below], None, &resources);
    assert_eq!(frame.pixel(50, 20), Some([255, 255, 255, 255]));
    assert_eq!(frame.pixel(50, 70), Some([0, 0, 0, 255]));
}

fn lettering(center: Point, mut patch: TextPatch) -> Layer {
    patch.font_size.get_or_insert(40.0);
    patch.fill.get_or_insert(Color::BLACK);
    Layer::text("HH", center)
        .apply(&LayerPatch::text(patch))
        .unwrap()
}

fn with_fallback() -> ResourceResolver {
    let mut resources = ResourceResolver::new();
    resources.set_fallback_font(DEJAVU_SANS.to_vec());
    resources
}

fn render_text(layers: Vec<Layer>, resources: &ResourceResolver) -> FrameRGBA {
    render_sized(CanvasSize::new(400, 200).unwrap(), layers, None, resources)
}

/// Inclusive pixel bounds of everything `pick` accepts.
#[derive(Clone, Copy, Debug)]
struct Ink {
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

impl Ink {
    fn mid_x(&self) -> f64 {
        (self.min_x + self.max_x) as f64 / 2.0
    }

    fn mid_y(&self) -> f64 {
        (self.min_y + self.max_y) as f64 / 2.0
    }
}

fn ink(frame: &FrameRGBA, pick: impl Fn([u8; 4]) -> bool) -> Option<Ink> {
    let mut out: Option<Ink> = None;
    for y in 0..frame.height {
        for x in 0..frame.width {
            if !frame.pixel(x, y).is_some_and(&pick) {
                continue;
            }
            let (x, y) = (i64::from(x), i64::from(y));
            let b = out.get_or_insert(Ink {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
            });
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
    }
    out
}

fn dark(px: [u8; 4]) -> bool {
    px[0] < 100 && px[1] < 100 && px[2] < 100
}

fn red(px: [u8; 4]) -> bool {
    px[0] > 180 && px[1] < 80 && px[2] < 80
}

fn blue(px: [u8; 4]) -> bool {
    px[2] > 180 && px[0] < 80 && px[1] < 80
}

#[test]
fn text_draws_with_its_face_or_the_fallback() {
    let layer = lettering(Point::new(200.0, 100.0), TextPatch::default());
    let fallback = render_text(vec![layer.clone()], &with_fallback());
    assert!(ink(&fallback, dark).is_some());

    let LayerKind::Text(content) = layer.kind() else {
        panic!("expected text layer");
    };
    let mut resources = ResourceResolver::new();
    resources.resolve(&LayerStack::new(vec![layer.clone()]));
    assert!(resources.complete_font(&FontFace::for_text(content), Ok(DEJAVU_SANS.to_vec())));
    let own_face = render_text(vec![layer], &resources);
    assert_eq!(own_face, fallback);
}

#[test]
fn text_alignment_anchors_at_the_layer_center() {
    let resources = with_fallback();
    let bounds = |align| {
        let layer = lettering(
            Point::new(200.0, 100.0),
            TextPatch {
                align: Some(align),
                ..TextPatch::default()
            },
        );
        ink(&render_text(vec![layer], &resources), dark).unwrap()
    };

    let center = bounds(TextAlign::Center);
    assert!((center.mid_x() - 200.0).abs() <= 3.0, "{center:?}");
    assert!((center.mid_y() - 100.0).abs() <= 6.0, "{center:?}");

    let left = bounds(TextAlign::Left);
    assert!((199..=208).contains(&left.min_x), "{left:?}");
    assert!(left.max_x > 240, "{left:?}");

    let right = bounds(TextAlign::Right);
    assert!((192..=201).contains(&right.max_x), "{right:?}");
    assert!(right.min_x < 160, "{right:?}");

    let width = |b: Ink| b.max_x - b.min_x;
    assert!((width(left) - width(center)).abs() <= 1);
    assert!((width(right) - width(center)).abs() <= 1);
}

#[test]
fn text_stroke_needs_a_positive_width() {
    let resources = with_fallback();
    let stroked = |width| {
        lettering(
            Point::new(200.0, 100.0),
            TextPatch {
                stroke: Some(Some(TextStroke {
                    color: Color::rgb(255, 0, 0),
                    width,
                })),
                ..TextPatch::default()
            },
        )
    };

    let frame = render_text(vec![stroked(6.0)], &resources);
    let outline = ink(&frame, red).expect("stroke drawn");
    let fill = ink(&frame, dark).expect("fill drawn");
    assert!(outline.min_x < fill.min_x && outline.max_x > fill.max_x);

    let frame = render_text(vec![stroked(0.0)], &resources);
    assert!(ink(&frame, red).is_none());
    assert!(ink(&frame, dark).is_some());
}

#[test]
fn shadow_offset_is_in_canvas_space() {
    let resources = with_fallback();
    let shadowed = |shadow| {
        let mut layer = lettering(
            Point::new(200.0, 100.0),
            TextPatch {
                shadow: Some(Some(shadow)),
                ..TextPatch::default()
            },
        );
        layer.rotation = 90.0;
        render_text(vec![layer], &resources)
    };
    let shadow = TextShadow {
        color: Color::rgb(0, 0, 255),
        blur: 0.0,
        offset_x: 25.0,
        offset_y: 30.0,
    };

    let frame = shadowed(shadow);
    let text = ink(&frame, dark).unwrap();
    let cast = ink(&frame, blue).expect("shadow drawn");
    assert!(((cast.max_x - text.max_x) - 25).abs() <= 2, "{text:?} {cast:?}");
    assert!(((cast.max_y - text.max_y) - 30).abs() <= 2, "{text:?} {cast:?}");

    let invisible = TextShadow {
        color: Color::TRANSPARENT,
        ..shadow
    };
    assert!(ink(&shadowed(invisible), blue).is_none());
}

#[test]
fn shadow_is_cast_by_the_stroke_too() {
    let layer = lettering(
        Point::new(200.0, 60.0),
        TextPatch {
            stroke: Some(Some(TextStroke {
                color: Color::rgb(255, 0, 0),
                width: 10.0,
            })),
            shadow: Some(Some(TextShadow {
                color: Color::rgb(0, 0, 255),
                blur: 0.0,
                offset_x: 0.0,
                offset_y: 70.0,
            })),
            ..TextPatch::default()
        },
    );
    let frame = render_text(vec![layer], &with_fallback());
    let text = ink(&frame, |px| dark(px) || red(px)).unwrap();
    let cast = ink(&frame, blue).expect("shadow drawn");

    assert!(cast.min_y > text.max_y, "{text:?} {cast:?}");
    assert!((cast.min_x - text.min_x).abs() <= 2, "{text:?} {cast:?}");
    assert!((cast.max_x - text.max_x).abs() <= 2, "{text:?} {cast:?}");
    assert!(((cast.max_y - text.max_y) - 70).abs() <= 2, "{text:?} {cast:?}");
}
