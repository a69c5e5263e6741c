use std::collections::HashMap;
use std::sync::Arc;

use kurbo::Shape;

use crate::assets::decode::PreparedImage;
use crate::assets::font::FontDescriptor;
use crate::assets::resolver::ResourceResolver;
use crate::foundation::core::{Affine, BezPath, CanvasSize, Color, Point, Vec2};
use crate::foundation::error::{CanvasError, CanvasResult};
use crate::foundation::settings::EngineSettings;
use crate::layer::model::{ImageContent, Layer, LayerId, LayerKind, ShapeContent, ShapeType, TextContent};
use crate::layer::stack::LayerStack;
use crate::render::chrome::ChromeGeometry;
use crate::render::frame::FrameRGBA;
use crate::render::passes::{
    ColorMatrix, blur_rgba8_premul_in_place, color_matrix_rgba8_premul, fill_rgba8,
    premul_over_in_place_opacity,
};
use crate::render::text::{GlyphPaint, ShapedText, TextLayoutEngine, block_origin, draw_glyphs};

/// Everything one frame depends on.
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    /// Surface size in pixels.
    pub size: CanvasSize,
    /// Clear color.
    pub background: Color,
    /// Layers, bottom-most first.
    pub layers: &'a LayerStack,
    /// Layer to decorate with selection chrome.
    pub selection: Option<&'a LayerId>,
    /// Current view zoom; only affects chrome sizes.
    pub zoom: f64,
}

struct ImagePaint {
    pixels: Arc<Vec<u8>>,
    paint: vello_cpu::Image,
}

/// Headless CPU renderer on `vello_cpu`.
///
/// Each layer is rasterized into its own scratch surface, optionally filtered, then composited
/// onto the frame with the layer opacity. Pending or failed resources draw nothing.
pub struct CpuRenderer {
    settings: EngineSettings,
    ctx: Option<vello_cpu::RenderContext>,
    text: TextLayoutEngine,
    image_paints: HashMap<String, ImagePaint>,
}

impl std::fmt::Debug for CpuRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuRenderer")
            .field("settings", &self.settings)
            .field("cached_images", &self.image_paints.len())
            .finish_non_exhaustive()
    }
}

impl CpuRenderer {
    /// Renderer using `settings` for chrome sizes and colors.
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            ctx: None,
            text: TextLayoutEngine::new(),
            image_paints: HashMap::new(),
        }
    }

    /// Engine settings in use.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Shared text engine, e.g. for measuring text with a loaded face.
    pub fn text_engine(&mut self) -> &mut TextLayoutEngine {
        &mut self.text
    }

    /// Rasterize `scene` into a premultiplied frame.
    #[tracing::instrument(skip(self, scene, resources), fields(w = scene.size.width, h = scene.size.height, layers = scene.layers.len()))]
    pub fn render(
        &mut self,
        scene: &Scene<'_>,
        resources: &ResourceResolver,
    ) -> CanvasResult<FrameRGBA> {
        let w = u16::try_from(scene.size.width)
            .map_err(|_| CanvasError::render("frame width exceeds u16"))?;
        let h = u16::try_from(scene.size.height)
            .map_err(|_| CanvasError::render("frame height exceeds u16"))?;

        let mut frame = vello_cpu::Pixmap::new(w, h);
        fill_rgba8(
            frame.data_as_u8_slice_mut(),
            scene.background.to_premul_array(),
        );
        let mut layer_pm = vello_cpu::Pixmap::new(w, h);

        for layer in scene.layers {
            if !layer.visible || layer.opacity <= 0.0 {
                continue;
            }
            layer_pm.data_as_u8_slice_mut().fill(0);
            if !self.paint_layer(layer, resources, &mut layer_pm)? {
                continue;
            }
            premul_over_in_place_opacity(
                frame.data_as_u8_slice_mut(),
                layer_pm.data_as_u8_slice(),
                layer.opacity as f32,
            )?;
        }

        if let Some(layer) = scene
            .selection
            .and_then(|id| scene.layers.get(id))
            .filter(|l| l.visible)
        {
            let chrome = ChromeGeometry::for_layer(layer, scene.zoom, &self.settings);
            let color = self.settings.chrome_color;
            layer_pm.data_as_u8_slice_mut().fill(0);
            self.with_ctx_mut(w, h, |_, ctx| {
                draw_chrome(ctx, &chrome, color);
                ctx.flush();
                ctx.render_to_pixmap(&mut layer_pm);
                Ok(())
            })?;
            premul_over_in_place_opacity(
                frame.data_as_u8_slice_mut(),
                layer_pm.data_as_u8_slice(),
                1.0,
            )?;
        }

        Ok(FrameRGBA {
            width: scene.size.width,
            height: scene.size.height,
            data: frame.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> CanvasResult<R>,
    ) -> CanvasResult<R> {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    /// Draw one layer into `dst`. Returns `false` when nothing was drawn.
    fn paint_layer(
        &mut self,
        layer: &Layer,
        resources: &ResourceResolver,
        dst: &mut vello_cpu::Pixmap,
    ) -> CanvasResult<bool> {
        if layer.width <= 0.0 || layer.height <= 0.0 {
            return Ok(false);
        }
        match layer.kind() {
            LayerKind::Image(img) => self.paint_image(layer, img, resources, dst),
            LayerKind::Text(text) => self.paint_text(layer, text, resources, dst),
            LayerKind::Shape(shape) => {
                let (w, h) = (dst.width(), dst.height());
                self.with_ctx_mut(w, h, |_, ctx| {
                    draw_shape(ctx, layer, shape);
                    ctx.flush();
                    ctx.render_to_pixmap(dst);
                    Ok(true)
                })
            }
        }
    }

    fn image_paint(&mut self, source: &str, image: &PreparedImage) -> CanvasResult<vello_cpu::Image> {
        if let Some(cached) = self.image_paints.get(source)
            && Arc::ptr_eq(&cached.pixels, &image.rgba8_premul)
        {
            return Ok(cached.paint.clone());
        }
        let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_paints.insert(
            source.to_string(),
            ImagePaint {
                pixels: Arc::clone(&image.rgba8_premul),
                paint: paint.clone(),
            },
        );
        Ok(paint)
    }

    fn paint_image(
        &mut self,
        layer: &Layer,
        content: &ImageContent,
        resources: &ResourceResolver,
        dst: &mut vello_cpu::Pixmap,
    ) -> CanvasResult<bool> {
        let Some(image) = resources.image(&content.src) else {
            return Ok(false);
        };
        if image.width == 0 || image.height == 0 {
            return Ok(false);
        }
        let paint = match self.image_paint(&content.src, image) {
            Ok(paint) => paint,
            Err(e) => {
                tracing::warn!(layer = %layer.id(), error = %e, "image cannot be drawn");
                return Ok(false);
            }
        };
        let (iw, ih) = (f64::from(image.width), f64::from(image.height));
        let tr = layer.transform()
            * Affine::translate(Vec2::new(-layer.width / 2.0, -layer.height / 2.0))
            * Affine::scale_non_uniform(layer.width / iw, layer.height / ih);

        let (w, h) = (dst.width(), dst.height());
        self.with_ctx_mut(w, h, |_, ctx| {
            ctx.set_transform(affine_to_cpu(tr));
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
            ctx.flush();
            ctx.render_to_pixmap(dst);
            Ok(())
        })?;

        let filters = &content.filters;
        if filters.has_color_adjustments() {
            let m = ColorMatrix::from_filters(filters);
            let src = dst.data_as_u8_slice().to_vec();
            color_matrix_rgba8_premul(&src, dst.data_as_u8_slice_mut(), &m);
        }
        if filters.blur > 0.0 {
            let (pw, ph) = (u32::from(dst.width()), u32::from(dst.height()));
            blur_rgba8_premul_in_place(dst.data_as_u8_slice_mut(), pw, ph, filters.blur as f32)?;
        }
        Ok(true)
    }

    fn paint_text(
        &mut self,
        layer: &Layer,
        content: &TextContent,
        resources: &ResourceResolver,
        dst: &mut vello_cpu::Pixmap,
    ) -> CanvasResult<bool> {
        if content.text.is_empty() || content.font_size <= 0.0 {
            return Ok(false);
        }
        let descriptor = FontDescriptor::for_text(content);
        let Some(font) = resources.font_for(&descriptor) else {
            return Ok(false);
        };
        let shaped = match self.text.shape(content, &descriptor, font) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(layer = %layer.id(), error = %e, "text shaping failed");
                return Ok(false);
            }
        };
        let (ox, oy) = block_origin(content.align, shaped.size());
        let local = layer.transform() * Affine::translate(Vec2::new(ox, oy));
        let (w, h) = (dst.width(), dst.height());
        let stroke = content
            .stroke
            .filter(|s| s.width > 0.0 && !s.color.is_transparent());

        self.with_ctx_mut(w, h, |_, ctx| {
            if let Some(stroke) = stroke {
                ctx.set_transform(affine_to_cpu(local));
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(stroke.width));
                ctx.set_paint(cpu_color(stroke.color));
                draw_glyphs(ctx, &shaped, GlyphPaint::Stroke);
            }
            ctx.set_transform(affine_to_cpu(local));
            ctx.set_paint(cpu_color(content.fill));
            draw_glyphs(ctx, &shaped, GlyphPaint::Fill);
            ctx.flush();
            ctx.render_to_pixmap(dst);
            Ok(())
        })?;

        if let Some(shadow) = content.shadow.filter(|s| s.is_effective()) {
            let mut shadow_pm = vello_cpu::Pixmap::new(w, h);
            let offset = Affine::translate(Vec2::new(shadow.offset_x, shadow.offset_y));
            self.with_ctx_mut(w, h, |_, ctx| {
                ctx.set_transform(affine_to_cpu(offset * local));
                ctx.set_paint(cpu_color(shadow.color));
                if let Some(stroke) = stroke {
                    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(stroke.width));
                    draw_glyphs(ctx, &shaped, GlyphPaint::Stroke);
                }
                draw_glyphs(ctx, &shaped, GlyphPaint::Fill);
                ctx.flush();
                ctx.render_to_pixmap(&mut shadow_pm);
                Ok(())
            })?;
            if shadow.blur > 0.0 {
                blur_rgba8_premul_in_place(
                    shadow_pm.data_as_u8_slice_mut(),
                    u32::from(w),
                    u32::from(h),
                    (shadow.blur / 2.0) as f32,
                )?;
            }
            premul_over_in_place_opacity(
                shadow_pm.data_as_u8_slice_mut(),
                dst.data_as_u8_slice(),
                1.0,
            )?;
            std::mem::swap(dst, &mut shadow_pm);
        }
        Ok(true)
    }

    /// Lay out `content` with whatever face `resources` offers and return the block size.
    /// `None` while neither the face nor a fallback is loaded.
    pub fn measure_text(
        &mut self,
        content: &TextContent,
        resources: &ResourceResolver,
    ) -> Option<kurbo::Size> {
        let descriptor = FontDescriptor::for_text(content);
        let font = resources.font_for(&descriptor)?;
        self.text
            .shape(content, &descriptor, font)
            .ok()
            .map(|s: ShapedText| s.size())
    }
}

fn draw_shape(ctx: &mut vello_cpu::RenderContext, layer: &Layer, shape: &ShapeContent) {
    let (hw, hh) = (layer.width / 2.0, layer.height / 2.0);
    ctx.set_transform(affine_to_cpu(layer.transform()));
    ctx.set_paint(cpu_color(shape.fill));
    match shape.shape_type {
        ShapeType::Rectangle => {
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(-hw, -hh, hw, hh));
        }
        ShapeType::Circle => {
            let path = kurbo::Circle::new(Point::ORIGIN, hw).to_path(0.1);
            ctx.fill_path(&bezpath_to_cpu(&path));
        }
        ShapeType::Triangle => {
            let mut path = BezPath::new();
            path.move_to(Point::new(0.0, -hh));
            path.line_to(Point::new(hw, hh));
            path.line_to(Point::new(-hw, hh));
            path.close_path();
            ctx.fill_path(&bezpath_to_cpu(&path));
        }
    }
}

fn draw_chrome(ctx: &mut vello_cpu::RenderContext, chrome: &ChromeGeometry, color: Color) {
    let paint = cpu_color(color);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(chrome.line_width));

    let mut outline = BezPath::new();
    outline.move_to(chrome.outline[0]);
    for p in &chrome.outline[1..] {
        outline.line_to(*p);
    }
    outline.close_path();
    outline.move_to(chrome.top_center);
    outline.line_to(chrome.rotate_handle);
    ctx.set_paint(paint);
    ctx.stroke_path(&bezpath_to_cpu(&outline));

    let half = chrome.handle_size / 2.0;
    let square = vello_cpu::kurbo::Rect::new(-half, -half, half, half);
    for corner in chrome.outline {
        let tr = Affine::translate(corner.to_vec2()) * Affine::rotate(chrome.rotation.to_radians());
        ctx.set_transform(affine_to_cpu(tr));
        ctx.set_paint(cpu_color(Color::WHITE));
        ctx.fill_rect(&square);
        ctx.set_paint(paint);
        ctx.stroke_rect(&square);
    }

    let knob = bezpath_to_cpu(&kurbo::Circle::new(chrome.rotate_handle, half).to_path(0.1));
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(cpu_color(Color::WHITE));
    ctx.fill_path(&knob);
    ctx.set_paint(paint);
    ctx.stroke_path(&knob);
}

fn cpu_color(c: Color) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> CanvasResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CanvasError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CanvasError::render("image height exceeds u16"))?;
    if bytes.len() != (width as usize) * (height as usize) * 4 {
        return Err(CanvasError::render("image byte len mismatch"));
    }
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    let opaque = bytes.chunks_exact(4).all(|px| px[3] == 255);
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, !opaque))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
