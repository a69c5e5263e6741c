use std::sync::Arc;

use crate::assets::font::{FontDescriptor, PreparedFont};
use crate::foundation::core::{Color, Size};
use crate::foundation::error::{CanvasError, CanvasResult};
use crate::layer::model::{FontStyle, TextAlign, TextContent};

struct RegisteredFont {
    bytes: Arc<Vec<u8>>,
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// Shaped text ready for glyph drawing.
pub struct ShapedText {
    /// Parley layout, aligned within its own width.
    pub layout: parley::Layout<Color>,
    /// Font handle for the rasterizer.
    pub font: vello_cpu::peniko::FontData,
}

impl ShapedText {
    /// Width and height of the laid-out block.
    pub fn size(&self) -> Size {
        Size::new(
            f64::from(self.layout.width()),
            f64::from(self.layout.height()),
        )
    }
}

impl std::fmt::Debug for ShapedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapedText")
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

/// Stateful helper for building Parley text layouts from raw font bytes.
///
/// Each distinct font buffer is registered with the font collection once; later layouts reuse
/// the family name parley assigned to it.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Color>,
    registered: Vec<RegisteredFont>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    /// Construct a new layout engine with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: Vec::new(),
        }
    }

    fn register(&mut self, font: &PreparedFont) -> CanvasResult<usize> {
        if let Some(i) = self
            .registered
            .iter()
            .position(|r| Arc::ptr_eq(&r.bytes, &font.bytes))
        {
            return Ok(i);
        }

        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes.as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            CanvasError::resource("no font families registered from font bytes")
        })?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CanvasError::resource("registered font family has no name"))?
            .to_string();
        tracing::debug!(%family, "registered font");

        self.registered.push(RegisteredFont {
            bytes: Arc::clone(&font.bytes),
            family,
            data: vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(font.bytes.as_ref().clone()),
                0,
            ),
        });
        Ok(self.registered.len() - 1)
    }

    /// Family name parley assigned to `font`, registering it if needed.
    pub fn family_name(&mut self, font: &PreparedFont) -> CanvasResult<String> {
        let i = self.register(font)?;
        Ok(self.registered[i].family.clone())
    }

    /// Shape `content` with `font` at the whole-pixel size, weight and slant of `descriptor`.
    /// Lines break only at explicit newlines and are aligned within the block per
    /// `content.align`.
    pub fn shape(
        &mut self,
        content: &TextContent,
        descriptor: &FontDescriptor,
        font: &PreparedFont,
    ) -> CanvasResult<ShapedText> {
        if descriptor.size_px == 0 {
            return Err(CanvasError::validation("text font size rounds to 0px"));
        }
        let size_px = descriptor.size_px as f32;
        let i = self.register(font)?;
        let family = self.registered[i].family.clone();

        let text = content.text.as_str();
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::FontWeight::new(f32::from(descriptor.face.weight)),
        ));
        if descriptor.face.style == FontStyle::Italic {
            builder.push_default(parley::style::StyleProperty::FontStyle(
                parley::FontStyle::Italic,
            ));
        }
        builder.push_default(parley::style::StyleProperty::Brush(content.fill));

        let mut layout: parley::Layout<Color> = builder.build(text);
        layout.break_all_lines(None);
        let alignment = match content.align {
            TextAlign::Left => parley::Alignment::Start,
            TextAlign::Center => parley::Alignment::Center,
            TextAlign::Right => parley::Alignment::End,
        };
        let width = layout.width();
        layout.align(Some(width), alignment, parley::AlignmentOptions::default());

        Ok(ShapedText {
            layout,
            font: self.registered[i].data.clone(),
        })
    }
}

/// Top-left of a shaped block in layer-local space: vertically centered on the origin, and
/// horizontally starting at, centered on, or ending at the origin.
pub fn block_origin(align: TextAlign, size: Size) -> (f64, f64) {
    let x = match align {
        TextAlign::Left => 0.0,
        TextAlign::Center => -size.width / 2.0,
        TextAlign::Right => -size.width,
    };
    (x, -size.height / 2.0)
}

/// How glyph outlines are painted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum GlyphPaint {
    Fill,
    Stroke,
}

/// Draw every glyph run of `shaped` with the context's current paint and transform.
pub(crate) fn draw_glyphs(ctx: &mut vello_cpu::RenderContext, shaped: &ShapedText, mode: GlyphPaint) {
    for line in shaped.layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            let builder = ctx
                .glyph_run(&shaped.font)
                .font_size(run.run().font_size());
            match mode {
                GlyphPaint::Fill => builder.fill_glyphs(glyphs),
                GlyphPaint::Stroke => builder.stroke_glyphs(glyphs),
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
