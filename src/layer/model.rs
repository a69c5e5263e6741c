use crate::foundation::core::{Affine, Color, Point, Size, Vec2};
use crate::foundation::error::{CanvasError, CanvasResult};

/// Stable, unique layer identifier (UUID v4 text for freshly created layers).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier (e.g. one read back from storage).
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One addressable visual element.
///
/// Geometry is center-based: `(x, y)` is the layer center in canvas space and `width`/`height`
/// describe the unscaled local box. `id` and the kind tag are fixed at construction; everything
/// else changes through [`Layer::apply`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    id: LayerId,
    /// Display name.
    pub name: String,
    /// Center x in canvas units.
    pub x: f64,
    /// Center y in canvas units.
    pub y: f64,
    /// Unscaled local width.
    pub width: f64,
    /// Unscaled local height.
    pub height: f64,
    /// Horizontal scale multiplier; never zero.
    #[serde(default = "one")]
    pub scale_x: f64,
    /// Vertical scale multiplier; never zero.
    #[serde(default = "one")]
    pub scale_y: f64,
    /// Rotation about the center, in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Layer alpha in `[0, 1]`.
    #[serde(default = "one")]
    pub opacity: f64,
    /// Render gate.
    #[serde(default = "yes")]
    pub visible: bool,
    /// Excluded from hit-testing when set.
    #[serde(default)]
    pub locked: bool,
    #[serde(flatten)]
    kind: LayerKind,
}

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

/// Kind-specific payload, tagged by `type` in the persisted form.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    /// Raster image.
    Image(ImageContent),
    /// Styled text run.
    Text(TextContent),
    /// Filled vector primitive.
    Shape(ShapeContent),
}

impl LayerKind {
    /// Short human-readable label for the kind.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Image(_) => "Image",
            Self::Text(_) => "Text",
            Self::Shape(s) => s.shape_type.label(),
        }
    }
}

/// Image payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    /// Content reference: URL, relative path, or `data:` URL.
    pub src: String,
    /// Visual filter set.
    #[serde(default)]
    pub filters: ImageFilters,
}

/// CSS-style image filters. Percentages are 0..=N with 100 meaning "unchanged" for
/// brightness/contrast/saturation and 0 meaning "unchanged" for grayscale/sepia.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageFilters {
    /// Brightness percentage.
    pub brightness: f64,
    /// Contrast percentage.
    pub contrast: f64,
    /// Saturation percentage.
    pub saturation: f64,
    /// Gaussian blur standard deviation in canvas pixels.
    pub blur: f64,
    /// Grayscale amount percentage.
    pub grayscale: f64,
    /// Sepia amount percentage.
    pub sepia: f64,
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            blur: 0.0,
            grayscale: 0.0,
            sepia: 0.0,
        }
    }
}

impl ImageFilters {
    /// True when every filter is at its neutral value.
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    /// True when any color-matrix filter deviates from neutral.
    pub fn has_color_adjustments(&self) -> bool {
        let n = Self::default();
        self.brightness != n.brightness
            || self.contrast != n.contrast
            || self.saturation != n.saturation
            || self.grayscale != n.grayscale
            || self.sepia != n.sepia
    }
}

/// Font slant.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Italic.
    Italic,
}

/// Horizontal text alignment relative to the layer center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Text starts at the center.
    Left,
    /// Text is centered on the center.
    #[default]
    Center,
    /// Text ends at the center.
    Right,
}

/// Text outline.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextStroke {
    /// Outline color.
    pub color: Color,
    /// Outline width in local units; ignored when `<= 0`.
    pub width: f64,
}

/// Drop shadow behind text.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextShadow {
    /// Shadow color.
    pub color: Color,
    /// Blur radius in canvas pixels.
    #[serde(default)]
    pub blur: f64,
    /// Horizontal offset in canvas pixels.
    #[serde(default)]
    pub offset_x: f64,
    /// Vertical offset in canvas pixels.
    #[serde(default)]
    pub offset_y: f64,
}

impl TextShadow {
    /// A shadow is only drawn when it is visible and has some magnitude.
    pub fn is_effective(&self) -> bool {
        !self.color.is_transparent()
            && (self.blur > 0.0 || self.offset_x != 0.0 || self.offset_y != 0.0)
    }
}

/// Text payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    /// UTF-8 content; newlines start new lines.
    pub text: String,
    /// Font family name.
    pub font_family: String,
    /// Font size in local units.
    pub font_size: f64,
    /// CSS numeric weight (400 = normal, 700 = bold).
    #[serde(default = "default_font_weight")]
    pub font_weight: u16,
    /// Slant.
    #[serde(default)]
    pub font_style: FontStyle,
    /// Fill color.
    pub fill: Color,
    /// Optional outline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<TextStroke>,
    /// Optional drop shadow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<TextShadow>,
    /// Horizontal alignment.
    #[serde(default)]
    pub align: TextAlign,
}

fn default_font_weight() -> u16 {
    400
}

/// Vector primitive sub-kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    /// Full local box.
    Rectangle,
    /// Circle with radius = half the local width.
    Circle,
    /// Isosceles triangle spanning the local box, apex at top center.
    Triangle,
}

impl ShapeType {
    fn label(self) -> &'static str {
        match self {
            Self::Rectangle => "Rectangle",
            Self::Circle => "Circle",
            Self::Triangle => "Triangle",
        }
    }
}

/// Shape payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeContent {
    /// Sub-kind; fixed at creation.
    pub shape_type: ShapeType,
    /// Fill color.
    pub fill: Color,
}

pub(crate) const DEFAULT_TEXT: &str = "ADD TEXT";
pub(crate) const DEFAULT_FONT_FAMILY: &str = "Inter";
const DEFAULT_FONT_SIZE: f64 = 72.0;
const DEFAULT_SHAPE_SIZE: f64 = 200.0;

impl Layer {
    fn with_kind(kind: LayerKind, center: Point, size: Size) -> Self {
        Self {
            id: LayerId::generate(),
            name: kind.label().to_string(),
            x: center.x,
            y: center.y,
            width: size.width,
            height: size.height,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            opacity: 1.0,
            visible: true,
            locked: false,
            kind,
        }
    }

    /// New image layer with neutral filters.
    pub fn image(src: impl Into<String>, center: Point, size: Size) -> Self {
        Self::with_kind(
            LayerKind::Image(ImageContent {
                src: src.into(),
                filters: ImageFilters::default(),
            }),
            center,
            size,
        )
    }

    /// New text layer using the default bold white style.
    ///
    /// The local box is a layout estimate (0.6 em per character, 1.2 em per line); callers that
    /// measured the text can overwrite it with a patch.
    pub fn text(text: impl Into<String>, center: Point) -> Self {
        let text = text.into();
        let size = estimate_text_box(&text, DEFAULT_FONT_SIZE);
        Self::with_kind(
            LayerKind::Text(TextContent {
                text,
                font_family: DEFAULT_FONT_FAMILY.to_string(),
                font_size: DEFAULT_FONT_SIZE,
                font_weight: 700,
                font_style: FontStyle::Normal,
                fill: Color::WHITE,
                stroke: None,
                shadow: None,
                align: TextAlign::Center,
            }),
            center,
            size,
        )
    }

    /// New shape layer, fully opaque.
    pub fn shape(shape_type: ShapeType, fill: Color, center: Point) -> Self {
        Self::with_kind(
            LayerKind::Shape(ShapeContent { shape_type, fill }),
            center,
            Size::new(DEFAULT_SHAPE_SIZE, DEFAULT_SHAPE_SIZE),
        )
    }

    /// Return the layer renamed.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Copy of this layer under a fresh id.
    pub(crate) fn duplicate(&self) -> Self {
        let mut out = self.clone();
        out.id = LayerId::generate();
        out
    }

    /// Stable identifier.
    pub fn id(&self) -> &LayerId {
        &self.id
    }

    /// Kind payload.
    pub fn kind(&self) -> &LayerKind {
        &self.kind
    }

    /// Center point.
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Absolute scaled size of the local box.
    pub fn scaled_size(&self) -> Size {
        Size::new(
            self.width * self.scale_x.abs(),
            self.height * self.scale_y.abs(),
        )
    }

    /// Local → canvas transform: translate(x, y) · rotate(rotation) · scale(scaleX, scaleY).
    pub fn transform(&self) -> Affine {
        Affine::translate(Vec2::new(self.x, self.y))
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }

    /// Visible and unlocked.
    pub fn is_hittable(&self) -> bool {
        self.visible && !self.locked
    }

    /// Shallow-merge `patch` onto a copy of this layer.
    pub fn apply(&self, patch: &LayerPatch) -> CanvasResult<Self> {
        let mut out = self.clone();
        if let Some(name) = &patch.name {
            out.name = name.clone();
        }
        if let Some(v) = patch.x {
            out.x = finite("x", v)?;
        }
        if let Some(v) = patch.y {
            out.y = finite("y", v)?;
        }
        if let Some(v) = patch.width {
            out.width = non_negative("width", v)?;
        }
        if let Some(v) = patch.height {
            out.height = non_negative("height", v)?;
        }
        if let Some(v) = patch.scale_x {
            out.scale_x = non_zero("scaleX", v)?;
        }
        if let Some(v) = patch.scale_y {
            out.scale_y = non_zero("scaleY", v)?;
        }
        if let Some(v) = patch.rotation {
            out.rotation = finite("rotation", v)?;
        }
        if let Some(v) = patch.opacity {
            out.opacity = finite("opacity", v)?.clamp(0.0, 1.0);
        }
        if let Some(v) = patch.visible {
            out.visible = v;
        }
        if let Some(v) = patch.locked {
            out.locked = v;
        }
        if let Some(content) = &patch.content {
            apply_content(&mut out.kind, content)?;
        }
        Ok(out)
    }
}

fn apply_content(kind: &mut LayerKind, patch: &ContentPatch) -> CanvasResult<()> {
    match (kind, patch) {
        (LayerKind::Image(img), ContentPatch::Image(p)) => {
            if let Some(src) = &p.src {
                img.src = src.clone();
            }
            if let Some(filters) = p.filters {
                img.filters = filters;
            }
        }
        (LayerKind::Text(t), ContentPatch::Text(p)) => {
            if let Some(text) = &p.text {
                t.text = text.clone();
            }
            if let Some(family) = &p.font_family {
                t.font_family = family.clone();
            }
            if let Some(size) = p.font_size {
                if !size.is_finite() || size <= 0.0 {
                    return Err(CanvasError::validation("fontSize must be finite and > 0"));
                }
                t.font_size = size;
            }
            if let Some(weight) = p.font_weight {
                t.font_weight = weight.clamp(1, 1000);
            }
            if let Some(style) = p.font_style {
                t.font_style = style;
            }
            if let Some(fill) = p.fill {
                t.fill = fill;
            }
            if let Some(stroke) = p.stroke {
                t.stroke = stroke;
            }
            if let Some(shadow) = p.shadow {
                t.shadow = shadow;
            }
            if let Some(align) = p.align {
                t.align = align;
            }
        }
        (LayerKind::Shape(s), ContentPatch::Shape(p)) => {
            if let Some(fill) = p.fill {
                s.fill = fill;
            }
        }
        (kind, _) => {
            return Err(CanvasError::validation(format!(
                "content patch does not match layer kind '{}'",
                kind.label()
            )));
        }
    }
    Ok(())
}

fn finite(field: &str, v: f64) -> CanvasResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CanvasError::validation(format!("{field} must be finite")))
    }
}

fn non_negative(field: &str, v: f64) -> CanvasResult<f64> {
    if v.is_finite() && v >= 0.0 {
        Ok(v)
    } else {
        Err(CanvasError::validation(format!(
            "{field} must be finite and >= 0"
        )))
    }
}

fn non_zero(field: &str, v: f64) -> CanvasResult<f64> {
    if v.is_finite() && v != 0.0 {
        Ok(v)
    } else {
        Err(CanvasError::validation(format!(
            "{field} must be finite and non-zero"
        )))
    }
}

pub(crate) fn estimate_text_box(text: &str, font_size: f64) -> Size {
    let lines = text.lines().count().max(1);
    let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0).max(1);
    Size::new(
        longest as f64 * font_size * 0.6,
        lines as f64 * font_size * 1.2,
    )
}

/// Partial update merged onto a layer by [`Layer::apply`]. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerPatch {
    /// New display name.
    pub name: Option<String>,
    /// New center x.
    pub x: Option<f64>,
    /// New center y.
    pub y: Option<f64>,
    /// New local width.
    pub width: Option<f64>,
    /// New local height.
    pub height: Option<f64>,
    /// New horizontal scale.
    pub scale_x: Option<f64>,
    /// New vertical scale.
    pub scale_y: Option<f64>,
    /// New rotation in degrees.
    pub rotation: Option<f64>,
    /// New opacity (clamped to `[0, 1]`).
    pub opacity: Option<f64>,
    /// New visibility.
    pub visible: Option<bool>,
    /// New lock state.
    pub locked: Option<bool>,
    /// Kind-specific changes; must match the layer kind.
    pub content: Option<ContentPatch>,
}

impl LayerPatch {
    /// Move the center to `p`.
    pub fn position(p: Point) -> Self {
        Self {
            x: Some(p.x),
            y: Some(p.y),
            ..Self::default()
        }
    }

    /// Set both scale factors.
    pub fn scale(scale_x: f64, scale_y: f64) -> Self {
        Self {
            scale_x: Some(scale_x),
            scale_y: Some(scale_y),
            ..Self::default()
        }
    }

    /// Set the rotation.
    pub fn rotation(degrees: f64) -> Self {
        Self {
            rotation: Some(degrees),
            ..Self::default()
        }
    }

    /// Apply text changes only.
    pub fn text(patch: TextPatch) -> Self {
        Self {
            content: Some(ContentPatch::Text(patch)),
            ..Self::default()
        }
    }

    /// Whether the patch carries text changes that alter the text layout.
    pub fn changes_text_layout(&self) -> bool {
        matches!(&self.content, Some(ContentPatch::Text(p)) if p.changes_layout())
    }

    /// Replace the image content reference.
    pub fn image_src(src: impl Into<String>) -> Self {
        Self {
            content: Some(ContentPatch::Image(ImagePatch {
                src: Some(src.into()),
                filters: None,
            })),
            ..Self::default()
        }
    }
}

/// Kind-specific part of a [`LayerPatch`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPatch {
    /// Image changes.
    Image(ImagePatch),
    /// Text changes.
    Text(TextPatch),
    /// Shape changes.
    Shape(ShapePatch),
}

/// Image changes.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImagePatch {
    /// New content reference.
    pub src: Option<String>,
    /// New filter set.
    pub filters: Option<ImageFilters>,
}

/// Text changes. `stroke`/`shadow` use `Some(None)` to remove the effect.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextPatch {
    /// New content.
    pub text: Option<String>,
    /// New family.
    pub font_family: Option<String>,
    /// New size.
    pub font_size: Option<f64>,
    /// New weight.
    pub font_weight: Option<u16>,
    /// New slant.
    pub font_style: Option<FontStyle>,
    /// New fill.
    pub fill: Option<Color>,
    /// New outline.
    pub stroke: Option<Option<TextStroke>>,
    /// New shadow.
    pub shadow: Option<Option<TextShadow>>,
    /// New alignment.
    pub align: Option<TextAlign>,
}

impl TextPatch {
    /// Whether applying the patch changes the laid-out size of the text.
    pub fn changes_layout(&self) -> bool {
        self.text.is_some()
            || self.font_family.is_some()
            || self.font_size.is_some()
            || self.font_weight.is_some()
            || self.font_style.is_some()
    }
}

/// Shape changes.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapePatch {
    /// New fill.
    pub fill: Option<Color>,
}

#[cfg(test)]
#[path = "../../tests/unit/layer/model.rs"]
mod tests;
