use std::sync::Arc;

use crate::layer::model::{FontStyle, TextContent};

/// A loadable font face: family plus weight and slant. Size is irrelevant for loading.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontFace {
    /// Family name as written in the layer.
    pub family: String,
    /// CSS numeric weight.
    pub weight: u16,
    /// Slant.
    pub style: FontStyle,
}

impl FontFace {
    /// Face requested by a text layer.
    pub fn for_text(text: &TextContent) -> Self {
        Self {
            family: text.font_family.clone(),
            weight: text.font_weight,
            style: text.font_style,
        }
    }

    /// Conventional variant suffix, e.g. `Bold`, `SemiBoldItalic`, `Regular`, `Italic`.
    pub fn variant_name(&self) -> String {
        let weight = weight_name(self.weight);
        match (self.style, weight) {
            (FontStyle::Normal, w) => w.to_string(),
            (FontStyle::Italic, "Regular") => "Italic".to_string(),
            (FontStyle::Italic, w) => format!("{w}Italic"),
        }
    }

    /// File stem under the `{Family}-{Variant}` naming convention, spaces removed.
    pub fn file_stem(&self) -> String {
        let family: String = self.family.split_whitespace().collect();
        format!("{family}-{}", self.variant_name())
    }
}

fn weight_name(weight: u16) -> &'static str {
    match (weight.clamp(100, 900) + 50) / 100 {
        1 => "Thin",
        2 => "ExtraLight",
        3 => "Light",
        4 => "Regular",
        5 => "Medium",
        6 => "SemiBold",
        7 => "Bold",
        8 => "ExtraBold",
        _ => "Black",
    }
}

/// Fully composed CSS-like font request: `"<style> <weight> <size>px <family>"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontDescriptor {
    /// Face to load.
    pub face: FontFace,
    /// Size in whole pixels.
    pub size_px: u32,
}

impl FontDescriptor {
    /// Descriptor for a text layer; the size is rounded to an integer.
    pub fn for_text(text: &TextContent) -> Self {
        Self {
            face: FontFace::for_text(text),
            size_px: text.font_size.max(0.0).round() as u32,
        }
    }
}

impl std::fmt::Display for FontDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let style = match self.face.style {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
        };
        write!(
            f,
            "{style} {} {}px {}",
            self.face.weight, self.size_px, self.face.family
        )
    }
}

/// Raw font file bytes ready for shaping.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedFont {
    /// TTF/OTF bytes.
    pub bytes: Arc<Vec<u8>>,
}

impl PreparedFont {
    /// Wrap font bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/font.rs"]
mod tests;
