use std::collections::HashSet;

use crate::foundation::core::{CanvasSize, Color};
use crate::foundation::error::{CanvasError, CanvasResult};
use crate::layer::stack::LayerStack;

/// Named canvas presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignPreset {
    /// 1280x720 video thumbnail.
    Thumbnail,
    /// 1920x1080 hero banner.
    HeroBanner,
    /// 1280x1920 portrait series cover.
    SeriesCover,
    /// 1500x500 channel banner.
    ChannelBanner,
    /// 512x512 avatar.
    Avatar,
    /// 1080x1080 social post.
    SocialPost,
}

impl DesignPreset {
    /// Every preset, in menu order.
    pub const ALL: [DesignPreset; 6] = [
        DesignPreset::Thumbnail,
        DesignPreset::HeroBanner,
        DesignPreset::SeriesCover,
        DesignPreset::ChannelBanner,
        DesignPreset::Avatar,
        DesignPreset::SocialPost,
    ];

    /// Canvas size in pixels.
    pub fn size(self) -> CanvasSize {
        let (width, height) = match self {
            Self::Thumbnail => (1280, 720),
            Self::HeroBanner => (1920, 1080),
            Self::SeriesCover => (1280, 1920),
            Self::ChannelBanner => (1500, 500),
            Self::Avatar => (512, 512),
            Self::SocialPost => (1080, 1080),
        };
        CanvasSize { width, height }
    }

    /// Stable tag recorded with exported projects.
    pub fn design_type(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::HeroBanner => "hero_banner",
            Self::SeriesCover => "series_cover",
            Self::ChannelBanner => "channel_banner",
            Self::Avatar => "avatar",
            Self::SocialPost => "social_post",
        }
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Thumbnail => "Thumbnail",
            Self::HeroBanner => "Hero Banner",
            Self::SeriesCover => "Series Cover",
            Self::ChannelBanner => "Channel Banner",
            Self::Avatar => "Avatar",
            Self::SocialPost => "Social Post",
        }
    }

    /// Inverse of [`Self::design_type`].
    pub fn from_design_type(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.design_type() == tag)
    }
}

impl std::fmt::Display for DesignPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.design_type())
    }
}

impl std::str::FromStr for DesignPreset {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_design_type(s.trim())
            .ok_or_else(|| CanvasError::validation(format!("unknown design preset '{s}'")))
    }
}

/// Canvas dimensions and background.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Fill behind all layers.
    #[serde(default)]
    pub background_color: Color,
}

impl CanvasConfig {
    /// White canvas of a validated size.
    pub fn new(width: u32, height: u32) -> CanvasResult<Self> {
        let size = CanvasSize::new(width, height)?;
        Ok(Self::with_size(size))
    }

    /// White canvas for `preset`.
    pub fn for_preset(preset: DesignPreset) -> Self {
        Self::with_size(preset.size())
    }

    fn with_size(size: CanvasSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
            background_color: Color::WHITE,
        }
    }

    /// Validated size.
    pub fn size(&self) -> CanvasResult<CanvasSize> {
        CanvasSize::new(self.width, self.height)
    }
}

/// Persisted project: canvas configuration plus the ordered layer list.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    /// Canvas settings.
    pub canvas_config: CanvasConfig,
    /// Layers, bottom-most first.
    #[serde(default)]
    pub layers: LayerStack,
}

impl ProjectDocument {
    /// Parse and validate a document.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let doc: Self = serde_json::from_str(json)?;
        doc.validate()?;
        Ok(doc)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the invariants serde cannot express: a usable canvas size, unique layer ids,
    /// non-zero finite scales, opacity in `[0, 1]`.
    pub fn validate(&self) -> CanvasResult<()> {
        self.canvas_config.size()?;
        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.id()) {
                return Err(CanvasError::validation(format!(
                    "duplicate layer id '{}'",
                    layer.id()
                )));
            }
            for (name, v) in [("scaleX", layer.scale_x), ("scaleY", layer.scale_y)] {
                if !v.is_finite() || v == 0.0 {
                    return Err(CanvasError::validation(format!(
                        "layer '{}': {name} must be finite and non-zero",
                        layer.id()
                    )));
                }
            }
            if !(0.0..=1.0).contains(&layer.opacity) {
                return Err(CanvasError::validation(format!(
                    "layer '{}': opacity must be in [0, 1]",
                    layer.id()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/project.rs"]
mod tests;
