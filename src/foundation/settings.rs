use crate::foundation::core::Color;

/// Engine tuning knobs.
///
/// Sizes suffixed `_px` are on-screen pixels; the engine divides them by the current zoom so
/// selection chrome keeps a constant apparent size.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Maximum number of retained history snapshots.
    pub history_depth: usize,
    /// Side length of the square corner handles.
    pub handle_size_px: f64,
    /// Pointer tolerance around corner and rotation handles.
    pub handle_hit_radius_px: f64,
    /// Distance between the top edge and the rotation handle.
    pub rotate_handle_offset_px: f64,
    /// Stroke width of the selection outline.
    pub chrome_line_width_px: f64,
    /// Selection chrome color.
    pub chrome_color: Color,
    /// Smallest scale magnitude a scale gesture may produce.
    pub min_scale: f64,
    /// Minimum pointer-to-center distance used as the scale gesture denominator (canvas units).
    pub scale_pivot_epsilon: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            history_depth: 50,
            handle_size_px: 10.0,
            handle_hit_radius_px: 12.0,
            rotate_handle_offset_px: 30.0,
            chrome_line_width_px: 2.0,
            chrome_color: Color::rgb(59, 130, 246),
            min_scale: 0.01,
            scale_pivot_epsilon: 1.0,
        }
    }
}

impl EngineSettings {
    /// Defaults with `LAYERCRAFT_*` environment overrides applied. Unparsable or non-positive
    /// values are ignored.
    pub fn from_env() -> Self {
        let mut out = Self::default();
        if let Some(v) = env_parse::<usize>("LAYERCRAFT_HISTORY_DEPTH").filter(|&n| n > 0) {
            out.history_depth = v;
        }
        if let Some(v) = env_positive_f64("LAYERCRAFT_HANDLE_SIZE_PX") {
            out.handle_size_px = v;
        }
        if let Some(v) = env_positive_f64("LAYERCRAFT_HANDLE_HIT_RADIUS_PX") {
            out.handle_hit_radius_px = v;
        }
        if let Some(v) = env_positive_f64("LAYERCRAFT_ROTATE_HANDLE_OFFSET_PX") {
            out.rotate_handle_offset_px = v;
        }
        out
    }

    /// Return settings with a different history depth (clamped to at least 1).
    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth.max(1);
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_positive_f64(key: &str) -> Option<f64> {
    env_parse::<f64>(key).filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/settings.rs"]
mod tests;
