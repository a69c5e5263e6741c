/// Convenience result type used across layercraft.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Resource-load failures and stray pointer events never surface here: the resolver records
/// failures in its cache and the gesture controller treats out-of-order events as no-ops.
#[derive(thiserror::Error, Debug)]
pub enum CanvasError {
    /// Invalid user-provided layer, patch, or document data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while rasterizing a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors while decoding or preparing a resource outside of the render path.
    #[error("resource error: {0}")]
    Resource(String),

    /// Export (rasterize, encode, upload, persist) failed. In-memory state is left intact.
    #[error("export error: {0}")]
    Export(String),

    /// Errors when serializing or deserializing project documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CanvasError {
    /// Build a [`CanvasError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CanvasError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`CanvasError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`CanvasError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`CanvasError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for CanvasError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
