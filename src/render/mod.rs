//! CPU render pipeline: layer rasterization, pixel passes, text shaping and selection chrome.

/// Selection chrome geometry.
pub mod chrome;
/// `vello_cpu` renderer.
pub mod cpu;
/// Rendered frame type.
pub mod frame;
/// Pixel passes over premultiplied buffers.
pub mod passes;
/// Parley text layout.
pub mod text;
