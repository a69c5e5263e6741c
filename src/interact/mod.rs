//! Pointer interaction: viewport mapping, rotation-aware hit-testing and the transform gesture
//! state machine.

/// Point-in-layer and handle hit tests.
pub mod hit;
/// Move / scale / rotate gesture controller.
pub mod gesture;
/// Viewport pixel to canvas mapping.
pub mod viewport;
