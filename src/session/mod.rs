//! Project lifecycle: presets and documents, and the editing session tying every component
//! together.

/// Interactive editing session and export collaborators.
pub mod editor;
/// Presets, canvas configuration and the persisted project document.
pub mod project;
