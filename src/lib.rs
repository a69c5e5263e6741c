//! Layer-based 2D canvas composition engine.
//!
//! A project is an ordered stack of image, text and shape layers on a fixed-size canvas. The
//! crate renders that stack deterministically on the CPU, drives move / scale / rotate gestures
//! with rotation-aware hit-testing, keeps a bounded undo/redo history of layer snapshots, and
//! resolves bitmaps and fonts through a cache that never blocks or corrupts rendering.
//!
//! [`ProjectSession`] ties the pieces together and is the usual entry point:
//!
//! ```no_run
//! use layercraft::{Color, DesignPreset, ProjectSession, ShapeType};
//!
//! let mut session = ProjectSession::new_project(DesignPreset::Thumbnail);
//! session.add_shape_layer(ShapeType::Circle, Color::rgb(239, 68, 68));
//! session.add_text_layer("ADD TEXT");
//! let frame = session.render_clean()?;
//! std::fs::write("thumb.png", frame.to_png()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod foundation;

/// Image decoding, font faces and the resource resolver.
pub mod assets;
/// Bounded undo/redo history of layer snapshots.
pub mod history;
/// Viewport mapping, hit-testing and the transform gesture controller.
pub mod interact;
pub mod layer;
pub mod render;
/// Canvas presets, project documents and the editing session.
pub mod session;

pub use assets::decode::{PreparedImage, decode_image};
pub use assets::font::{FontDescriptor, FontFace, PreparedFont};
pub use assets::resolver::{
    FsResourceLoader, ResourceLoader, ResourceRequest, ResourceResolver, ResourceState,
};
pub use foundation::core::{Affine, BezPath, CanvasSize, Color, Point, Rect, Size, Vec2, rotate_vec};
pub use foundation::error::{CanvasError, CanvasResult};
pub use foundation::settings::EngineSettings;
pub use history::History;
pub use interact::gesture::{Gesture, TransformController};
pub use interact::viewport::Viewport;
pub use layer::model::{
    ContentPatch, FontStyle, ImageContent, ImageFilters, ImagePatch, Layer, LayerId, LayerKind,
    LayerPatch, ShapeContent, ShapePatch, ShapeType, TextAlign, TextContent, TextPatch,
    TextShadow, TextStroke,
};
pub use layer::stack::LayerStack;
pub use render::chrome::Handle;
pub use render::cpu::{CpuRenderer, Scene};
pub use render::frame::FrameRGBA;
pub use session::editor::{
    ExportReceipt, ImageStorage, ImageTransform, ProjectRecord, ProjectSession, ProjectStore,
};
pub use session::project::{CanvasConfig, DesignPreset, ProjectDocument};
