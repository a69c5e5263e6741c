//! Bitmap and font resources: decoding, descriptors, and the lazy resolver cache.

/// Image decoding, data URLs and PNG encoding.
pub mod decode;
/// Font faces and composed font descriptors.
pub mod font;
/// Lazy resource cache and loader collaborators.
pub mod resolver;
