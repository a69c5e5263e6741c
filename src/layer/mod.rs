//! Layer data model and the immutable ordered layer stack.

/// Layer records, kind payloads and partial updates.
pub mod model;
/// Copy-on-write z-ordered layer list.
pub mod stack;
