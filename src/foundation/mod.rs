//! Shared primitives: geometry and color types, the error taxonomy, pixel math and tuning.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
pub(crate) mod settings;
