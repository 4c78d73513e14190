//! Dataset processing toolkit.

mod dataset;
mod loader;
mod manifest;

pub use dataset::*;
pub use loader::*;
pub use manifest::*;
