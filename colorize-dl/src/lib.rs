//! The building blocks of the colorization pipeline.

mod common;
pub mod dataset;
pub mod metrics;
pub mod model;
