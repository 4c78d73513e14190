//! The colorization inference service.

pub mod colorizer;
pub mod common;
pub mod routes;
pub mod state;
