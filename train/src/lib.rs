//! The training and evaluation program for the colorization model.

pub mod common;
pub mod config;
pub mod eval;
pub mod train;
pub mod utils;
