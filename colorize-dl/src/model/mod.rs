//! The encoder-decoder colorization model.

mod module;
mod unet;

pub use module::*;
pub use unet::*;
