mod conv_block;
mod down_2d;
mod up_2d;

pub use conv_block::*;
pub use down_2d::*;
pub use up_2d::*;
