//! Image fidelity metrics.

mod psnr;
mod ssim;

pub use psnr::*;
pub use ssim::*;
