use crate::common::*;

/// Windowed SSIM configuration.
///
/// This follows the standard Wang et al. definition with a uniform
/// averaging window instead of the Gaussian one. Local means and
/// variances come from `avg_pool2d` over valid positions only, so
/// inputs must be at least `window_size` pixels per side.
#[derive(Debug, Clone)]
pub struct SsimInit {
    pub window_size: usize,
    pub c1: f64,
    pub c2: f64,
}

impl Default for SsimInit {
    fn default() -> Self {
        Self {
            window_size: 11,
            c1: 0.01f64.powi(2),
            c2: 0.03f64.powi(2),
        }
    }
}

impl SsimInit {
    pub fn build(self) -> Result<Ssim> {
        ensure!(self.window_size > 0, "window_size must be positive");
        Ok(Ssim { init: self })
    }
}

/// The structural similarity metric over [0, 1] tensors.
#[derive(Debug, Clone)]
pub struct Ssim {
    init: SsimInit,
}

impl Ssim {
    /// Mean SSIM between two tensors of identical C×H×W or N×C×H×W
    /// shape, averaged over windows, channels and batch.
    pub fn forward(&self, pred: &Tensor, target: &Tensor) -> Result<f64> {
        let SsimInit {
            window_size,
            c1,
            c2,
        } = self.init;

        ensure!(
            pred.size() == target.size(),
            "shape mismatch: {:?} vs {:?}",
            pred.size(),
            target.size()
        );

        let (pred, target) = match pred.dim() {
            3 => (pred.unsqueeze(0), target.unsqueeze(0)),
            4 => (pred.shallow_clone(), target.shallow_clone()),
            dim => bail!("expect a 3-D or 4-D tensor, but get {} dimensions", dim),
        };

        let (_b, _c, height, width) = pred.size4()?;
        let window = window_size as i64;
        ensure!(
            height >= window && width >= window,
            "input {}x{} is smaller than the {} pixel window",
            height,
            width,
            window
        );

        let mean = |xs: &Tensor| {
            xs.avg_pool2d(
                &[window, window],
                &[1, 1],
                &[0, 0],
                false,
                true,
                None,
            )
        };

        let mu_x = mean(&pred);
        let mu_y = mean(&target);
        let mu_xx = mu_x.square();
        let mu_yy = mu_y.square();
        let mu_xy = &mu_x * &mu_y;

        let sigma_xx = mean(&pred.square()) - &mu_xx;
        let sigma_yy = mean(&target.square()) - &mu_yy;
        let sigma_xy = mean(&(&pred * &target)) - &mu_xy;

        let numerator = (mu_xy * 2.0 + c1) * (sigma_xy * 2.0 + c2);
        let denominator = (mu_xx + mu_yy + c1) * (sigma_xx + sigma_yy + c2);
        let ssim_map = numerator / denominator;

        Ok(f64::from(ssim_map.mean(Kind::Float)))
    }
}
