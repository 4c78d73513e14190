use crate::common::*;

/// Peak signal-to-noise ratio between two [0, 1] tensors of the same
/// shape, in decibels. Identical inputs yield positive infinity.
pub fn psnr(pred: &Tensor, target: &Tensor) -> Result<f64> {
    ensure!(
        pred.size() == target.size(),
        "shape mismatch: {:?} vs {:?}",
        pred.size(),
        target.size()
    );

    let mse = f64::from((pred - target).square().mean(Kind::Float));
    if mse <= 0.0 {
        return Ok(f64::INFINITY);
    }

    Ok(-10.0 * mse.log10())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identical_tensors_have_infinite_psnr() {
        let image = Tensor::rand(&[3, 8, 8], tch::kind::FLOAT_CPU);
        assert_eq!(psnr(&image, &image).unwrap(), f64::INFINITY);
    }

    #[test]
    fn uniform_error_has_known_psnr() {
        let zeros = Tensor::zeros(&[3, 8, 8], tch::kind::FLOAT_CPU);
        let half = &zeros + 0.5;
        // mse = 0.25, psnr = -10 log10(0.25)
        assert_abs_diff_eq!(
            psnr(&half, &zeros).unwrap(),
            -10.0 * 0.25f64.log10(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let a = Tensor::zeros(&[3, 8, 8], tch::kind::FLOAT_CPU);
        let b = Tensor::zeros(&[3, 4, 4], tch::kind::FLOAT_CPU);
        assert!(psnr(&a, &b).is_err());
    }
}
