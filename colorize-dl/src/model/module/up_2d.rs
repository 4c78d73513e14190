use super::{ConvBlock, ConvBlockInit};
use crate::common::*;

/// The upsampling stage: learned 2x upsample (transposed convolution),
/// concatenation with the matching-resolution encoder output, then a
/// [ConvBlock].
#[derive(Debug, Clone)]
pub struct Up2DInit {
    pub in_c: usize,
    pub skip_c: usize,
    pub out_c: usize,
}

impl Up2DInit {
    pub fn new(in_c: usize, skip_c: usize, out_c: usize) -> Self {
        Self {
            in_c,
            skip_c,
            out_c,
        }
    }

    pub fn build<'p, P>(self, path: P) -> Up2D
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();
        let Self {
            in_c,
            skip_c,
            out_c,
        } = self;
        let up_c = in_c / 2;

        let up = nn::conv_transpose2d(
            path / "up",
            in_c as i64,
            up_c as i64,
            2,
            nn::ConvTransposeConfig {
                stride: 2,
                ..Default::default()
            },
        );
        let conv = ConvBlockInit::new(up_c + skip_c, out_c).build(path / "conv");

        Up2D { up, conv }
    }
}

#[derive(Debug)]
pub struct Up2D {
    up: nn::ConvTranspose2D,
    conv: ConvBlock,
}

impl Up2D {
    pub fn forward_t(&self, xs: &Tensor, skip: &Tensor, train: bool) -> Result<Tensor> {
        let xs = xs.apply(&self.up);

        let (_b, _c, skip_h, skip_w) = skip.size4()?;
        let (_b, _c, up_h, up_w) = xs.size4()?;

        // The encoder pooling floors odd sizes, so the upsampled map can
        // land short of the skip by one pixel per axis. Zero-pad to the
        // skip size before concatenation.
        let diff_h = skip_h - up_h;
        let diff_w = skip_w - up_w;
        let xs = if diff_h != 0 || diff_w != 0 {
            xs.zero_pad2d(
                diff_w / 2,
                diff_w - diff_w / 2,
                diff_h / 2,
                diff_h - diff_h / 2,
            )
        } else {
            xs
        };

        let xs = Tensor::cat(&[skip, &xs], 1);
        Ok(self.conv.forward_t(&xs, train))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_2d_restores_skip_resolution() {
        let vs = nn::VarStore::new(Device::Cpu);
        let up = Up2DInit::new(16, 8, 8).build(&vs.root() / "up");

        let xs = Tensor::rand(&[1, 16, 8, 8], tch::kind::FLOAT_CPU);
        let skip = Tensor::rand(&[1, 8, 16, 16], tch::kind::FLOAT_CPU);
        let output = up.forward_t(&xs, &skip, false).unwrap();
        assert_eq!(output.size(), vec![1, 8, 16, 16]);
    }

    #[test]
    fn up_2d_pads_to_odd_skip_sizes() {
        let vs = nn::VarStore::new(Device::Cpu);
        let up = Up2DInit::new(16, 8, 8).build(&vs.root() / "up");

        // skip 25x25 pools to 12x12, deconv restores only 24x24
        let xs = Tensor::rand(&[1, 16, 12, 12], tch::kind::FLOAT_CPU);
        let skip = Tensor::rand(&[1, 8, 25, 25], tch::kind::FLOAT_CPU);
        let output = up.forward_t(&xs, &skip, false).unwrap();
        assert_eq!(output.size(), vec![1, 8, 25, 25]);
    }
}
