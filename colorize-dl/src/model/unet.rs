use super::{ConvBlock, ConvBlockInit, Down2D, Down2DInit, Up2D, Up2DInit};
use crate::common::*;

/// The U-Net colorizer configuration.
///
/// Four downsampling stages double the channel count up to a cap of
/// eight times `base_c`, four mirrored upsampling stages concatenate
/// the matching encoder outputs. The final 1x1 convolution maps to
/// `out_c` channels and a sigmoid bounds the prediction to [0, 1].
#[derive(Debug, Clone)]
pub struct ColorUNetInit {
    pub in_c: usize,
    pub base_c: usize,
    pub out_c: usize,
}

impl Default for ColorUNetInit {
    fn default() -> Self {
        Self {
            in_c: 3,
            base_c: 64,
            out_c: 3,
        }
    }
}

impl ColorUNetInit {
    pub fn build<'p, P>(self, path: P) -> ColorUNet
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();
        let Self {
            in_c,
            base_c: b,
            out_c,
        } = self;

        let inc = ConvBlockInit::new(in_c, b).build(path / "inc");
        let down1 = Down2DInit::new(b, b * 2).build(path / "down1");
        let down2 = Down2DInit::new(b * 2, b * 4).build(path / "down2");
        let down3 = Down2DInit::new(b * 4, b * 8).build(path / "down3");
        // channel doubling is capped at 8x base
        let down4 = Down2DInit::new(b * 8, b * 8).build(path / "down4");

        let up1 = Up2DInit::new(b * 8, b * 8, b * 4).build(path / "up1");
        let up2 = Up2DInit::new(b * 4, b * 4, b * 2).build(path / "up2");
        let up3 = Up2DInit::new(b * 2, b * 2, b).build(path / "up3");
        let up4 = Up2DInit::new(b, b, b).build(path / "up4");

        let outc = nn::conv2d(
            path / "outc",
            b as i64,
            out_c as i64,
            1,
            Default::default(),
        );

        ColorUNet {
            inc,
            down1,
            down2,
            down3,
            down4,
            up1,
            up2,
            up3,
            up4,
            outc,
        }
    }
}

/// The U-Net encoder-decoder with skip connections.
#[derive(Debug)]
pub struct ColorUNet {
    inc: ConvBlock,
    down1: Down2D,
    down2: Down2D,
    down3: Down2D,
    down4: Down2D,
    up1: Up2D,
    up2: Up2D,
    up3: Up2D,
    up4: Up2D,
    outc: nn::Conv2D,
}

impl ColorUNet {
    /// Run the forward pass on an N x C x H x W batch. The output has
    /// the input resolution, `out_c` channels and values in [0, 1].
    pub fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let x1 = self.inc.forward_t(xs, train);
        let x2 = self.down1.forward_t(&x1, train);
        let x3 = self.down2.forward_t(&x2, train);
        let x4 = self.down3.forward_t(&x3, train);
        let x5 = self.down4.forward_t(&x4, train);

        let xs = self.up1.forward_t(&x5, &x4, train)?;
        let xs = self.up2.forward_t(&xs, &x3, train)?;
        let xs = self.up3.forward_t(&xs, &x2, train)?;
        let xs = self.up4.forward_t(&xs, &x1, train)?;

        Ok(xs.apply(&self.outc).sigmoid())
    }
}
