use crate::common::*;

/// The double convolution block: (conv3x3 - batch norm - ReLU) twice.
#[derive(Debug, Clone)]
pub struct ConvBlockInit {
    pub in_c: usize,
    pub out_c: usize,
}

impl ConvBlockInit {
    pub fn new(in_c: usize, out_c: usize) -> Self {
        Self { in_c, out_c }
    }

    pub fn build<'p, P>(self, path: P) -> ConvBlock
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();
        let Self { in_c, out_c } = self;

        let conv_config = nn::ConvConfig {
            padding: 1,
            bias: false,
            ..Default::default()
        };

        let conv1 = nn::conv2d(path / "conv1", in_c as i64, out_c as i64, 3, conv_config);
        let bn1 = nn::batch_norm2d(path / "bn1", out_c as i64, Default::default());
        let conv2 = nn::conv2d(path / "conv2", out_c as i64, out_c as i64, 3, conv_config);
        let bn2 = nn::batch_norm2d(path / "bn2", out_c as i64, Default::default());

        ConvBlock {
            conv1,
            bn1,
            conv2,
            bn2,
        }
    }
}

#[derive(Debug)]
pub struct ConvBlock {
    conv1: nn::Conv2D,
    bn1: nn::BatchNorm,
    conv2: nn::Conv2D,
    bn2: nn::BatchNorm,
}

impl nn::ModuleT for ConvBlock {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        xs.apply(&self.conv1)
            .apply_t(&self.bn1, train)
            .relu()
            .apply(&self.conv2)
            .apply_t(&self.bn2, train)
            .relu()
    }
}
