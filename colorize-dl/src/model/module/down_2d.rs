use super::{ConvBlock, ConvBlockInit};
use crate::common::*;

/// The downsampling stage: max-pool /2 followed by a [ConvBlock].
#[derive(Debug, Clone)]
pub struct Down2DInit {
    pub in_c: usize,
    pub out_c: usize,
}

impl Down2DInit {
    pub fn new(in_c: usize, out_c: usize) -> Self {
        Self { in_c, out_c }
    }

    pub fn build<'p, P>(self, path: P) -> Down2D
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();
        let Self { in_c, out_c } = self;

        Down2D {
            conv: ConvBlockInit::new(in_c, out_c).build(path / "conv"),
        }
    }
}

#[derive(Debug)]
pub struct Down2D {
    conv: ConvBlock,
}

impl nn::ModuleT for Down2D {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        self.conv.forward_t(&xs.max_pool2d_default(2), train)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn down_2d_halves_spatial_size() {
        let vs = nn::VarStore::new(Device::Cpu);
        let down = Down2DInit::new(8, 16).build(&vs.root() / "down");

        let input = Tensor::rand(&[1, 8, 32, 32], tch::kind::FLOAT_CPU);
        let output = down.forward_t(&input, false);
        assert_eq!(output.size(), vec![1, 16, 16, 16]);

        // odd sizes floor
        let input = Tensor::rand(&[1, 8, 25, 25], tch::kind::FLOAT_CPU);
        let output = down.forward_t(&input, false);
        assert_eq!(output.size(), vec![1, 16, 12, 12]);
    }
}
