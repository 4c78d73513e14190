use super::SampleRecord;
use crate::common::*;

/// Channel layout of the grayscale input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    /// A single luma channel.
    L1,
    /// The luma channel triplicated to three channels. The fixed
    /// 3-channel model input requires this mode.
    L3,
}

impl InputMode {
    pub fn channels(&self) -> usize {
        match self {
            Self::L1 => 1,
            Self::L3 => 3,
        }
    }
}

/// One preprocessed training/evaluation sample.
#[derive(Debug)]
pub struct TensorPair {
    /// The grayscale input, C×H×W with C in {1, 3}, values in [0, 1].
    pub input: Tensor,
    /// The color target, 3×H×W, values in [0, 1].
    pub target: Tensor,
    /// The path the pair originates from.
    pub source: String,
}

/// Image pair loading and preprocessing.
///
/// The pipeline per image is: decode, resize so the longer side equals
/// `image_size` (aspect preserving, bicubic), center to a square of
/// `image_size` by symmetric zero padding of the shorter side, optional
/// horizontal flip, then scale to [0, 1] floats.
#[derive(Debug, Clone)]
pub struct PairLoader {
    image_size: NonZeroUsize,
    input_mode: InputMode,
    device: Device,
}

impl PairLoader {
    pub fn new(
        image_size: NonZeroUsize,
        input_mode: InputMode,
        device: impl Into<Option<Device>>,
    ) -> Self {
        Self {
            image_size,
            input_mode,
            device: device.into().unwrap_or(Device::Cpu),
        }
    }

    pub fn image_size(&self) -> usize {
        self.image_size.get()
    }

    /// Load and preprocess one sample pair.
    ///
    /// When `augment` is set, input and target share one horizontal flip
    /// coin with probability 0.5.
    pub fn load_pair(&self, record: &SampleRecord, augment: bool) -> Result<TensorPair> {
        let color = vision::image::load(&record.color_path).with_context(|| {
            format!(
                "failed to load color image '{}'",
                record.color_path.display()
            )
        })?;
        let color = color.to_kind(Kind::Float);

        let gray = match &record.gray_path {
            Some(path) => {
                let image = vision::image::load(path)
                    .with_context(|| format!("failed to load gray image '{}'", path.display()))?;
                to_luma(&image.to_kind(Kind::Float))?
            }
            // no grayscale asset, desaturate the color target
            None => to_luma(&color)?,
        };

        let target = self.resize_and_center(&color)?;
        let input = self.resize_and_center(&gray)?;

        let (input, target) = if augment && thread_rng().gen_bool(0.5) {
            (input.flip(&[2]), target.flip(&[2]))
        } else {
            (input, target)
        };

        let input = match self.input_mode {
            InputMode::L1 => input,
            InputMode::L3 => input.repeat(&[3, 1, 1]),
        };

        let source = record
            .gray_path
            .as_deref()
            .unwrap_or(&record.color_path)
            .display()
            .to_string();

        Ok(TensorPair {
            input: (input / 255.0).to_device(self.device),
            target: (target / 255.0).to_device(self.device),
            source,
        })
    }

    /// Resize the longer side to `image_size` and pad the shorter side
    /// symmetrically, yielding an exact `image_size`-square tensor.
    fn resize_and_center(&self, image: &Tensor) -> Result<Tensor> {
        let image_size = self.image_size.get() as i64;
        let (channels, orig_h, orig_w) = image.size3()?;

        let resize_ratio =
            (image_size as f64 / orig_h as f64).min(image_size as f64 / orig_w as f64);
        let new_h = ((orig_h as f64 * resize_ratio) as i64).clamp(1, image_size);
        let new_w = ((orig_w as f64 * resize_ratio) as i64).clamp(1, image_size);

        let resized = image
            .view([1, channels, orig_h, orig_w])
            .upsample_bicubic2d(&[new_h, new_w], false, None, None)
            // bicubic interpolation overshoots near edges
            .clamp(0.0, 255.0);

        let top_pad = (image_size - new_h) / 2;
        let bottom_pad = image_size - new_h - top_pad;
        let left_pad = (image_size - new_w) / 2;
        let right_pad = image_size - new_w - left_pad;

        let output = resized
            .zero_pad2d(left_pad, right_pad, top_pad, bottom_pad)
            .view([channels, image_size, image_size]);

        Ok(output)
    }
}

/// Reduce an image to one luma channel with Rec. 601 weights.
fn to_luma(image: &Tensor) -> Result<Tensor> {
    let (channels, _h, _w) = image.size3()?;

    let luma = match channels {
        1 => image.shallow_clone(),
        3 => {
            let r = image.i((0, .., ..));
            let g = image.i((1, .., ..));
            let b = image.i((2, .., ..));
            (r * 0.299 + g * 0.587 + b * 0.114).unsqueeze(0)
        }
        _ => bail!("expect 1 or 3 image channels, but get {}", channels),
    };

    Ok(luma)
}
