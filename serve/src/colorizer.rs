//! The colorizer service object.

use crate::{common::*, state::Storage};

/// Simulated processing time of the mock pass-through path.
pub const MOCK_DELAY: Duration = Duration::from_secs(2);

const DEFAULT_RENDER_FACTOR: i64 = 35;

/// Failure kinds of the colorization path.
#[derive(Debug, thiserror::Error)]
pub enum ColorizeError {
    #[error("colorization model is not loaded")]
    ModelNotLoaded,
    #[error("image transform failed: {0}")]
    Transform(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ColorizeError {
    /// Recoverable kinds degrade to mock output. Everything else
    /// propagates to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ModelNotLoaded | Self::Transform(_))
    }
}

/// Environment-configured colorizer options with safe fallbacks.
#[derive(Debug, Clone)]
pub struct ColorizerOptions {
    pub model_file: PathBuf,
    pub device: Device,
    pub render_factor: i64,
}

impl ColorizerOptions {
    /// Read `DEVICE` and `RENDER_FACTOR` from the environment. An unset
    /// or unrecognized `DEVICE` auto-detects, a non-numeric
    /// `RENDER_FACTOR` falls back to the default.
    pub fn from_env(model_file: impl Into<PathBuf>) -> Self {
        let device = match env::var("DEVICE").as_deref() {
            Ok("cpu") => Device::Cpu,
            Ok("cuda") => Device::Cuda(0),
            _ => Device::cuda_if_available(),
        };
        let render_factor = env::var("RENDER_FACTOR")
            .ok()
            .and_then(|text| text.parse().ok())
            .unwrap_or(DEFAULT_RENDER_FACTOR);

        Self {
            model_file: model_file.into(),
            device,
            render_factor,
        }
    }
}

/// Wraps the pretrained colorization module behind an
/// upload-bytes-in, output-path-out interface.
pub struct Colorizer {
    model: Option<CModule>,
    device: Device,
    render_factor: i64,
    uploads_dir: PathBuf,
    processed_dir: PathBuf,
}

impl Colorizer {
    /// Build the service. A model that fails to load leaves the service
    /// in mock mode instead of failing startup.
    pub fn new(options: ColorizerOptions, storage: &Storage) -> Self {
        let ColorizerOptions {
            model_file,
            device,
            render_factor,
        } = options;
        info!(
            "using device {:?}, render_factor {}",
            device, render_factor
        );

        let model = match CModule::load_on_device(&model_file, device) {
            Ok(model) => {
                info!("loaded colorization model from {}", model_file.display());
                Some(model)
            }
            Err(err) => {
                error!(
                    "failed to load colorization model from {}: {}",
                    model_file.display(),
                    err
                );
                None
            }
        };

        Self {
            model,
            device,
            render_factor,
            uploads_dir: storage.uploads_dir.clone(),
            processed_dir: storage.processed_dir.clone(),
        }
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Colorize raw image bytes, returning the output file path.
    ///
    /// Recoverable failures (model unavailable, transform errors) fall
    /// back to a mock pass-through copy; other errors propagate.
    pub fn colorize(&self, bytes: &[u8], filename: &str) -> Result<PathBuf> {
        match self.try_colorize(bytes, filename) {
            Ok(path) => Ok(path),
            Err(err) if err.is_recoverable() => {
                warn!("falling back to mock colorization: {}", err);
                Ok(self.mock_colorize(bytes, filename)?)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn try_colorize(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, ColorizeError> {
        let model = self.model.as_ref().ok_or(ColorizeError::ModelNotLoaded)?;

        let output_filename = format!(
            "colorized_{}{}",
            unix_timestamp_millis(),
            output_extension(filename)
        );
        let temp_file = self.uploads_dir.join(format!("temp_{}", output_filename));
        fs::write(&temp_file, bytes)?;

        let result = self.transform(model, &temp_file);
        // the temp copy is removed on both outcomes
        let _ = fs::remove_file(&temp_file);
        let output = result?;

        let output_file = self.processed_dir.join(&output_filename);
        vision::image::save(&output, &output_file)
            .map_err(|err| ColorizeError::Transform(err.to_string()))?;
        info!("colorization completed: {}", output_file.display());

        Ok(output_file)
    }

    /// Run the pretrained module at render-factor resolution and scale
    /// the prediction back to the source size.
    fn transform(&self, model: &CModule, image_file: &Path) -> Result<Tensor, ColorizeError> {
        let transform_err = |err: tch::TchError| ColorizeError::Transform(err.to_string());

        tch::no_grad(|| {
            let image = vision::image::load(image_file).map_err(transform_err)?;
            let (channels, orig_h, orig_w) = image.size3().map_err(transform_err)?;

            let render_size = self.render_factor * 16;
            let input = image
                .to_kind(Kind::Float)
                .view([1, channels, orig_h, orig_w])
                .upsample_bicubic2d(&[render_size, render_size], false, None, None)
                .clamp(0.0, 255.0)
                .to_device(self.device)
                / 255.0;

            let output = model.forward_ts(&[input]).map_err(transform_err)?;
            let (_batch, out_c, _h, _w) = output.size4().map_err(transform_err)?;

            let output = (output.to_device(Device::Cpu).clamp(0.0, 1.0) * 255.0)
                .upsample_bicubic2d(&[orig_h, orig_w], false, None, None)
                .clamp(0.0, 255.0)
                .view([out_c, orig_h, orig_w])
                .to_kind(Kind::Uint8);

            Ok(output)
        })
    }

    /// Pass-through copy with a simulated processing delay.
    fn mock_colorize(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, ColorizeError> {
        info!("using mock colorization mode");
        let output_filename = format!(
            "mock_{}{}",
            unix_timestamp_millis(),
            output_extension(filename)
        );
        let output_file = self.processed_dir.join(output_filename);
        fs::write(&output_file, bytes)?;

        std::thread::sleep(MOCK_DELAY);
        Ok(output_file)
    }
}

/// The output keeps the upload's extension, defaulting to `.jpg`.
fn output_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| ".jpg".to_string())
}

fn unix_timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0)
}
