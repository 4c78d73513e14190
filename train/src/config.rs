//! Training program configuration format.

use crate::common::*;

pub use dataset::*;
pub use model::*;
pub use training::*;

/// The main training configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }
}

mod dataset {
    use super::*;

    /// Dataset options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct DatasetConfig {
        /// The manifest CSV file enumerating sample pairs.
        pub manifest_file: PathBuf,
        /// The square side length of preprocessed tensors.
        pub image_size: NonZeroUsize,
        /// Channel layout of the grayscale input.
        pub input_mode: InputMode,
    }
}

mod model {
    use super::*;

    /// The model configuration.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ModelConfig {
        /// The channel count of the first encoder stage.
        pub base_channels: NonZeroUsize,
    }
}

mod training {
    use super::*;

    /// The training options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TrainingConfig {
        /// The batch size.
        pub batch_size: NonZeroUsize,
        /// The number of passes over the train split.
        pub epochs: NonZeroUsize,
        /// The fixed learning rate.
        pub learning_rate: f64,
        /// The first-moment decay parameter for the Adam optimizer.
        pub momentum: f64,
        /// If set, it saves a checkpoint file per this number of epochs.
        /// A checkpoint is always saved after the final epoch.
        pub save_checkpoint_epochs: Option<NonZeroUsize>,
        /// Checkpoint file loading method.
        pub load_checkpoint: LoadCheckpoint,
        /// The training device. Defaults to CUDA when available.
        #[serde(default, with = "serde_opt_device")]
        pub device: Option<Device>,
    }

    /// Checkpoint file loading method.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(tag = "type")]
    pub enum LoadCheckpoint {
        /// Disable checkpoint file loading.
        Disabled,
        /// Load the most recent checkpoint file.
        FromRecent,
        /// Load the checkpoint file at specified path.
        FromFile { file: PathBuf },
    }
}

/// Data logging options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// The directory run outputs and checkpoints are written into.
    pub dir: PathBuf,
}

mod serde_opt_device {
    use super::*;

    #[derive(Debug, Clone, Copy, Serialize, Deserialize)]
    struct DeviceWrapper(#[serde(with = "tch_serde::serde_device")] Device);

    pub fn serialize<S>(device: &Option<Device>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        device.map(DeviceWrapper).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Device>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let device = Option::<DeviceWrapper>::deserialize(deserializer)?;
        Ok(device.map(|DeviceWrapper(device)| device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_json5() {
        let text = r#"{
            dataset: {
                manifest_file: "data/manifest.csv",
                image_size: 512,
                input_mode: "L3",
            },
            model: { base_channels: 64 },
            training: {
                batch_size: 4,
                epochs: 10,
                learning_rate: 1e-4,
                momentum: 0.9,
                save_checkpoint_epochs: 2,
                load_checkpoint: { type: "Disabled" },
                device: "cpu",
            },
            logging: { dir: "logs" },
        }"#;

        let config: Config = json5::from_str(text).unwrap();
        assert_eq!(config.dataset.image_size.get(), 512);
        assert_eq!(config.dataset.input_mode, InputMode::L3);
        assert_eq!(config.training.batch_size.get(), 4);
        assert_eq!(config.training.device, Some(Device::Cpu));
        assert!(matches!(
            config.training.load_checkpoint,
            LoadCheckpoint::Disabled
        ));
    }

    #[test]
    fn device_defaults_to_auto_detection() {
        let text = r#"{
            dataset: {
                manifest_file: "data/manifest.csv",
                image_size: 256,
                input_mode: "L1",
            },
            model: { base_channels: 32 },
            training: {
                batch_size: 2,
                epochs: 1,
                learning_rate: 1e-3,
                momentum: 0.9,
                save_checkpoint_epochs: null,
                load_checkpoint: { type: "FromRecent" },
            },
            logging: { dir: "logs" },
        }"#;

        let config: Config = json5::from_str(text).unwrap();
        assert_eq!(config.training.device, None);
        assert_eq!(config.training.save_checkpoint_epochs, None);
    }
}
