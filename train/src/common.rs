//! Common imports from external crates.

pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use chrono::{DateTime, Local};
pub use colorize_dl::{
    dataset::{ColorizationDataset, DatasetOptions, InputMode, Split, TensorPair},
    metrics::{psnr, Ssim, SsimInit},
    model::{ColorUNet, ColorUNetInit},
};
pub use itertools::Itertools as _;
pub use rand::prelude::*;
pub use serde::{Deserialize, Deserializer, Serialize, Serializer};
pub use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
};
pub use tch::{nn, nn::OptimizerConfig as _, Device, Kind, Tensor};
pub use tracing::{debug, error, info, warn};
