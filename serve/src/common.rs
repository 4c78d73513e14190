//! Common imports from external crates.

pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use serde::{Deserialize, Serialize};
pub use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
pub use tch::{vision, CModule, Device, Kind, Tensor};
pub use tracing::{debug, error, info, warn};
