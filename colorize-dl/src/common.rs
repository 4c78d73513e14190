//! Common imports from external crates.

pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use itertools::Itertools as _;
pub use rand::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{
    borrow::Borrow,
    collections::HashSet,
    fmt,
    fmt::Debug,
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    str::FromStr,
};
pub use tch::{nn, nn::ModuleT as _, vision, Device, IndexOp, Kind, Tensor};
pub use tracing::{debug, error, info, warn};
