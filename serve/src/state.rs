//! Shared server state.

use crate::{colorizer::Colorizer, common::*};

/// Upload and output directories of the service.
#[derive(Debug, Clone)]
pub struct Storage {
    pub uploads_dir: PathBuf,
    pub processed_dir: PathBuf,
}

impl Storage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            uploads_dir: root.join("uploads"),
            processed_dir: root.join("processed"),
        }
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.uploads_dir)?;
        fs::create_dir_all(&self.processed_dir)?;
        Ok(())
    }
}

/// State handed to request handlers. The colorizer is constructed once
/// by the composition root and only read afterwards.
pub struct AppState {
    pub colorizer: Colorizer,
    pub storage: Storage,
}

pub type SharedState = Arc<AppState>;
