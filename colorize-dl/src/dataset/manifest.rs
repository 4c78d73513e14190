use crate::common::*;

/// Columns that must be present in the manifest header.
pub const REQUIRED_COLUMNS: &[&str] = &["gray_path", "color_path", "split"];

/// Errors raised while constructing a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("manifest file '{}' does not exist", .0.display())]
    ManifestNotFound(PathBuf),
    #[error("manifest is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("malformed manifest: {0}")]
    Csv(#[from] csv::Error),
    #[error("no valid records for split '{0}'")]
    EmptySplit(Split),
}

/// The dataset partition a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Val => "val",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let split = match text {
            "train" => Self::Train,
            "val" => Self::Val,
            "test" => Self::Test,
            _ => bail!("unknown split '{}'", text),
        };
        Ok(split)
    }
}

/// One grayscale/color sample pair described by the manifest.
///
/// `gray_path` is optional. When it is absent, the grayscale input is
/// derived from the color target at load time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleRecord {
    pub gray_path: Option<PathBuf>,
    pub color_path: PathBuf,
    pub split: Split,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawRow {
    gray_path: String,
    color_path: String,
    split: Split,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    width: Option<u32>,
}

/// The parsed manifest file.
#[derive(Debug, Clone)]
pub struct Manifest {
    records: Vec<SampleRecord>,
}

impl Manifest {
    /// Parse a manifest CSV file.
    ///
    /// Relative paths in the file are resolved against the grandparent
    /// directory of the manifest, matching the `<root>/data/manifest.csv`
    /// layout the manifest generator produces.
    pub fn load(manifest_file: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let manifest_file = manifest_file.as_ref();
        if !manifest_file.is_file() {
            return Err(DatasetError::ManifestNotFound(manifest_file.to_owned()));
        }
        let root_dir = manifest_file
            .parent()
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new("."))
            .to_owned();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .comment(Some(b'#'))
            .from_path(manifest_file)?;

        {
            let headers: HashSet<_> = reader.headers()?.iter().collect();
            let missing: Vec<_> = REQUIRED_COLUMNS
                .iter()
                .filter(|column| !headers.contains(**column))
                .map(|column| column.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(DatasetError::MissingColumns(missing));
            }
        }

        let records: Vec<_> = reader
            .deserialize()
            .map(|row| -> Result<_, DatasetError> {
                let RawRow {
                    gray_path,
                    color_path,
                    split,
                    height,
                    width,
                } = row?;

                let gray_path = if gray_path.is_empty() {
                    None
                } else {
                    Some(root_dir.join(gray_path))
                };

                Ok(SampleRecord {
                    gray_path,
                    color_path: root_dir.join(color_path),
                    split,
                    height,
                    width,
                })
            })
            .try_collect()?;

        Ok(Self { records })
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    /// Iterate over records belonging to the given split.
    pub fn split_records(&self, split: Split) -> impl Iterator<Item = &SampleRecord> {
        self.records
            .iter()
            .filter(move |record| record.split == split)
    }
}
