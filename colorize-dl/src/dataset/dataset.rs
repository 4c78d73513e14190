use super::{DatasetError, InputMode, Manifest, PairLoader, SampleRecord, Split, TensorPair};
use crate::common::*;

/// Options for [ColorizationDataset] construction.
#[derive(Debug, Clone)]
pub struct DatasetOptions {
    /// The square side length of preprocessed tensors.
    pub image_size: NonZeroUsize,
    /// Channel layout of the grayscale input.
    pub input_mode: InputMode,
    /// The device preprocessed tensors are placed on.
    pub device: Device,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            image_size: NonZeroUsize::new(512).unwrap(),
            input_mode: InputMode::L3,
            device: Device::Cpu,
        }
    }
}

/// A fixed-size, indexable collection of grayscale/color tensor pairs
/// for one manifest split.
///
/// Records whose referenced image files do not exist are dropped during
/// construction. The drop count is kept so callers can audit it.
#[derive(Debug)]
pub struct ColorizationDataset {
    records: Vec<SampleRecord>,
    loader: PairLoader,
    split: Split,
    skipped_records: usize,
}

impl ColorizationDataset {
    /// Load the given split of a manifest.
    pub fn load(
        manifest_file: impl AsRef<Path>,
        split: Split,
        options: DatasetOptions,
    ) -> Result<Self, DatasetError> {
        let manifest = Manifest::load(manifest_file)?;

        let mut skipped_records = 0;
        let records: Vec<_> = manifest
            .split_records(split)
            .filter(|record| {
                let usable = record.color_path.is_file()
                    && record
                        .gray_path
                        .as_deref()
                        .map_or(true, |gray_path| gray_path.is_file());
                if !usable {
                    skipped_records += 1;
                }
                usable
            })
            .cloned()
            .collect();

        if skipped_records > 0 {
            warn!(
                "skipped {} records with missing image files in split '{}'",
                skipped_records, split
            );
        }

        if records.is_empty() {
            return Err(DatasetError::EmptySplit(split));
        }

        let loader = PairLoader::new(options.image_size, options.input_mode, options.device);

        Ok(Self {
            records,
            loader,
            split,
            skipped_records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn split(&self) -> Split {
        self.split
    }

    /// The number of manifest records dropped for missing files.
    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    /// Load the preprocessed tensor pair at `index`.
    ///
    /// Horizontal flip augmentation applies to the train split only.
    pub fn nth(&self, index: usize) -> Result<TensorPair> {
        let record = self
            .records
            .get(index)
            .ok_or_else(|| format_err!("invalid index {}", index))?;
        self.loader.load_pair(record, self.split == Split::Train)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    struct Fixture {
        _dir: tempfile::TempDir,
        manifest_file: PathBuf,
    }

    fn make_fixture(rows: &[(&str, &str, &str)]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let image_dir = dir.path().join("images");
        fs::create_dir_all(&data_dir).unwrap();
        fs::create_dir_all(&image_dir).unwrap();

        let manifest_file = data_dir.join("manifest.csv");
        let mut file = fs::File::create(&manifest_file).unwrap();
        writeln!(file, "gray_path,color_path,split,height,width").unwrap();
        for (gray, color, split) in rows {
            writeln!(file, "{},{},{},512,512", gray, color, split).unwrap();
        }

        Fixture {
            _dir: dir,
            manifest_file,
        }
    }

    fn save_image(fixture: &Fixture, name: &str) {
        let root = fixture.manifest_file.parent().unwrap().parent().unwrap();
        let image = Tensor::rand(&[3, 24, 24], tch::kind::FLOAT_CPU) * 255.0;
        vision::image::save(&image.to_kind(Kind::Uint8), root.join(name)).unwrap();
    }

    fn small_options() -> DatasetOptions {
        DatasetOptions {
            image_size: NonZeroUsize::new(16).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn derives_gray_from_color_when_path_is_empty() {
        let fixture = make_fixture(&[("", "images/img001.png", "train")]);
        save_image(&fixture, "images/img001.png");

        let dataset =
            ColorizationDataset::load(&fixture.manifest_file, Split::Train, small_options())
                .unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.skipped_records(), 0);

        let pair = dataset.nth(0).unwrap();
        assert_eq!(pair.input.size(), vec![3, 16, 16]);
        assert_eq!(pair.target.size(), vec![3, 16, 16]);
        assert!(pair.source.ends_with("img001.png"));
    }

    #[test]
    fn skips_records_with_missing_files_and_counts_them() {
        let fixture = make_fixture(&[
            ("", "images/exists.png", "train"),
            ("", "images/missing.png", "train"),
            ("images/missing_gray.png", "images/exists.png", "train"),
        ]);
        save_image(&fixture, "images/exists.png");

        let dataset =
            ColorizationDataset::load(&fixture.manifest_file, Split::Train, small_options())
                .unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.skipped_records(), 2);
    }

    #[test]
    fn empty_split_is_an_error() {
        let fixture = make_fixture(&[("", "images/img001.png", "train")]);
        save_image(&fixture, "images/img001.png");

        let err = ColorizationDataset::load(&fixture.manifest_file, Split::Val, small_options())
            .unwrap_err();
        assert!(matches!(err, DatasetError::EmptySplit(Split::Val)));
    }

    #[test]
    fn split_with_only_missing_files_is_an_error() {
        let fixture = make_fixture(&[("", "images/missing.png", "val")]);

        let err = ColorizationDataset::load(&fixture.manifest_file, Split::Val, small_options())
            .unwrap_err();
        assert!(matches!(err, DatasetError::EmptySplit(Split::Val)));
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let fixture = make_fixture(&[("", "images/img001.png", "train")]);
        save_image(&fixture, "images/img001.png");

        let dataset =
            ColorizationDataset::load(&fixture.manifest_file, Split::Train, small_options())
                .unwrap();
        assert!(dataset.nth(1).is_err());
    }
}
