use crate::{common::*, config::LoadCheckpoint};
use regex::Regex;

pub const FILE_STRFTIME: &str = "%Y-%m-%d-%H-%M-%S.%3f%z";

/// Save parameters to a checkpoint file.
pub fn save_checkpoint(
    vs: &nn::VarStore,
    checkpoint_dir: &Path,
    epoch: usize,
    loss: f64,
) -> Result<PathBuf> {
    let filename = format!(
        "{}_{:04}_{:08.5}.ckpt",
        Local::now().format(FILE_STRFTIME),
        epoch,
        loss
    );
    let path = checkpoint_dir.join(filename);
    vs.save(&path)?;
    info!("saved checkpoint file {}", path.display());
    Ok(path)
}

/// Load parameters from a directory with specified checkpoint loading method.
pub fn try_load_checkpoint(
    vs: &mut nn::VarStore,
    logging_dir: &Path,
    load_checkpoint: &LoadCheckpoint,
) -> Result<bool> {
    let path = match load_checkpoint {
        LoadCheckpoint::Disabled => {
            info!("checkpoint loading is disabled");
            None
        }
        LoadCheckpoint::FromRecent => recent_checkpoint_file(logging_dir)?,
        LoadCheckpoint::FromFile { file } => {
            if file.is_file() {
                Some(file.to_owned())
            } else {
                warn!("{} is not a file", file.display());
                None
            }
        }
    };

    match path {
        Some(path) => {
            info!("load checkpoint file {}", path.display());
            vs.load_partial(path)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Find the newest checkpoint file under any run directory of `logging_dir`.
pub fn recent_checkpoint_file(logging_dir: &Path) -> Result<Option<PathBuf>> {
    let checkpoint_filename_regex =
        Regex::new(r"^(\d{4}-\d{2}-\d{2}-\d{2}-\d{2}-\d{2}\.\d{3}[+-]\d{4})_\d{4}_\d+\.\d+\.ckpt$")
            .unwrap();

    let paths: Vec<PathBuf> =
        glob::glob(&format!("{}/*/checkpoints/*.ckpt", logging_dir.display()))
            .unwrap()
            .try_collect()?;
    let checkpoint_file = paths
        .into_iter()
        .filter_map(|path| {
            let file_name = path.file_name()?.to_str()?;
            let captures = checkpoint_filename_regex.captures(file_name)?;
            let datetime_str = captures.get(1)?.as_str();
            let datetime = DateTime::parse_from_str(datetime_str, FILE_STRFTIME).ok()?;
            Some((path, datetime))
        })
        .max_by_key(|(_path, datetime)| *datetime)
        .map(|(path, _datetime)| path);

    if checkpoint_file.is_none() {
        warn!("no checkpoint file found");
    }

    Ok(checkpoint_file)
}
