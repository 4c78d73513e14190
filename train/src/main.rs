use anyhow::{Context, Result};
use std::{env, path::PathBuf, sync::Arc};
use structopt::StructOpt;
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};
use train::config::Config;

#[derive(Debug, Clone, StructOpt)]
/// Train and evaluate the colorization model
enum Args {
    /// Run the training loop
    Train {
        #[structopt(long, default_value = "train.json5")]
        /// configuration file
        config_file: PathBuf,
    },
    /// Evaluate a checkpoint on the validation split
    Eval {
        #[structopt(long, default_value = "train.json5")]
        /// configuration file
        config_file: PathBuf,
        #[structopt(long)]
        /// checkpoint file, defaults to the config loading method
        checkpoint_file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // setup tracing
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).compact();
    let filter_layer = {
        let filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            filter.add_directive(LevelFilter::INFO.into())
        } else {
            filter
        }
    };
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    match Args::from_args() {
        Args::Train { config_file } => {
            let config = Arc::new(Config::open(&config_file).with_context(|| {
                format!("failed to load config file '{}'", config_file.display())
            })?);
            train::train::training_worker(config)?;
        }
        Args::Eval {
            config_file,
            checkpoint_file,
        } => {
            let config = Arc::new(Config::open(&config_file).with_context(|| {
                format!("failed to load config file '{}'", config_file.display())
            })?);
            train::eval::evaluation_worker(config, checkpoint_file)?;
        }
    }

    Ok(())
}
