use anyhow::Result;
use serve::{
    colorizer::{Colorizer, ColorizerOptions},
    routes,
    state::{AppState, SharedState, Storage},
};
use std::{env, path::PathBuf, sync::Arc};
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

#[derive(Debug, Clone, StructOpt)]
/// Serve the colorization HTTP API
struct Args {
    #[structopt(long, default_value = "0.0.0.0")]
    /// address to bind to
    host: String,
    #[structopt(long, default_value = "8000")]
    /// port to listen on
    port: u16,
    #[structopt(long, default_value = "storage")]
    /// directory for uploads and processed outputs
    storage_dir: PathBuf,
    #[structopt(long, default_value = "models/colorize_gen.pt")]
    /// TorchScript colorization model file
    model_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
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

    let Args {
        host,
        port,
        storage_dir,
        model_file,
    } = Args::from_args();

    let storage = Storage::new(&storage_dir);
    storage.ensure_dirs()?;

    // the colorizer is owned here and handed to handlers by reference
    let colorizer = Colorizer::new(ColorizerOptions::from_env(model_file), &storage);
    let state: SharedState = Arc::new(AppState { colorizer, storage });
    let app = routes::build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
