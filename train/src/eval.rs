//! The evaluation worker.

use crate::{
    common::*,
    config::{Config, LoadCheckpoint},
    train::make_batch,
    utils,
};

/// PSNR/SSIM means over a validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport {
    pub num_samples: usize,
    pub mean_psnr: f64,
    pub mean_ssim: f64,
}

/// Evaluate a checkpoint on the `val` split.
///
/// Fails fast when the checkpoint or the manifest is absent; no partial
/// result is reported.
pub fn evaluation_worker(
    config: Arc<Config>,
    checkpoint_file: Option<PathBuf>,
) -> Result<EvalReport> {
    let device = config
        .training
        .device
        .unwrap_or_else(Device::cuda_if_available);

    // resolve the checkpoint before any heavier work
    let checkpoint_file = match checkpoint_file {
        Some(file) => {
            ensure!(
                file.is_file(),
                "checkpoint file '{}' does not exist",
                file.display()
            );
            file
        }
        None => match &config.training.load_checkpoint {
            LoadCheckpoint::FromFile { file } => {
                ensure!(
                    file.is_file(),
                    "checkpoint file '{}' does not exist",
                    file.display()
                );
                file.clone()
            }
            _ => utils::recent_checkpoint_file(&config.logging.dir)?
                .ok_or_else(|| format_err!("no checkpoint file found to evaluate"))?,
        },
    };

    info!("loading dataset");
    let dataset = ColorizationDataset::load(
        &config.dataset.manifest_file,
        Split::Val,
        DatasetOptions {
            image_size: config.dataset.image_size,
            input_mode: config.dataset.input_mode,
            device: Device::Cpu,
        },
    )
    .with_context(|| {
        format!(
            "failed to load manifest '{}'",
            config.dataset.manifest_file.display()
        )
    })?;
    info!(
        "loaded {} val records ({} skipped)",
        dataset.len(),
        dataset.skipped_records()
    );

    let mut vs = nn::VarStore::new(device);
    let model = ColorUNetInit {
        in_c: config.dataset.input_mode.channels(),
        base_c: config.model.base_channels.get(),
        out_c: 3,
    }
    .build(&vs.root() / "model_state");

    info!("load checkpoint file {}", checkpoint_file.display());
    vs.load(&checkpoint_file)
        .with_context(|| format!("failed to load checkpoint '{}'", checkpoint_file.display()))?;

    let ssim = SsimInit::default().build()?;
    let batch_size = config.training.batch_size.get();
    let indices: Vec<_> = (0..dataset.len()).collect();

    let mut psnr_sum = 0.0;
    let mut ssim_sum = 0.0;
    let mut num_batches = 0;

    for chunk in indices.chunks(batch_size) {
        let (batch_psnr, batch_ssim) = tch::no_grad(|| -> Result<_> {
            let (input, target) = make_batch(&dataset, chunk)?;
            let input = input.to_device(device);
            let target = target.to_device(device);

            let output = model.forward_t(&input, false)?;
            Ok((psnr(&output, &target)?, ssim.forward(&output, &target)?))
        })?;

        psnr_sum += batch_psnr;
        ssim_sum += batch_ssim;
        num_batches += 1;

        info!(
            "batch: {}\tpsnr: {:.3}\tssim: {:.4}\trunning psnr: {:.3}\trunning ssim: {:.4}",
            num_batches,
            batch_psnr,
            batch_ssim,
            psnr_sum / num_batches as f64,
            ssim_sum / num_batches as f64,
        );
    }

    let report = EvalReport {
        num_samples: dataset.len(),
        mean_psnr: psnr_sum / num_batches as f64,
        mean_ssim: ssim_sum / num_batches as f64,
    };
    info!(
        "evaluated {} samples\tmean psnr: {:.3}\tmean ssim: {:.4}",
        report.num_samples, report.mean_psnr, report.mean_ssim
    );

    Ok(report)
}
