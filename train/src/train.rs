//! The training worker.

use crate::{
    common::*,
    config::{Config, ModelConfig, TrainingConfig},
    utils,
};

/// Run the training loop to completion.
///
/// The worker selects the device, prepares the run directories, iterates
/// shuffled batches minimizing the mean absolute error, and saves
/// checkpoints only after an epoch finishes successfully. Any error
/// aborts the loop without touching previously saved checkpoints.
pub fn training_worker(config: Arc<Config>) -> Result<()> {
    let Config {
        model: ModelConfig { base_channels },
        training:
            TrainingConfig {
                batch_size,
                epochs,
                learning_rate,
                momentum,
                save_checkpoint_epochs,
                ref load_checkpoint,
                device,
            },
        ..
    } = *config;

    let device = device.unwrap_or_else(Device::cuda_if_available);
    info!("use single device {:?}", device);

    // prepare run directories and save the config snapshot
    let start_time = Local::now();
    let run_dir = config
        .logging
        .dir
        .join(format!("{}", start_time.format(utils::FILE_STRFTIME)));
    let checkpoint_dir = run_dir.join("checkpoints");
    fs::create_dir_all(&run_dir)?;
    fs::create_dir_all(&checkpoint_dir)?;
    fs::write(
        run_dir.join("config.json5"),
        serde_json::to_string_pretty(&*config)?,
    )?;

    // load dataset
    info!("loading dataset");
    let dataset = ColorizationDataset::load(
        &config.dataset.manifest_file,
        Split::Train,
        DatasetOptions {
            image_size: config.dataset.image_size,
            input_mode: config.dataset.input_mode,
            device: Device::Cpu,
        },
    )?;
    info!(
        "loaded {} train records ({} skipped)",
        dataset.len(),
        dataset.skipped_records()
    );

    // init model
    info!("initializing model");
    let mut vs = nn::VarStore::new(device);
    let root = vs.root();
    let model = ColorUNetInit {
        in_c: config.dataset.input_mode.channels(),
        base_c: base_channels.get(),
        out_c: 3,
    }
    .build(&root / "model_state");

    let mut optimizer = nn::Adam {
        beta1: momentum,
        beta2: 0.999,
        wd: 0.0,
    }
    .build(&vs, learning_rate)?;

    utils::try_load_checkpoint(&mut vs, &config.logging.dir, load_checkpoint)?;

    // training loop
    info!("start training");
    let batch_size = batch_size.get();
    let mut rng = thread_rng();

    for epoch in 0..epochs.get() {
        let mut indices: Vec<_> = (0..dataset.len()).collect();
        indices.shuffle(&mut rng);

        let num_batches = (dataset.len() + batch_size - 1) / batch_size;
        let mut epoch_loss_sum = 0.0;

        for (step, chunk) in indices.chunks(batch_size).enumerate() {
            let (input, target) = make_batch(&dataset, chunk)?;
            let input = input.to_device(device);
            let target = target.to_device(device);

            let output = model.forward_t(&input, true)?;
            let loss = (output - target).abs().mean(Kind::Float);
            optimizer.backward_step(&loss);

            let loss_value = f64::from(&loss);
            epoch_loss_sum += loss_value;

            if step % 10 == 0 {
                info!(
                    "epoch: {}\tstep: {}/{}\tloss: {:.5}",
                    epoch, step, num_batches, loss_value
                );
            }
        }

        let epoch_loss = epoch_loss_sum / num_batches as f64;
        info!("epoch: {}\tmean loss: {:.5}", epoch, epoch_loss);

        let is_last = epoch + 1 == epochs.get();
        let at_interval = save_checkpoint_epochs
            .map(|interval| (epoch + 1) % interval.get() == 0)
            .unwrap_or(false);
        if is_last || at_interval {
            utils::save_checkpoint(&vs, &checkpoint_dir, epoch, epoch_loss)?;
        }
    }

    info!("training finished");
    Ok(())
}

/// Stack the samples at `indices` into one N×C×H×W input/target pair.
pub fn make_batch(dataset: &ColorizationDataset, indices: &[usize]) -> Result<(Tensor, Tensor)> {
    let pairs: Vec<TensorPair> = indices.iter().map(|&index| dataset.nth(index)).try_collect()?;
    let inputs: Vec<_> = pairs.iter().map(|pair| &pair.input).collect();
    let targets: Vec<_> = pairs.iter().map(|pair| &pair.target).collect();
    Ok((Tensor::stack(&inputs, 0), Tensor::stack(&targets, 0)))
}
