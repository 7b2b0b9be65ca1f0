use std::error::Error;

use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    data::dataloader::batcher::Batcher,
    module::Module,
    tensor::Tensor,
};
use wide_resnet::{
    data::{ImageBatcher, ImageDataset},
    logging::init_logging,
    training::{lr_schedule, save_checkpoint, LearningRateScheduler},
    WideResNetConfig,
};

type TrainBackend = Autodiff<NdArray<f32>>;
type InferBackend = NdArray<f32>;

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    let mode = args.get(1).map(|s| s.as_str()).unwrap_or("summary");

    let config = match args.iter().position(|arg| arg == "--config") {
        Some(i) => {
            let path = args.get(i + 1).ok_or("--config expects a path")?;
            WideResNetConfig::load(path)?
        }
        None => WideResNetConfig::demo(),
    };

    println!("=== {} ===\n", config.name());
    let device = NdArrayDevice::default();

    match mode {
        "schedule" => print_schedule(),
        "step" => run_step(&config, &device)?,
        "save" => {
            let dir = args
                .get(2)
                .filter(|arg| !arg.starts_with("--"))
                .map(|s| s.as_str())
                .unwrap_or("checkpoints");
            let model = config.init::<InferBackend>(&device)?;
            let path = save_checkpoint(&model, &config, dir)?;
            println!("Saved untrained weights to {}", path.display());
        }
        _ => summary(&config, &device)?,
    }

    Ok(())
}

fn summary(config: &WideResNetConfig, device: &NdArrayDevice) -> Result<(), Box<dyn Error>> {
    let model = config.init::<InferBackend>(device)?;

    for line in model.describe() {
        println!("  {line}");
    }
    println!("\nParameters: {}", model.num_params());

    let [d0, d1, d2] = config.input_dim;
    let dummy = Tensor::<InferBackend, 4>::zeros([2, d0, d1, d2], device);
    let probabilities = model.forward(dummy);
    let [batch, classes] = probabilities.dims();
    println!("Forward pass OK! Output: [{batch}, {classes}]");

    println!("\nRun `cargo run -- step` to compile and take one SGD step.");
    println!("Run `cargo run -- schedule` to print the learning-rate schedule.");
    Ok(())
}

fn print_schedule() {
    println!("{:>6} | {:>8}", "epoch", "lr");
    for epoch in [0, 59, 60, 119, 120, 159, 160, 200] {
        println!("{:>6} | {:>8}", epoch, lr_schedule(epoch));
    }
}

fn run_step(config: &WideResNetConfig, device: &NdArrayDevice) -> Result<(), Box<dyn Error>> {
    let mut compiled = config.compile::<TrainBackend>(device)?;
    let scheduler = LearningRateScheduler::default();

    let dataset = ImageDataset::synthetic_for(config, 8);
    let train_batch =
        ImageBatcher::<TrainBackend>::new(config.input_dim).batch(dataset.items.clone(), device);
    let eval_batch =
        ImageBatcher::<InferBackend>::new(config.input_dim).batch(dataset.items, device);

    let lr = scheduler.on_epoch_begin(0, &mut compiled);
    let train = compiled.train_step(train_batch);
    println!(
        "Train step | lr {} | loss {:.4} | acc {:.2}%",
        lr,
        train.loss,
        train.accuracy() * 100.0
    );

    let eval = compiled.evaluate(eval_batch);
    println!(
        "Evaluate   | loss {:.4} | acc {:.2}%",
        eval.loss,
        eval.accuracy() * 100.0
    );
    Ok(())
}
