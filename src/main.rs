use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use seg_eval::{
    EvalConfig,
    checkpoint,
    dataset::{self, PrefetchReader},
    eval,
    model::DilatedNetConfig,
};

#[cfg(feature = "wgpu")]
type EvalBackend = burn::backend::Wgpu<f32, i32>;
#[cfg(not(feature = "wgpu"))]
type EvalBackend = burn::backend::NdArray<f32>;

#[derive(Parser, Debug)]
#[command(
    name = "seg-eval",
    version = seg_eval::VERSION,
    about = "Evaluate a semantic-segmentation checkpoint with streaming mIoU"
)]
struct Args {
    /// Directory containing the dataset images and label maps.
    #[arg(long)]
    data_dir: PathBuf,

    /// List file naming one image and one label map per line.
    #[arg(long)]
    data_list: PathBuf,

    /// Ground-truth value marking pixels excluded from the metric.
    #[arg(long, default_value_t = 255)]
    ignore_label: usize,

    /// Number of classes to predict (including background).
    #[arg(long, default_value_t = 19)]
    num_classes: usize,

    /// Number of images to evaluate.
    #[arg(long, default_value_t = 500)]
    num_steps: usize,

    /// Explicit checkpoint file; skips the snapshot directory scan.
    #[arg(long)]
    restore_from: Option<PathBuf>,

    /// Directory scanned for the latest model-{step}.mpk snapshot.
    #[arg(long, default_value = "snapshots")]
    snapshot_dir: PathBuf,

    /// Where decoded masks are written when --save-masks is set.
    #[arg(long, default_value = "output")]
    save_dir: PathBuf,

    /// Write a decoded color mask per evaluated image.
    #[arg(long)]
    save_masks: bool,

    /// Channel width of the model's first stage.
    #[arg(long, default_value_t = 64)]
    base_channels: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = EvalConfig::new(
        args.data_dir.display().to_string(),
        args.data_list.display().to_string(),
        args.snapshot_dir.display().to_string(),
        args.save_dir.display().to_string(),
    )
    .with_ignore_label(args.ignore_label)
    .with_num_classes(args.num_classes)
    .with_num_steps(args.num_steps)
    .with_save_masks(args.save_masks);
    if let Some(restore_from) = &args.restore_from {
        config = config.with_restore_from(Some(restore_from.display().to_string()));
    }

    let device = Default::default();

    let samples = dataset::read_data_list(
        Path::new(&config.data_dir),
        Path::new(&config.data_list),
    )?;

    let model = DilatedNetConfig::new()
        .with_num_classes(config.num_classes)
        .with_base_channels(args.base_channels)
        .init::<EvalBackend>(&device);
    let (model, load_step) = checkpoint::restore_latest(model, &config, &device)?;
    println!(
        "Evaluating {} of {} listed images (load step {load_step})",
        config.num_steps,
        samples.len()
    );

    let reader = PrefetchReader::spawn(samples);
    let mean_iou = eval::run(&config, &model, reader, &device)?;

    println!("mIoU over {} steps: {mean_iou}", config.num_steps);
    Ok(())
}
