use std::fs;
use std::path::Path;

use burn::prelude::*;

use crate::config::EvalConfig;
use crate::dataset::{self, PrefetchReader};
use crate::error::EvalError;
use crate::metrics::StreamingMeanIou;
use crate::model::DilatedNet;
use crate::{palette, postprocess};

/// Runs `num_steps` of inference, accumulating streaming mIoU.
///
/// Each step pulls the next sample from the reader, runs the forward pass,
/// upsamples and argmaxes the logits, and folds the result into the metric.
/// With `save_masks` set, every prediction is also decoded to color and
/// written as `mask{step}.png` under `save_dir`. Progress is printed every
/// ten steps; any step failure aborts the run. The reader is shut down
/// before returning so no prefetch thread outlives the loop.
pub fn run<B: Backend>(
    config: &EvalConfig,
    model: &DilatedNet<B>,
    mut reader: PrefetchReader,
    device: &B::Device,
) -> Result<f64, EvalError> {
    let mut metric = StreamingMeanIou::new(config.num_classes);

    let save_dir = Path::new(&config.save_dir);
    if config.save_masks && !save_dir.exists() {
        fs::create_dir_all(save_dir).map_err(|source| EvalError::Io {
            path: save_dir.to_path_buf(),
            source,
        })?;
    }

    for step in 0..config.num_steps {
        let sample = reader.next_sample(step)?;

        let images = dataset::to_tensor::<B>(&sample, device);
        let logits = model.forward(images);
        let predictions = postprocess::predict_labels(
            logits,
            [sample.height as usize, sample.width as usize],
        )?;

        metric.update(&predictions, &sample.labels)?;

        if config.save_masks {
            let path = save_dir.join(format!("mask{step}.png"));
            palette::save_mask(&predictions, sample.width, sample.height, &path)?;
        }

        if step % 10 == 0 {
            println!("step {step} mIoU: {}", metric.value());
        }
    }

    reader.shutdown();

    Ok(metric.value())
}
