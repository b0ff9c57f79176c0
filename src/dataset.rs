use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::JoinHandle;

use burn::prelude::*;
use derive_new::new;

use crate::error::EvalError;

/// Per-channel means the network was trained with, in B, G, R order.
pub const IMG_MEAN: [f32; 3] = [104.006_99, 116.668_77, 122.678_91];

/// How many loaded samples the prefetch thread may run ahead.
const PREFETCH_CAPACITY: usize = 8;

#[derive(Clone, Debug, new)]
pub struct SamplePaths {
    pub image: PathBuf,
    pub label: PathBuf,
}

/// One decoded image/label pair, ready for tensor conversion.
pub struct EvalSample {
    /// Mean-subtracted floats, channel-first, channels in B, G, R order.
    pub image: Vec<f32>,
    /// Row-major ground-truth class ids.
    pub labels: Vec<u32>,
    pub width: u32,
    pub height: u32,
}

/// Parses a two-column list file into image/label path pairs.
///
/// Each non-blank line names an image and its label map, separated by
/// whitespace. Entries are resolved against `data_dir`; a leading `/` on an
/// entry is treated as list-relative, not absolute, which is how these list
/// files are conventionally written.
pub fn read_data_list(data_dir: &Path, data_list: &Path) -> Result<Vec<SamplePaths>, EvalError> {
    let content = fs::read_to_string(data_list).map_err(|source| EvalError::Io {
        path: data_list.to_path_buf(),
        source,
    })?;

    let mut samples = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next(), fields.next()) {
            (Some(image), Some(label), None) => {
                samples.push(SamplePaths::new(resolve(data_dir, image), resolve(data_dir, label)));
            }
            _ => {
                return Err(EvalError::MalformedListLine {
                    path: data_list.to_path_buf(),
                    line: index + 1,
                    content: line.to_string(),
                });
            }
        }
    }

    if samples.is_empty() {
        return Err(EvalError::EmptyList {
            path: data_list.to_path_buf(),
        });
    }

    Ok(samples)
}

fn resolve(data_dir: &Path, entry: &str) -> PathBuf {
    data_dir.join(entry.trim_start_matches('/'))
}

/// Decodes one image/label pair from disk.
///
/// The image becomes mean-subtracted BGR floats; the label map is read as
/// 8-bit grayscale, one class id per pixel. Both must agree on dimensions.
pub fn load_sample(paths: &SamplePaths) -> Result<EvalSample, EvalError> {
    let image = image::open(&paths.image)
        .map_err(|source| EvalError::Image {
            path: paths.image.clone(),
            source,
        })?
        .to_rgb8();
    let labels = image::open(&paths.label)
        .map_err(|source| EvalError::Image {
            path: paths.label.clone(),
            source,
        })?
        .to_luma8();

    let (width, height) = image.dimensions();
    if labels.dimensions() != (width, height) {
        return Err(EvalError::SizeMismatch {
            image: paths.image.clone(),
            image_width: width,
            image_height: height,
            label_width: labels.dimensions().0,
            label_height: labels.dimensions().1,
        });
    }

    let pixels = (width * height) as usize;
    let mut data = Vec::with_capacity(3 * pixels);
    for (channel, &mean) in IMG_MEAN.iter().enumerate() {
        // Channel-first planes; BGR order matches the training-time input.
        let rgb_index = 2 - channel;
        for pixel in image.pixels() {
            data.push(pixel.0[rgb_index] as f32 - mean);
        }
    }

    Ok(EvalSample {
        image: data,
        labels: labels.pixels().map(|pixel| u32::from(pixel.0[0])).collect(),
        width,
        height,
    })
}

/// Builds the `[1, 3, height, width]` input batch for one sample.
pub fn to_tensor<B: Backend>(sample: &EvalSample, device: &B::Device) -> Tensor<B, 4> {
    let shape = Shape::new([1, 3, sample.height as usize, sample.width as usize]);
    Tensor::from_data(
        TensorData::new(sample.image.clone(), shape).convert::<B::FloatElem>(),
        device,
    )
}

/// Sequential reader that decodes samples on a background thread.
///
/// The worker pushes decoded samples (or the error that stopped it) into a
/// bounded channel; the evaluation thread pulls them in list order. When the
/// list runs out the channel closes and `next_sample` reports exhaustion.
/// `shutdown` raises the stop flag, drains whatever was prefetched, and joins
/// the worker before returning.
pub struct PrefetchReader {
    receiver: Receiver<Result<EvalSample, EvalError>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl PrefetchReader {
    pub fn spawn(samples: Vec<SamplePaths>) -> Self {
        let (sender, receiver) = sync_channel(PREFETCH_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);

        let worker = std::thread::spawn(move || {
            prefetch_loop(&samples, &sender, &worker_stop);
        });

        Self {
            receiver,
            stop,
            worker: Some(worker),
        }
    }

    /// Next sample in list order. `step` only feeds the exhaustion error.
    pub fn next_sample(&mut self, step: usize) -> Result<EvalSample, EvalError> {
        match self.receiver.recv() {
            Ok(sample) => sample,
            Err(_) => Err(EvalError::Exhausted { step }),
        }
    }

    /// Stops the worker and waits for it to exit.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // Unblock a worker waiting on a full queue.
        while self.receiver.try_recv().is_ok() {}
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for PrefetchReader {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn prefetch_loop(
    samples: &[SamplePaths],
    sender: &SyncSender<Result<EvalSample, EvalError>>,
    stop: &AtomicBool,
) {
    for paths in samples {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        if sender.send(load_sample(paths)).is_err() {
            break;
        }
    }
}
