use std::fs;
use std::path::{Path, PathBuf};

use burn::prelude::*;
use burn::record::{CompactRecorder, Recorder};

use crate::config::EvalConfig;
use crate::error::EvalError;
use crate::model::DilatedNet;

const CHECKPOINT_EXTENSION: &str = "mpk";

/// A snapshot file plus the training step recovered from its name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    pub path: PathBuf,
    pub step: usize,
}

/// Recovers the training step from a `model-{step}.mpk` file name.
///
/// The parse is best-effort: anything that does not end in `-{number}`
/// yields step 0 rather than an error, so an oddly named snapshot still
/// loads.
pub fn parse_step(path: &Path) -> usize {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit('-').next())
        .and_then(|suffix| suffix.parse().ok())
        .unwrap_or(0)
}

/// Finds the snapshot with the highest step in `snapshot_dir`.
///
/// A missing or empty directory is not an error; it simply means there is
/// nothing to restore.
pub fn latest_checkpoint(snapshot_dir: &Path) -> Result<Option<Checkpoint>, EvalError> {
    if !snapshot_dir.is_dir() {
        return Ok(None);
    }

    let entries = fs::read_dir(snapshot_dir).map_err(|source| EvalError::Io {
        path: snapshot_dir.to_path_buf(),
        source,
    })?;

    let mut latest: Option<Checkpoint> = None;
    for entry in entries {
        let entry = entry.map_err(|source| EvalError::Io {
            path: snapshot_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(CHECKPOINT_EXTENSION) {
            continue;
        }

        let step = parse_step(&path);
        if latest.as_ref().is_none_or(|current| step > current.step) {
            latest = Some(Checkpoint { path, step });
        }
    }

    Ok(latest)
}

/// Loads trained weights from `checkpoint` into `model`.
pub fn restore<B: Backend>(
    model: DilatedNet<B>,
    checkpoint: &Checkpoint,
    device: &B::Device,
) -> Result<DilatedNet<B>, EvalError> {
    let record = CompactRecorder::new().load(checkpoint.path.clone(), device)?;
    Ok(model.load_record(record))
}

/// Restores the configured checkpoint, if there is one.
///
/// `restore_from` names an exact file and wins over the snapshot directory
/// scan. When neither turns up a snapshot the model keeps its fresh
/// initialization and the load step is reported as 0; the run continues,
/// its numbers just will not mean anything.
pub fn restore_latest<B: Backend>(
    model: DilatedNet<B>,
    config: &EvalConfig,
    device: &B::Device,
) -> Result<(DilatedNet<B>, usize), EvalError> {
    let checkpoint = match &config.restore_from {
        Some(path) => {
            let path = PathBuf::from(path);
            path.is_file().then(|| {
                let step = parse_step(&path);
                Checkpoint { path, step }
            })
        }
        None => latest_checkpoint(Path::new(&config.snapshot_dir))?,
    };

    match checkpoint {
        Some(checkpoint) => {
            let model = restore(model, &checkpoint, device)?;
            println!(
                "Restored model parameters from {}",
                checkpoint.path.display()
            );
            Ok((model, checkpoint.step))
        }
        None => {
            println!("No checkpoint file found.");
            Ok((model, 0))
        }
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use burn::module::Module;

    use crate::model::DilatedNetConfig;

    use super::*;

    type B = NdArray<f32>;

    #[test]
    fn parses_steps_from_snapshot_names() {
        assert_eq!(parse_step(Path::new("snapshots/model-1000.mpk")), 1000);
        assert_eq!(parse_step(Path::new("model-0.mpk")), 0);
        // Malformed names fall back to 0 instead of failing.
        assert_eq!(parse_step(Path::new("model.mpk")), 0);
        assert_eq!(parse_step(Path::new("model-final.mpk")), 0);
    }

    #[test]
    fn missing_or_empty_directory_yields_none() {
        assert_eq!(latest_checkpoint(Path::new("does/not/exist")).unwrap(), None);

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(latest_checkpoint(dir.path()).unwrap(), None);
    }

    #[test]
    fn picks_the_highest_step() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["model-10.mpk", "model-200.mpk", "model-30.mpk", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let checkpoint = latest_checkpoint(dir.path()).unwrap().unwrap();
        assert_eq!(checkpoint.step, 200);
        assert_eq!(checkpoint.path, dir.path().join("model-200.mpk"));
    }

    #[test]
    fn snapshot_round_trips_through_the_recorder() {
        let device = Default::default();
        let dir = tempfile::tempdir().unwrap();

        let model = DilatedNetConfig::new()
            .with_num_classes(3)
            .with_base_channels(4)
            .init::<B>(&device);
        CompactRecorder::new()
            .record(model.clone().into_record(), dir.path().join("model-250"))
            .unwrap();

        let checkpoint = latest_checkpoint(dir.path()).unwrap().unwrap();
        assert_eq!(checkpoint.step, 250);

        let fresh = DilatedNetConfig::new()
            .with_num_classes(3)
            .with_base_channels(4)
            .init::<B>(&device);
        let restored = restore(fresh, &checkpoint, &device).unwrap();
        assert_eq!(restored.num_classes(), 3);
    }

    #[test]
    fn empty_snapshot_dir_keeps_fresh_weights_and_step_zero() {
        let device = Default::default();
        let dir = tempfile::tempdir().unwrap();
        let config = EvalConfig::new(
            String::new(),
            String::new(),
            dir.path().display().to_string(),
            String::new(),
        );

        let model = DilatedNetConfig::new()
            .with_num_classes(3)
            .with_base_channels(4)
            .init::<B>(&device);
        let (_model, step) = restore_latest(model, &config, &device).unwrap();
        assert_eq!(step, 0);
    }
}
