use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{path}:{line}: expected `<image> <label>`, got `{content}`")]
    MalformedListLine {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("data list {path} contains no entries")]
    EmptyList { path: PathBuf },

    #[error("image {image} is {image_width}x{image_height} but its label map is {label_width}x{label_height}")]
    SizeMismatch {
        image: PathBuf,
        image_width: u32,
        image_height: u32,
        label_width: u32,
        label_height: u32,
    },

    #[error("input exhausted at step {step}: the data list holds fewer samples than --num-steps")]
    Exhausted { step: usize },

    #[error("prediction has {predictions} pixels but target has {targets}")]
    LengthMismatch { predictions: usize, targets: usize },

    #[error("predicted class {class} out of range for {num_classes} classes")]
    ClassOutOfRange { class: u32, num_classes: usize },

    #[error("failed to restore checkpoint: {0}")]
    Record(#[from] burn::record::RecorderError),

    #[error("tensor readback failed: {0}")]
    Readback(String),

    #[error("failed to write mask {path}: {source}")]
    MaskWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
