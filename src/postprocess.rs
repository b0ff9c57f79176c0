use burn::prelude::*;
use burn::tensor::module::interpolate;
use burn::tensor::ops::{InterpolateMode, InterpolateOptions};

use crate::error::EvalError;

/// Resolves `[batch=1, classes, h', w']` logits into a flat label map at the
/// requested `[height, width]`.
///
/// Logits are bilinearly upsampled to the input resolution first, then each
/// pixel takes the class with the highest score (ties go to the lowest
/// index, the usual argmax convention).
pub fn predict_labels<B: Backend>(
    logits: Tensor<B, 4>,
    size: [usize; 2],
) -> Result<Vec<u32>, EvalError> {
    let upsampled = interpolate(
        logits,
        size,
        InterpolateOptions::new(InterpolateMode::Bilinear),
    );
    let predictions = upsampled.argmax(1);

    let flat: Vec<i64> = predictions
        .into_data()
        .convert::<i64>()
        .to_vec()
        .map_err(|err| EvalError::Readback(format!("{err:?}")))?;

    Ok(flat.into_iter().map(|class| class as u32).collect())
}
