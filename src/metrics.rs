use crate::error::EvalError;

/// Streaming mean Intersection-over-Union backed by a confusion matrix.
///
/// The matrix is `num_classes x num_classes`, row-major, indexed
/// `[target][prediction]`. Pixels whose target is outside the class range
/// (the ignore/boundary label) never touch the matrix. `value` can be read
/// at any point without disturbing accumulation.
pub struct StreamingMeanIou {
    num_classes: usize,
    confusion: Vec<u64>,
}

impl StreamingMeanIou {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            confusion: vec![0; num_classes * num_classes],
        }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Row-major `[target][prediction]` counts.
    pub fn confusion(&self) -> &[u64] {
        &self.confusion
    }

    /// Folds one image worth of pixels into the matrix.
    ///
    /// `predictions` and `targets` are parallel flattened label maps. Targets
    /// at or above `num_classes` are skipped; predictions out of range are an
    /// error since the post-processor can only emit valid class indices.
    pub fn update(&mut self, predictions: &[u32], targets: &[u32]) -> Result<(), EvalError> {
        if predictions.len() != targets.len() {
            return Err(EvalError::LengthMismatch {
                predictions: predictions.len(),
                targets: targets.len(),
            });
        }

        for (&prediction, &target) in predictions.iter().zip(targets.iter()) {
            let target = target as usize;
            if target >= self.num_classes {
                continue;
            }
            if prediction as usize >= self.num_classes {
                return Err(EvalError::ClassOutOfRange {
                    class: prediction,
                    num_classes: self.num_classes,
                });
            }
            self.confusion[target * self.num_classes + prediction as usize] += 1;
        }

        Ok(())
    }

    /// Mean IoU over classes with nonzero union.
    ///
    /// Classes absent from both predictions and targets are excluded from the
    /// average rather than counted as zero. Returns 0.0 when no class has any
    /// pixels yet.
    pub fn value(&self) -> f64 {
        let n = self.num_classes;
        let mut total = 0.0;
        let mut counted = 0;

        for class in 0..n {
            let intersection = self.confusion[class * n + class];
            let row: u64 = self.confusion[class * n..(class + 1) * n].iter().sum();
            let col: u64 = (0..n).map(|target| self.confusion[target * n + class]).sum();
            let union = row + col - intersection;

            if union > 0 {
                total += intersection as f64 / union as f64;
                counted += 1;
            }
        }

        if counted > 0 { total / counted as f64 } else { 0.0 }
    }

    pub fn reset(&mut self) {
        self.confusion.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_agreement_scores_one() {
        let mut metric = StreamingMeanIou::new(3);
        let labels = vec![0, 1, 2, 0, 1, 2];
        metric.update(&labels, &labels).unwrap();
        assert_eq!(metric.value(), 1.0);
    }

    #[test]
    fn total_disagreement_scores_zero() {
        let mut metric = StreamingMeanIou::new(3);
        metric.update(&[1, 2, 0], &[0, 1, 2]).unwrap();
        assert_eq!(metric.value(), 0.0);
    }

    #[test]
    fn ignored_targets_leave_state_untouched() {
        let mut metric = StreamingMeanIou::new(3);
        metric.update(&[0, 1], &[0, 1]).unwrap();
        let before = metric.confusion().to_vec();
        let value_before = metric.value();

        // Targets 3 and 255 both sit outside the class range.
        metric.update(&[0, 2], &[3, 255]).unwrap();
        assert_eq!(metric.confusion(), before.as_slice());
        assert_eq!(metric.value(), value_before);
    }

    #[test]
    fn value_is_idempotent() {
        let mut metric = StreamingMeanIou::new(2);
        metric.update(&[0, 1, 1], &[0, 0, 1]).unwrap();
        let first = metric.value();
        let second = metric.value();
        assert_eq!(first, second);

        // And accumulation keeps building on the same state afterwards.
        metric.update(&[0], &[0]).unwrap();
        assert!(metric.value() > first);
    }

    #[test]
    fn single_mismatch_two_by_two() {
        // pred [[0,1],[2,0]] vs gt [[0,1],[2,1]]: one pixel of class 1
        // predicted as 0. Class 0 picks up a false positive, class 1 a
        // false negative, class 2 is clean: IoUs {1/2, 1/2, 1/1}.
        let mut metric = StreamingMeanIou::new(3);
        metric.update(&[0, 1, 2, 0], &[0, 1, 2, 1]).unwrap();

        let diagonal: u64 = (0..3).map(|c| metric.confusion()[c * 3 + c]).sum();
        assert_eq!(diagonal, 3);
        assert_eq!(metric.confusion()[1 * 3 + 0], 1);

        // {1/2, 1/2, 1/1} averages to 2/3.
        assert!((metric.value() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn zero_union_classes_are_excluded() {
        let mut metric = StreamingMeanIou::new(19);
        metric.update(&[0, 0], &[0, 0]).unwrap();
        // 18 classes never appear; only class 0 counts.
        assert_eq!(metric.value(), 1.0);
    }

    #[test]
    fn empty_accumulator_reports_zero() {
        let metric = StreamingMeanIou::new(5);
        assert_eq!(metric.value(), 0.0);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let mut metric = StreamingMeanIou::new(2);
        let result = metric.update(&[0, 1], &[0]);
        assert!(matches!(result, Err(EvalError::LengthMismatch { .. })));
    }

    #[test]
    fn out_of_range_prediction_is_an_error() {
        let mut metric = StreamingMeanIou::new(2);
        let result = metric.update(&[7], &[0]);
        assert!(matches!(result, Err(EvalError::ClassOutOfRange { .. })));
    }

    #[test]
    fn reset_clears_the_matrix() {
        let mut metric = StreamingMeanIou::new(2);
        metric.update(&[0, 1], &[1, 1]).unwrap();
        metric.reset();
        assert!(metric.confusion().iter().all(|&count| count == 0));
        assert_eq!(metric.value(), 0.0);
    }
}
