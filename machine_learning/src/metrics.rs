use crate::error::{MlErr, Result};

/// Binary confusion matrix, the positive class is `1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    /// Tallies predictions against the ground truth.
    ///
    /// # Arguments
    /// * `y_true` - The expected labels.
    /// * `y_pred` - The predicted labels.
    ///
    /// # Returns
    /// The confusion matrix or a size mismatch error if the slices differ in length.
    pub fn from_labels(y_true: &[u8], y_pred: &[u8]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(MlErr::SizeMismatch {
                a: "predictions",
                b: "labels",
                got: y_pred.len(),
                expected: y_true.len(),
            });
        }

        let mut cm = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t == 1, p == 1) {
                (true, true) => cm.true_positives += 1,
                (false, false) => cm.true_negatives += 1,
                (false, true) => cm.false_positives += 1,
                (true, false) => cm.false_negatives += 1,
            }
        }

        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// Zero when nothing was predicted positive.
    pub fn precision(&self) -> f64 {
        ratio(
            self.true_positives,
            self.true_positives + self.false_positives,
        )
    }

    /// Zero when there are no positive samples.
    pub fn recall(&self) -> f64 {
        ratio(
            self.true_positives,
            self.true_positives + self.false_negatives,
        )
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            return 0.0;
        }

        2.0 * p * r / (p + r)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        return 0.0;
    }

    num as f64 / den as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confusion_matrix_tallies() {
        let y_true = [1, 1, 0, 0, 1, 0];
        let y_pred = [1, 0, 0, 1, 1, 0];

        let cm = ConfusionMatrix::from_labels(&y_true, &y_pred).unwrap();

        assert_eq!(cm.true_positives, 2);
        assert_eq!(cm.true_negatives, 2);
        assert_eq!(cm.false_positives, 1);
        assert_eq!(cm.false_negatives, 1);
        assert_eq!(cm.total(), 6);
        assert!((cm.accuracy() - 4.0 / 6.0).abs() < 1e-12);
        assert!((cm.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.recall() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.f1() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn no_predicted_positives_yields_zero_scores() {
        let cm = ConfusionMatrix::from_labels(&[1, 0], &[0, 0]).unwrap();
        assert_eq!(cm.precision(), 0.0);
        assert_eq!(cm.recall(), 0.0);
        assert_eq!(cm.f1(), 0.0);
        assert_eq!(cm.accuracy(), 0.5);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let res = ConfusionMatrix::from_labels(&[1, 0], &[1]);
        assert!(matches!(res, Err(MlErr::SizeMismatch { .. })));
    }
}
