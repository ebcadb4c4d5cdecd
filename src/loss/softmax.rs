use log::debug;
use serde::{Serialize, Deserialize};

use crate::error::{Result, SoftmaxError};
use crate::math::matrix::Matrix;

/// Loss and weight gradient of one evaluation. `grad` has the shape of `W`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxOutput {
    pub loss: f64,
    pub grad: Matrix,
}

impl SoftmaxOutput {
    pub fn into_parts(self) -> (f64, Matrix) {
        (self.loss, self.grad)
    }
}

/// Softmax cross-entropy loss of a linear classifier with L2 weight
/// regularization.
///
/// Shapes: `w` is (D, C), `x` is (N, D), `y` holds N class ids in `[0, C)`.
/// The returned loss is the batch mean of `-log softmax(x_i · W)[y_i]` plus
/// `0.5 · reg · ΣW²`; the gradient adds `2 · reg · W` to the mean data
/// gradient.
///
/// Every implementation validates its inputs before computing anything and
/// returns the same numbers up to floating-point rounding. A score row whose
/// spread exceeds the f64 range cannot be shifted into a finite softmax and
/// is reported as `NumericInstability`.
pub trait SoftmaxLoss {
    fn evaluate(&self, w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<SoftmaxOutput>;
}

/// Checks every input invariant and logs the problem size.
pub(crate) fn prepare(strategy: &str, w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<()> {
    validate(w, x, y, reg)?;
    debug!(
        "softmax loss [{strategy}]: N={} D={} C={} reg={reg}",
        x.rows, w.rows, w.cols
    );
    Ok(())
}

pub(crate) fn validate(w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<()> {
    w.check_layout("W")?;
    x.check_layout("X")?;

    if x.cols != w.rows {
        return Err(SoftmaxError::ShapeMismatch {
            what: "feature dimension",
            got: x.cols,
            expected: w.rows,
        });
    }
    if y.len() != x.rows {
        return Err(SoftmaxError::ShapeMismatch {
            what: "labels",
            got: y.len(),
            expected: x.rows,
        });
    }
    if x.rows == 0 {
        return Err(SoftmaxError::EmptyBatch);
    }
    if !reg.is_finite() || reg < 0.0 {
        return Err(SoftmaxError::InvalidRegularization(reg));
    }
    if let Some((index, &label)) = y.iter().enumerate().find(|&(_, &label)| label >= w.cols) {
        return Err(SoftmaxError::InvalidLabel { index, label, classes: w.cols });
    }

    Ok(())
}

/// Turns batch sums into the final output: averages over `n` examples and
/// applies the regularization terms.
///
/// With `reg == 0` the terms are skipped entirely, since `ΣW²` may overflow
/// to `inf` and `0 · inf` is NaN.
pub(crate) fn finish(data_loss: f64, data_grad: Matrix, w: &Matrix, n: usize, reg: f64) -> SoftmaxOutput {
    let n = n as f64;
    let mut loss = data_loss / n;
    let mut grad = data_grad.scale(1.0 / n);

    if reg != 0.0 {
        loss += 0.5 * reg * w.sum_squares();
        grad = &grad + &w.scale(2.0 * reg);
    }

    SoftmaxOutput { loss, grad }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> (Matrix, Matrix, Vec<usize>) {
        let w = Matrix::zeros(3, 4);
        let x = Matrix::zeros(2, 3);
        (w, x, vec![0, 3])
    }

    #[test]
    fn accepts_consistent_inputs() {
        let (w, x, y) = inputs();
        assert!(validate(&w, &x, &y, 0.0).is_ok());
    }

    #[test]
    fn rejects_feature_dimension_mismatch() {
        let (w, _, y) = inputs();
        let x = Matrix::zeros(2, 5);
        assert_eq!(
            validate(&w, &x, &y, 0.0),
            Err(SoftmaxError::ShapeMismatch { what: "feature dimension", got: 5, expected: 3 })
        );
    }

    #[test]
    fn rejects_label_count_mismatch() {
        let (w, x, _) = inputs();
        assert_eq!(
            validate(&w, &x, &[0], 0.0),
            Err(SoftmaxError::ShapeMismatch { what: "labels", got: 1, expected: 2 })
        );
    }

    #[test]
    fn rejects_out_of_range_label() {
        let (w, x, _) = inputs();
        assert_eq!(
            validate(&w, &x, &[1, 4], 0.0),
            Err(SoftmaxError::InvalidLabel { index: 1, label: 4, classes: 4 })
        );
    }

    #[test]
    fn rejects_empty_batch_and_bad_reg() {
        let (w, _, _) = inputs();
        assert_eq!(validate(&w, &Matrix::zeros(0, 3), &[], 0.0), Err(SoftmaxError::EmptyBatch));

        let (w, x, y) = inputs();
        assert_eq!(validate(&w, &x, &y, -1.0), Err(SoftmaxError::InvalidRegularization(-1.0)));
        assert!(matches!(
            validate(&w, &x, &y, f64::NAN),
            Err(SoftmaxError::InvalidRegularization(_))
        ));
    }

    #[test]
    fn finish_averages_and_regularizes() {
        let w = Matrix::identity(2);
        let data_grad = Matrix::from_data(vec![vec![2.0, 4.0], vec![6.0, 8.0]]).unwrap();
        let out = finish(3.0, data_grad, &w, 2, 0.5);

        // 3/2 + 0.5 * 0.5 * 2
        assert!((out.loss - 2.0).abs() < 1e-12);
        assert_eq!(out.grad.data, vec![vec![2.0, 2.0], vec![3.0, 5.0]]);
    }

    #[test]
    fn finish_without_reg_ignores_overflowing_weights() {
        let w = Matrix::from_data(vec![vec![1e200, 0.0]]).unwrap();
        let data_grad = Matrix::from_data(vec![vec![-1.0, 1.0]]).unwrap();
        let out = finish(0.5, data_grad, &w, 1, 0.0);

        assert_eq!(out.loss, 0.5);
        assert_eq!(out.grad.data, vec![vec![-1.0, 1.0]]);
    }
}
