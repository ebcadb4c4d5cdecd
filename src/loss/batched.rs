use crate::error::{Result, SoftmaxError};
use crate::loss::softmax::{finish, prepare, SoftmaxLoss, SoftmaxOutput};
use crate::math::matrix::Matrix;

/// Whole-batch evaluator built from matrix expressions only.
///
///   S   = X · W                      (N, C)
///   S'  = S - rowmax(S)
///   P   = exp(S') / rowsum(exp(S'))
///   L   = Σ_i [ln rowsum(exp(S'))_i - S'_{i,y_i}]
///   dW  = Xᵀ · (P - onehot(y))
#[derive(Debug, Clone, Copy, Default)]
pub struct Batched;

impl SoftmaxLoss for Batched {
    fn evaluate(&self, w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<SoftmaxOutput> {
        prepare("batched", w, x, y, reg)?;

        let scores = x.dot(w);
        if let Some(example) = scores.first_non_finite_row() {
            return Err(SoftmaxError::NumericInstability { example });
        }

        let shifted = scores.sub_row_scalars(&scores.row_max());
        if let Some(example) = shifted.first_non_finite_row() {
            return Err(SoftmaxError::NumericInstability { example });
        }
        let exp_scores = shifted.map(f64::exp);
        let sums = exp_scores.row_sum();
        let probs = exp_scores.div_row_scalars(&sums);

        let loss: f64 = sums.iter()
            .zip(shifted.gather(y))
            .map(|(total, label_score)| total.ln() - label_score)
            .sum();

        let indicator = Matrix::one_hot(y, w.cols);
        let grad = x.transpose().dot(&(&probs - &indicator));

        Ok(finish(loss, grad, w, x.rows, reg))
    }
}
