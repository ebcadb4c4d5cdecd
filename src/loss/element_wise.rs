use crate::error::{Result, SoftmaxError};
use crate::loss::softmax::{finish, prepare, SoftmaxLoss, SoftmaxOutput};
use crate::math::matrix::Matrix;

/// Loop-based evaluator: one example at a time, one class at a time.
///
/// The slow but auditable reference form of the loss.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementWise;

impl SoftmaxLoss for ElementWise {
    fn evaluate(&self, w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<SoftmaxOutput> {
        prepare("element_wise", w, x, y, reg)?;

        let mut loss = 0.0;
        let mut grad = Matrix::zeros(w.rows, w.cols);

        for i in 0..x.rows {
            loss += accumulate_example(w, x.row(i), y[i], i, &mut grad)?;
        }

        Ok(finish(loss, grad, w, x.rows, reg))
    }
}

/// Adds example `index`'s gradient contribution into `grad` and returns its
/// loss `-log p[label]`.
///
/// `features` has length D, `grad` has the shape of `w`. Inputs must already
/// be validated.
pub(crate) fn accumulate_example(
    w: &Matrix,
    features: &[f64],
    label: usize,
    index: usize,
    grad: &mut Matrix,
) -> Result<f64> {
    let classes = w.cols;

    let mut scores = vec![0.0; classes];
    for j in 0..classes {
        for (d, &x) in features.iter().enumerate() {
            scores[j] += x * w.data[d][j];
        }
    }

    if scores.iter().any(|s| !s.is_finite()) {
        return Err(SoftmaxError::NumericInstability { example: index });
    }

    // Shift by the max so exp() never overflows.
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    for s in scores.iter_mut() {
        *s -= max;
    }
    // A spread wider than f64::MAX shifts to -inf.
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(SoftmaxError::NumericInstability { example: index });
    }
    let label_score = scores[label];

    let mut total = 0.0;
    for s in scores.iter_mut() {
        *s = s.exp();
        total += *s;
    }

    // -log(exp(s_y) / total), kept in log space so an underflowing
    // probability cannot turn into an infinite loss. total >= 1.
    let loss = total.ln() - label_score;

    for j in 0..classes {
        let p = scores[j] / total;
        let coeff = if j == label { p - 1.0 } else { p };
        for (d, &x) in features.iter().enumerate() {
            grad.data[d][j] += coeff * x;
        }
    }

    Ok(loss)
}
