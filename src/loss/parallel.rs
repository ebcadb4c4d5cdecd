use rayon::prelude::*;

use crate::error::Result;
use crate::loss::element_wise::accumulate_example;
use crate::loss::softmax::{finish, prepare, SoftmaxLoss, SoftmaxOutput};
use crate::math::matrix::Matrix;

/// Element-wise evaluator with the examples split across the rayon pool.
///
/// Each worker folds into its own `(loss, dW)` partial; partials are summed
/// in the reduce step, so no gradient cell is shared between threads.
/// Results match `ElementWise` up to summation order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelElementWise;

impl SoftmaxLoss for ParallelElementWise {
    fn evaluate(&self, w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<SoftmaxOutput> {
        prepare("parallel_element_wise", w, x, y, reg)?;

        let zero = || (0.0, Matrix::zeros(w.rows, w.cols));

        let (loss, grad) = (0..x.rows)
            .into_par_iter()
            .try_fold(zero, |(loss, mut grad), i| -> Result<(f64, Matrix)> {
                let example_loss = accumulate_example(w, x.row(i), y[i], i, &mut grad)?;
                Ok((loss + example_loss, grad))
            })
            .try_reduce(zero, |(loss_a, grad_a), (loss_b, grad_b)| {
                Ok((loss_a + loss_b, grad_a + grad_b))
            })?;

        Ok(finish(loss, grad, w, x.rows, reg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SoftmaxError;
    use crate::loss::element_wise::ElementWise;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn matches_sequential_loop() {
        let mut rng = StdRng::seed_from_u64(11);
        let w = Matrix::random_with(&mut rng, 6, 4, 0.5);
        let x = Matrix::random_with(&mut rng, 64, 6, 2.0);
        let y: Vec<usize> = (0..64).map(|i| (i * 7) % 4).collect();

        let seq = ElementWise.evaluate(&w, &x, &y, 0.1).unwrap();
        let par = ParallelElementWise.evaluate(&w, &x, &y, 0.1).unwrap();

        assert!((seq.loss - par.loss).abs() < 1e-12);
        assert!(seq.grad.relative_distance(&par.grad) < 1e-12);
    }

    #[test]
    fn reports_instability_from_a_worker() {
        let w = Matrix::from_data(vec![vec![f64::NAN, 0.0]]).unwrap();
        let x = Matrix::from_data(vec![vec![1.0]]).unwrap();
        assert_eq!(
            ParallelElementWise.evaluate(&w, &x, &[0], 0.0),
            Err(SoftmaxError::NumericInstability { example: 0 })
        );
    }
}
