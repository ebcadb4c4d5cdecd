use log::debug;
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Result, SoftmaxError};
use crate::math::matrix::Matrix;

/// Outcome of comparing one gradient entry against its finite difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradCheck {
    pub row: usize,
    pub col: usize,
    pub numerical: f64,
    pub analytic: f64,
    pub rel_error: f64,
}

/// `|a - b| / (|a| + |b|)`, with two equal values (including two zeros) giving 0.
pub fn relative_error(a: f64, b: f64) -> f64 {
    if a == b {
        0.0
    } else {
        (a - b).abs() / (a.abs() + b.abs())
    }
}

/// Centered finite difference of `f` at every entry of `w`:
///   (f(W + h·e_ij) - f(W - h·e_ij)) / 2h
///
/// Costs two evaluations of `f` per entry; use `grad_check_sparse` for large
/// matrices.
pub fn numerical_gradient<F>(mut f: F, w: &Matrix, h: f64) -> Result<Matrix>
where
    F: FnMut(&Matrix) -> Result<f64>,
{
    let mut probe = w.clone();
    let mut grad = Matrix::zeros(w.rows, w.cols);

    for i in 0..w.rows {
        for j in 0..w.cols {
            grad.data[i][j] = centered_difference(&mut f, &mut probe, i, j, h)?;
        }
    }

    Ok(grad)
}

/// Compares `analytic` with the finite difference of `f` at `num_checks`
/// entries of `w` chosen uniformly at random.
pub fn grad_check_sparse<F, R>(
    mut f: F,
    w: &Matrix,
    analytic: &Matrix,
    num_checks: usize,
    h: f64,
    rng: &mut R,
) -> Result<Vec<GradCheck>>
where
    F: FnMut(&Matrix) -> Result<f64>,
    R: Rng + ?Sized,
{
    if analytic.rows != w.rows {
        return Err(SoftmaxError::ShapeMismatch { what: "analytic gradient rows", got: analytic.rows, expected: w.rows });
    }
    if analytic.cols != w.cols {
        return Err(SoftmaxError::ShapeMismatch { what: "analytic gradient cols", got: analytic.cols, expected: w.cols });
    }
    if w.rows == 0 || w.cols == 0 {
        return Ok(Vec::new());
    }

    let mut probe = w.clone();
    let mut checks = Vec::with_capacity(num_checks);

    for _ in 0..num_checks {
        let row = rng.gen_range(0..w.rows);
        let col = rng.gen_range(0..w.cols);

        let numerical = centered_difference(&mut f, &mut probe, row, col, h)?;
        let analytic = analytic.data[row][col];
        let rel_error = relative_error(numerical, analytic);

        debug!(
            "grad check ({row}, {col}): numerical {numerical:.6} analytic {analytic:.6} relative error {rel_error:.3e}"
        );

        checks.push(GradCheck { row, col, numerical, analytic, rel_error });
    }

    Ok(checks)
}

/// `probe[row][col]` is restored before returning, error or not.
fn centered_difference<F>(f: &mut F, probe: &mut Matrix, row: usize, col: usize, h: f64) -> Result<f64>
where
    F: FnMut(&Matrix) -> Result<f64>,
{
    let original = probe.data[row][col];

    probe.data[row][col] = original + h;
    let plus = f(&*probe);
    probe.data[row][col] = original - h;
    let minus = f(&*probe);
    probe.data[row][col] = original;

    Ok((plus? - minus?) / (2.0 * h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn relative_error_edges() {
        assert_eq!(relative_error(0.0, 0.0), 0.0);
        assert_eq!(relative_error(1.0, -1.0), 1.0);
        assert!((relative_error(1.0, 1.1) - 0.1 / 2.1).abs() < 1e-15);
    }

    #[test]
    fn numerical_gradient_of_sum_of_squares() {
        let w = Matrix::from_data(vec![vec![1.0, -2.0], vec![0.5, 3.0]]).unwrap();
        let grad = numerical_gradient(|m| Ok(m.sum_squares()), &w, 1e-5).unwrap();

        assert!(grad.relative_distance(&w.scale(2.0)) < 1e-7);
    }

    #[test]
    fn sparse_check_accepts_exact_gradient() {
        let mut rng = StdRng::seed_from_u64(3);
        let w = Matrix::random_with(&mut rng, 4, 3, 1.0);
        let analytic = w.scale(2.0);

        let checks = grad_check_sparse(|m| Ok(m.sum_squares()), &w, &analytic, 8, 1e-5, &mut rng).unwrap();

        assert_eq!(checks.len(), 8);
        assert!(checks.iter().all(|c| c.rel_error < 1e-7));
    }

    #[test]
    fn sparse_check_rejects_wrong_shape() {
        let w = Matrix::zeros(2, 2);
        let err = grad_check_sparse(
            |m| Ok(m.sum()),
            &w,
            &Matrix::zeros(2, 3),
            1,
            1e-5,
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert!(matches!(err, SoftmaxError::ShapeMismatch { .. }));
    }

    #[test]
    fn errors_from_the_objective_propagate() {
        let w = Matrix::zeros(1, 1);
        let res = numerical_gradient(|_| Err(SoftmaxError::EmptyBatch), &w, 1e-5);
        assert_eq!(res, Err(SoftmaxError::EmptyBatch));
    }
}
