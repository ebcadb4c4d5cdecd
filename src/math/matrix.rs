use rand::Rng;
use serde::{Serialize, Deserialize};
use std::ops::{Add, Sub, Mul};

use crate::error::{Result, SoftmaxError};

/// Dense row-major `f64` matrix.
///
/// Binary operations (`dot`, `+`, `-`, `*`) panic when shapes disagree; the
/// loss evaluators validate their inputs up front so they never hit those
/// panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    pub fn identity(n: usize) -> Matrix {
        let mut res = Matrix::zeros(n, n);
        for i in 0..n {
            res.data[i][i] = 1.0;
        }
        res
    }

    /// Builds a matrix from row vectors. An empty `data` gives a 0x0 matrix.
    pub fn from_data(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let cols = data.first().map_or(0, |row| row.len());
        if let Some(row) = data.iter().find(|row| row.len() != cols) {
            return Err(SoftmaxError::ShapeMismatch {
                what: "row length",
                got: row.len(),
                expected: cols,
            });
        }

        Ok(Matrix {
            rows: data.len(),
            cols,
            data
        })
    }

    /// Uniform samples in `[-scale, scale)` drawn from `rng`, so seeded
    /// generators give reproducible matrices.
    pub fn random_with<R: Rng + ?Sized>(rng: &mut R, rows: usize, cols: usize, scale: f64) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);

        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = (rng.gen::<f64>() * 2.0 - 1.0) * scale;
            }
        }

        res
    }

    /// Indicator matrix of shape (labels.len(), classes) with a 1 at
    /// `(i, labels[i])` and 0 elsewhere.
    ///
    /// # Panics
    /// Panics if any label is `>= classes`.
    pub fn one_hot(labels: &[usize], classes: usize) -> Matrix {
        let mut res = Matrix::zeros(labels.len(), classes);
        for (i, &label) in labels.iter().enumerate() {
            res.data[i][label] = 1.0;
        }
        res
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row][col]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i]
    }

    /// Checks that `rows`/`cols` describe `data`. The fields are public, so
    /// a hand-assembled matrix can disagree with its own header.
    pub fn check_layout(&self, what: &'static str) -> Result<()> {
        if self.data.len() != self.rows {
            return Err(SoftmaxError::ShapeMismatch { what, got: self.data.len(), expected: self.rows });
        }
        if let Some(row) = self.data.iter().find(|row| row.len() != self.cols) {
            return Err(SoftmaxError::ShapeMismatch { what, got: row.len(), expected: self.cols });
        }
        Ok(())
    }

    /// Matrix product `self · rhs`.
    pub fn dot(&self, rhs: &Matrix) -> Matrix {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes: {}x{} · {}x{}", self.rows, self.cols, rhs.rows, rhs.cols)
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        // i-k-j order walks both operands row by row.
        for i in 0..self.rows {
            let out = &mut res.data[i];
            for (k, &a) in self.data[i].iter().enumerate() {
                for (o, &b) in out.iter_mut().zip(rhs.data[k].iter()) {
                    *o += a * b;
                }
            }
        }

        res
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().flatten().sum()
    }

    pub fn sum_squares(&self) -> f64 {
        self.data.iter().flatten().map(|x| x * x).sum()
    }

    /// Largest entry of each row. Rows with no columns yield `-inf`.
    pub fn row_max(&self) -> Vec<f64> {
        self.data.iter()
            .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect()
    }

    /// Index of the first row holding a NaN or infinite entry.
    pub fn first_non_finite_row(&self) -> Option<usize> {
        self.data.iter().position(|row| row.iter().any(|x| !x.is_finite()))
    }

    pub fn row_sum(&self) -> Vec<f64> {
        self.data.iter().map(|row| row.iter().sum()).collect()
    }

    /// Subtracts `values[i]` from every entry of row `i`.
    pub fn sub_row_scalars(&self, values: &[f64]) -> Matrix {
        self.zip_rows(values, |x, v| x - v)
    }

    /// Divides every entry of row `i` by `values[i]`.
    pub fn div_row_scalars(&self, values: &[f64]) -> Matrix {
        self.zip_rows(values, |x, v| x / v)
    }

    /// Picks `self[i][cols[i]]` for every row.
    pub fn gather(&self, cols: &[usize]) -> Vec<f64> {
        assert_eq!(cols.len(), self.rows, "gather needs one column index per row");
        self.data.iter().zip(cols.iter()).map(|(row, &c)| row[c]).collect()
    }

    pub fn frobenius_distance(&self, other: &Matrix) -> f64 {
        (self - other).sum_squares().sqrt()
    }

    /// `||a - b|| / (||a|| + ||b||)`, or 0 when both matrices are zero.
    pub fn relative_distance(&self, other: &Matrix) -> f64 {
        let denom = self.sum_squares().sqrt() + other.sum_squares().sqrt();
        if denom == 0.0 {
            0.0
        } else {
            self.frobenius_distance(other) / denom
        }
    }

    fn zip_rows<F>(&self, values: &[f64], functor: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        assert_eq!(values.len(), self.rows, "need one scalar per row");
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(values.iter())
                .map(|(row, &v)| row.iter().map(|&x| functor(x, v)).collect())
                .collect(),
        }
    }

    fn zip_with<F>(&self, rhs: &Matrix, functor: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes: {}x{} vs {}x{}", self.rows, self.cols, rhs.rows, rhs.cols)
        }

        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(rhs.data.iter())
                .map(|(a, b)| a.iter().zip(b.iter()).map(|(&x, &y)| functor(x, y)).collect())
                .collect(),
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Add for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub for &Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        self.dot(rhs)
    }
}

impl Add for Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        &self + &rhs
    }
}

impl Sub for Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        &self - &rhs
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        self.dot(&rhs)
    }
}
