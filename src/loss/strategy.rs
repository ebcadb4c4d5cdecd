use serde::{Serialize, Deserialize};
use std::fmt;

use crate::error::Result;
use crate::loss::batched::Batched;
use crate::loss::element_wise::ElementWise;
use crate::loss::parallel::ParallelElementWise;
use crate::loss::softmax::{SoftmaxLoss, SoftmaxOutput};
use crate::math::matrix::Matrix;

/// Selects which evaluator computes the softmax loss.
///
/// - `ElementWise`         - explicit loops over examples and classes.
/// - `Batched`             - matrix expressions over the whole batch.
/// - `ParallelElementWise` - the element-wise loop spread over rayon workers.
///
/// All three produce the same loss and gradient up to rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ElementWise,
    #[default]
    Batched,
    ParallelElementWise,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::ElementWise,
        Strategy::Batched,
        Strategy::ParallelElementWise,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::ElementWise => "element_wise",
            Strategy::Batched => "batched",
            Strategy::ParallelElementWise => "parallel_element_wise",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl SoftmaxLoss for Strategy {
    fn evaluate(&self, w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<SoftmaxOutput> {
        match self {
            Strategy::ElementWise => ElementWise.evaluate(w, x, y, reg),
            Strategy::Batched => Batched.evaluate(w, x, y, reg),
            Strategy::ParallelElementWise => ParallelElementWise.evaluate(w, x, y, reg),
        }
    }
}

/// Evaluates the softmax loss and weight gradient with `strategy`.
pub fn softmax_loss(
    strategy: Strategy,
    w: &Matrix,
    x: &Matrix,
    y: &[usize],
    reg: f64,
) -> Result<SoftmaxOutput> {
    strategy.evaluate(w, x, y, reg)
}
