pub mod error;
pub mod math;
pub mod loss;
pub mod check;
pub mod config;

// Convenience re-exports
pub use error::{ConfigError, Result, SoftmaxError};
pub use math::matrix::Matrix;
pub use loss::{softmax_loss, Batched, ElementWise, ParallelElementWise, SoftmaxLoss, SoftmaxOutput, Strategy};
pub use check::{grad_check_sparse, numerical_gradient, relative_error, GradCheck};
pub use config::{BenchConfig, EvalConfig};
