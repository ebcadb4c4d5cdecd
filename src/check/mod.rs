pub mod gradient;

pub use gradient::{grad_check_sparse, numerical_gradient, relative_error, GradCheck};
