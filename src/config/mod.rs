pub mod eval_config;

pub use eval_config::{BenchConfig, EvalConfig};
