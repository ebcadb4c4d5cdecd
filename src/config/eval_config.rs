use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::loss::softmax::{SoftmaxLoss, SoftmaxOutput};
use crate::loss::strategy::Strategy;
use crate::math::matrix::Matrix;

/// How a loss evaluation is run.
///
/// # Fields
/// - `reg`      - L2 regularization strength, finite and `>= 0`
/// - `strategy` - which evaluator computes the loss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub reg: f64,
    pub strategy: Strategy,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            reg: 5e-6,
            strategy: Strategy::Batched,
        }
    }
}

impl EvalConfig {
    pub fn new(reg: f64, strategy: Strategy) -> Self {
        EvalConfig { reg, strategy }
    }

    pub fn evaluate(&self, w: &Matrix, x: &Matrix, y: &[usize]) -> Result<SoftmaxOutput> {
        self.strategy.evaluate(w, x, y, self.reg)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !self.reg.is_finite() || self.reg < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "reg must be finite and non-negative, got {}",
                self.reg
            )));
        }
        Ok(())
    }
}

/// Problem size and seed for the `softmax-bench` binary.
///
/// Missing fields fall back to the defaults, a CIFAR-10 sized batch:
/// 3073 features (3072 pixels plus a bias column), 10 classes, 500 examples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub features: usize,
    pub classes: usize,
    pub batch: usize,
    /// Weights are drawn uniformly from `[-weight_scale, weight_scale)`.
    pub weight_scale: f64,
    pub seed: u64,
    /// Number of random entries checked against finite differences; 0 skips the check.
    pub grad_checks: usize,
    pub eval: EvalConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            features: 3073,
            classes: 10,
            batch: 500,
            weight_scale: 1e-4,
            seed: 0,
            grad_checks: 10,
            eval: EvalConfig::default(),
        }
    }
}

impl BenchConfig {
    pub fn from_json(json: &str) -> std::result::Result<Self, ConfigError> {
        let config: BenchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        BenchConfig::from_json(&json)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.features == 0 || self.classes == 0 || self.batch == 0 {
            return Err(ConfigError::Invalid(
                "features, classes and batch must all be at least 1".to_string(),
            ));
        }
        if !self.weight_scale.is_finite() || self.weight_scale < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "weight_scale must be finite and non-negative, got {}",
                self.weight_scale
            )));
        }
        self.eval.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = BenchConfig::from_json(r#"{ "batch": 32, "eval": { "strategy": "element_wise" } }"#).unwrap();

        assert_eq!(config.batch, 32);
        assert_eq!(config.features, 3073);
        assert_eq!(config.eval.strategy, Strategy::ElementWise);
        assert_eq!(config.eval.reg, 5e-6);
    }

    #[test]
    fn rejects_negative_reg() {
        let err = BenchConfig::from_json(r#"{ "eval": { "reg": -0.5 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_sized_problem() {
        let err = BenchConfig::from_json(r#"{ "classes": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = BenchConfig::from_json("{ features: ").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = BenchConfig::load("/nonexistent/softmax-bench.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn eval_config_runs_its_strategy() {
        let config = EvalConfig::new(0.0, Strategy::ElementWise);
        let w = Matrix::identity(2);
        let x = Matrix::from_data(vec![vec![1.0, 0.0]]).unwrap();
        let out = config.evaluate(&w, &x, &[0]).unwrap();
        assert!((out.loss - 0.31326168751822286).abs() < 1e-12);
    }
}
