// Times every softmax loss strategy on a random, seeded problem and checks
// that they agree. Usage:
//   softmax-bench [config.json]
// Log level comes from RUST_LOG (default: info).
use std::env;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use log::{error, info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};

use softmax_loss::{grad_check_sparse, BenchConfig, Matrix, SoftmaxLoss, SoftmaxOutput, Strategy};

const GRAD_CHECK_STEP: f64 = 1e-5;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let config = match env::args().nth(1) {
        Some(path) => BenchConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => BenchConfig::default(),
    };
    info!("config: {}", serde_json::to_string(&config)?);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let w = Matrix::random_with(&mut rng, config.features, config.classes, config.weight_scale);
    let x = Matrix::random_with(&mut rng, config.batch, config.features, 1.0);
    let y: Vec<usize> = (0..config.batch).map(|_| rng.gen_range(0..config.classes)).collect();
    let reg = config.eval.reg;

    let mut results: Vec<(Strategy, SoftmaxOutput)> = Vec::with_capacity(Strategy::ALL.len());
    for strategy in Strategy::ALL {
        let start = Instant::now();
        let out = strategy.evaluate(&w, &x, &y, reg)?;
        info!(
            "{strategy}: loss {:.6} in {:.4}s",
            out.loss,
            start.elapsed().as_secs_f64()
        );
        results.push((strategy, out));
    }

    let (reference_loss, reference_grad) = results.iter()
        .find(|(s, _)| *s == config.eval.strategy)
        .map(|(_, out)| out.clone().into_parts())
        .context("configured strategy produced no result")?;

    // Near-zero weights give a uniform softmax, so the loss should sit close to ln(C).
    info!(
        "sanity check: loss {:.6}, ln(C) = {:.6}",
        reference_loss,
        (config.classes as f64).ln()
    );

    for (strategy, out) in &results {
        if *strategy == config.eval.strategy {
            continue;
        }
        info!(
            "{} vs {strategy}: loss difference {:.3e}, gradient distance {:.3e}",
            config.eval.strategy,
            (reference_loss - out.loss).abs(),
            reference_grad.frobenius_distance(&out.grad)
        );
    }

    if config.grad_checks > 0 {
        let strategy = config.eval.strategy;
        let checks = grad_check_sparse(
            |m: &Matrix| strategy.evaluate(m, &x, &y, reg).map(|out| out.loss),
            &w,
            &reference_grad,
            config.grad_checks,
            GRAD_CHECK_STEP,
            &mut rng,
        )?;

        let worst = checks.iter().map(|c| c.rel_error).fold(0.0, f64::max);
        if worst > 1e-5 {
            warn!("gradient check: worst relative error {worst:.3e} over {} entries", checks.len());
        } else {
            info!("gradient check: worst relative error {worst:.3e} over {} entries", checks.len());
        }
    }

    Ok(())
}
