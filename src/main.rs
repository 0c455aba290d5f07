//! Headless dam-break runner.
//!
//! Usage: `sph2d-run [config.json] [steps]`
//!
//! Without a config file the default dam break is used. Set `RUST_LOG=debug`
//! (or `trace` for every step) to see more.

use sph2d::prelude::*;
use std::env;
use std::process::ExitCode;

const DEFAULT_STEPS: usize = 2000;
const REPORT_EVERY: usize = 100;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = match args.first() {
        Some(path) => match SphConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => SphConfig::default(),
    };
    let steps = match args.get(1).map(|s| s.parse::<usize>()) {
        Some(Ok(steps)) => steps,
        Some(Err(e)) => {
            log::error!("invalid step count `{}`: {}", args[1], e);
            return ExitCode::FAILURE;
        }
        None => DEFAULT_STEPS,
    };

    let mut solver = match Solver::new(config) {
        Ok(solver) => solver,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    for step in 1..=steps {
        solver.step();
        if step % REPORT_EVERY == 0 || step == steps {
            let stats = solver.stats();
            log::info!("{}", stats);
            if !stats.is_finite() {
                log::error!("simulation diverged at step {}", step);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
