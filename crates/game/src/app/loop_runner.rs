use std::process::ExitCode;

use engine::{
    run_app, InputSnapshot, ProxyStore, Simulation, SimulationCommand, SimulationRunner,
};
use tracing::{error, info};

use super::bootstrap::{AppWiring, RunMode};

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match app.mode {
        RunMode::Windowed(config) => {
            if let Err(err) = run_app(config, app.simulation) {
                error!(error = %err, "startup_failed");
                return ExitCode::FAILURE;
            }
        }
        RunMode::Headless { ticks, target_tps } => {
            run_headless(app.simulation, ticks, target_tps);
        }
    }

    ExitCode::SUCCESS
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeadlessSummary {
    pub(crate) ticks_run: u64,
    pub(crate) quit_requested: bool,
    pub(crate) status_line: Option<String>,
}

/// Fixed-step run against the in-memory host with no input.
pub(crate) fn run_headless(
    simulation: Box<dyn Simulation>,
    ticks: u64,
    target_tps: u32,
) -> HeadlessSummary {
    let mut runner = SimulationRunner::new(simulation);
    let mut store = ProxyStore::default();
    let fixed_dt_seconds = 1.0 / target_tps.max(1) as f32;
    let input = InputSnapshot::empty();

    runner.init(&mut store);
    info!(ticks, target_tps, proxies = store.proxies().len(), "headless_run_started");

    let mut quit_requested = false;
    while runner.tick_count() < ticks {
        if runner.tick(fixed_dt_seconds, &input, &mut store) == SimulationCommand::Quit {
            quit_requested = true;
            break;
        }
    }

    let summary = HeadlessSummary {
        ticks_run: runner.tick_count(),
        quit_requested,
        status_line: runner.status_line(),
    };
    info!(
        ticks = summary.ticks_run,
        quit_requested = summary.quit_requested,
        updates = store.update_calls(),
        status = summary.status_line.as_deref().unwrap_or(""),
        "headless_run_complete"
    );
    runner.shutdown(&mut store);
    summary
}
