use engine::{build_or_load_question_bank, resolve_app_paths, LoopConfig, QuestionBank, Simulation};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::config::{ConfigError, GameConfig};
use super::default_bank::default_question_bank;
use super::score::TracingScoreReporter;
use super::simulation::CitySimulation;
use super::world::terrain::GenerationError;

pub(crate) enum RunMode {
    Windowed(LoopConfig),
    Headless { ticks: u64, target_tps: u32 },
}

pub(crate) struct AppWiring {
    pub(crate) mode: RunMode,
    pub(crate) simulation: Box<dyn Simulation>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("world generation failed: {0}")]
    Generation(#[from] GenerationError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== City Quest Startup ===");

    let mut config = GameConfig::load()?;
    let seed = config.resolve_seed();
    info!(
        seed,
        layout = %config.layout,
        cols = config.map_cols,
        rows = config.map_rows,
        "config_resolved"
    );

    let bank = load_question_bank();
    let simulation =
        CitySimulation::new(&config, seed, &bank, Box::new(TracingScoreReporter::default()))?;

    Ok(AppWiring {
        mode: run_mode(&config),
        simulation: Box::new(simulation),
    })
}

fn run_mode(config: &GameConfig) -> RunMode {
    match config.headless_ticks {
        Some(ticks) => RunMode::Headless {
            ticks,
            target_tps: config.target_tps,
        },
        None => RunMode::Windowed(LoopConfig {
            window_width: config.window_width,
            window_height: config.window_height,
            target_tps: config.target_tps,
            ..LoopConfig::default()
        }),
    }
}

/// Authored bank when it loads; the built-in bank when anything fails, so a
/// broken asset never blocks play.
fn load_question_bank() -> QuestionBank {
    let paths = match resolve_app_paths() {
        Ok(paths) => paths,
        Err(error) => {
            warn!(error = %error, "question_bank_fallback_to_default");
            return default_question_bank();
        }
    };
    match build_or_load_question_bank(&paths) {
        Ok(bank) => {
            info!(questions = bank.len(), "question_bank_ready");
            bank
        }
        Err(error) => {
            warn!(
                error = %error,
                questions_dir = %paths.questions_dir.display(),
                "question_bank_fallback_to_default"
            );
            default_question_bank()
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
