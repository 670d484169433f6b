use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;

pub use app::{
    run_app, screen_to_world, world_to_screen, AppError, Camera2D, GroundLayer, InputAction,
    InputSnapshot, LoopConfig, LoopMetricsSnapshot, MinimapDot, MinimapImage, Proxy, ProxyDesc,
    ProxyHost, ProxyId, ProxyLayer, ProxyShape, ProxyStore, ProxyUpdate, Renderer, Rgba,
    Simulation, SimulationCommand, SimulationRunner, Vec2, Viewport,
};
pub use content::{
    build_or_load_question_bank, compile_question_bank, ContentPipelineError, QuestionBank,
    QuestionCompileError, QuestionDef, QuestionErrorCode, SourceLocation, SourceScanError,
};

pub const ROOT_ENV_VAR: &str = "CITY_QUEST_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub questions_dir: PathBuf,
    pub cache_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create cache directory at {path}: {source}")]
    CreateCacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "{env_var} is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf, env_var: &'static str },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
export {env_var}=\"/path/to/city-quest\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    app_paths_for_root(root)
}

pub fn app_paths_for_root(root: PathBuf) -> Result<AppPaths, StartupError> {
    let questions_dir = root.join("assets").join("questions");
    let cache_dir = root.join("cache");

    fs::create_dir_all(&cache_dir).map_err(|source| StartupError::CreateCacheDir {
        path: cache_dir.clone(),
        source,
    })?;

    Ok(AppPaths {
        root,
        questions_dir,
        cache_dir,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot {
                    path: normalized,
                    env_var: ROOT_ENV_VAR,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            find_root_upward(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_upward(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
