use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::world::terrain::{GenerationError, MapLayout, TerrainParams, DEFAULT_TILE_SIZE};
use super::world::WorldParams;

pub const CONFIG_ENV_VAR: &str = "CITY_QUEST_CONFIG";
pub const SEED_ENV_VAR: &str = "CITY_QUEST_SEED";
pub const LAYOUT_ENV_VAR: &str = "CITY_QUEST_LAYOUT";
pub const HEADLESS_TICKS_ENV_VAR: &str = "CITY_QUEST_HEADLESS_TICKS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub layout: MapLayout,
    pub map_cols: u32,
    pub map_rows: u32,
    pub tile_size: f32,
    pub road_spacing: u32,
    pub road_width: u32,
    pub vehicle_count: usize,
    pub pedestrian_count: usize,
    /// Fresh random seed per session when unset.
    pub seed: Option<u64>,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    /// Run this many ticks without a window, then exit.
    pub headless_ticks: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        let world = WorldParams::default();
        Self {
            layout: world.terrain.layout,
            map_cols: world.terrain.cols,
            map_rows: world.terrain.rows,
            tile_size: DEFAULT_TILE_SIZE,
            road_spacing: world.terrain.road_spacing,
            road_width: world.terrain.road_width,
            vehicle_count: world.vehicle_count,
            pedestrian_count: world.pedestrian_count,
            seed: None,
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            headless_ticks: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path} at '{field_path}': {source}")]
    Parse {
        path: PathBuf,
        field_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid world settings: {0}")]
    World(#[from] GenerationError),
    #[error("window size must be positive, got {width}x{height}")]
    InvalidWindow { width: u32, height: u32 },
    #[error("target_tps must be positive")]
    InvalidTickRate,
}

impl GameConfig {
    /// File named by `CITY_QUEST_CONFIG` (or defaults), then env overrides,
    /// then validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::load_from_path(Path::new(path.trim()))?,
            Ok(_) | Err(env::VarError::NotPresent) => Self::default(),
            Err(error) => {
                warn!(
                    env_var = CONFIG_ENV_VAR,
                    error = %error,
                    "unable to read config env var; using defaults"
                );
                Self::default()
            }
        };
        config.apply_overrides(|name| env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse_json(&raw).map_err(|(field_path, source)| ConfigError::Parse {
            path: path.to_path_buf(),
            field_path,
            source,
        })?;
        info!(path = %path.display(), "config_loaded");
        Ok(config)
    }

    fn parse_json(raw: &str) -> Result<Self, (String, serde_json::Error)> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize::<_, GameConfig>(&mut deserializer).map_err(|error| {
            let field_path = error.path().to_string();
            (field_path, error.into_inner())
        })
    }

    /// Applies `CITY_QUEST_SEED`, `CITY_QUEST_LAYOUT` and
    /// `CITY_QUEST_HEADLESS_TICKS`. Unparsable values are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(seed) = parse_override::<u64>(SEED_ENV_VAR, lookup(SEED_ENV_VAR)) {
            self.seed = Some(seed);
        }
        if let Some(layout) = parse_override::<MapLayout>(LAYOUT_ENV_VAR, lookup(LAYOUT_ENV_VAR)) {
            self.layout = layout;
        }
        if let Some(ticks) =
            parse_override::<u64>(HEADLESS_TICKS_ENV_VAR, lookup(HEADLESS_TICKS_ENV_VAR))
        {
            self.headless_ticks = Some(ticks);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.world_params().terrain.validate()?;
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ConfigError::InvalidWindow {
                width: self.window_width,
                height: self.window_height,
            });
        }
        if self.target_tps == 0 {
            return Err(ConfigError::InvalidTickRate);
        }
        Ok(())
    }

    /// Fixes the seed on first call so every later reader sees the same value.
    pub fn resolve_seed(&mut self) -> u64 {
        *self.seed.get_or_insert_with(rand::random::<u64>)
    }

    pub fn world_params(&self) -> WorldParams {
        WorldParams {
            terrain: TerrainParams {
                layout: self.layout,
                cols: self.map_cols,
                rows: self.map_rows,
                tile_size: self.tile_size,
                road_spacing: self.road_spacing,
                road_width: self.road_width,
            },
            vehicle_count: self.vehicle_count,
            pedestrian_count: self.pedestrian_count,
        }
    }
}

fn parse_override<T>(env_var: &'static str, value: Option<String>) -> Option<T>
where
    T: FromStr,
{
    let value = value?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(
                env_var,
                value = value.as_str(),
                "invalid env override value; ignoring"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_validate() {
        let config = GameConfig::default();
        config.validate().expect("defaults are valid");
        assert_eq!(config.world_params(), WorldParams::default());
    }

    #[test]
    fn resolve_seed_keeps_configured_seed_and_fixes_random_one() {
        let mut configured = GameConfig {
            seed: Some(42),
            ..GameConfig::default()
        };
        assert_eq!(configured.resolve_seed(), 42);

        let mut unseeded = GameConfig::default();
        let first = unseeded.resolve_seed();
        assert_eq!(unseeded.seed, Some(first));
        assert_eq!(unseeded.resolve_seed(), first);
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let config = GameConfig::parse_json(r#"{ "layout": "wilderness", "seed": 7 }"#)
            .expect("parse config");
        assert_eq!(config.layout, MapLayout::Wilderness);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.map_cols, 100);
    }

    #[test]
    fn parse_errors_name_the_field_path() {
        let (field_path, _) =
            GameConfig::parse_json(r#"{ "map_cols": "wide" }"#).expect_err("bad type");
        assert_eq!(field_path, "map_cols");

        let (field_path, source) =
            GameConfig::parse_json(r#"{ "colour": 1 }"#).expect_err("unknown field");
        assert!(source.to_string().contains("colour"), "{source}");
        assert!(field_path.is_empty() || field_path == "." || field_path == "colour");
    }

    #[test]
    fn load_from_path_reads_json_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("city.json");
        fs::write(&path, r#"{ "vehicle_count": 3, "pedestrian_count": 4 }"#).expect("write");
        let config = GameConfig::load_from_path(&path).expect("load");
        assert_eq!(config.vehicle_count, 3);
        assert_eq!(config.pedestrian_count, 4);

        let missing = GameConfig::load_from_path(&temp.path().join("missing.json"))
            .expect_err("missing file");
        assert!(matches!(missing, ConfigError::Read { .. }));
    }

    #[test]
    fn env_overrides_apply_and_bad_values_are_ignored() {
        let mut config = GameConfig::default();
        config.apply_overrides(lookup_from(&[
            (SEED_ENV_VAR, " 42 "),
            (LAYOUT_ENV_VAR, "Wilderness"),
            (HEADLESS_TICKS_ENV_VAR, "ten"),
        ]));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.layout, MapLayout::Wilderness);
        assert_eq!(config.headless_ticks, None);
    }

    #[test]
    fn validation_rejects_bad_world_and_window_settings() {
        let config = GameConfig {
            road_width: 12,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::World(GenerationError::InvalidRoadGrid { .. }))
        ));

        let config = GameConfig {
            tile_size: f32::NAN,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::World(GenerationError::InvalidTileSize(_)))
        ));

        let config = GameConfig {
            window_width: 0,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWindow { .. })
        ));

        let config = GameConfig {
            target_tps: 0,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTickRate)));
    }
}
