use crate::error::{WorldError, WorldResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "TIBIA_WORLD_CONFIG";
pub const LOG_LEVEL_ENV: &str = "TIBIA_LOG_LEVEL";
const DEFAULT_CONFIG_FILE: &str = "world.yml";

#[derive(Debug)]
pub struct AppConfig {
    pub root: PathBuf,
    pub ticks: u64,
    pub config_path: PathBuf,
    pub log_level: Option<String>,
}

impl AppConfig {
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        if args.len() < 2 {
            return Err("usage: tibia-world <asset-root> [ticks]".to_string());
        }

        let root = Path::new(&args[1]).to_path_buf();
        let ticks = if args.len() > 2 {
            args[2]
                .trim()
                .parse::<u64>()
                .map_err(|err| format!("invalid tick count {:?}: {}", args[2], err))?
        } else {
            0
        };
        let config_path = env_override(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join(DEFAULT_CONFIG_FILE));
        let log_level = env_override(LOG_LEVEL_ENV);
        Ok(Self {
            root,
            ticks,
            config_path,
            log_level,
        })
    }

    /// Reads the world configuration, falling back to defaults when the file
    /// does not exist. The log level environment override wins over the file.
    pub fn world_config(&self) -> WorldResult<WorldConfig> {
        let mut config = if self.config_path.exists() {
            WorldConfig::load(&self.config_path)?
        } else {
            WorldConfig::default()
        };
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        Ok(config)
    }
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Items a tile holds before further drops are destroyed.
    pub item_stack_size: usize,
    pub poff_effect: u16,
    pub tick_length_ms: u64,
    pub log_level: String,
    /// Edge length of a broadcast sector, in tiles.
    pub region_size: u16,
    pub pathfinder_budget: usize,
    pub kinds: PathBuf,
    pub tiles: PathBuf,
    pub houses: PathBuf,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            item_stack_size: 10,
            poff_effect: 3,
            tick_length_ms: 50,
            log_level: "info".to_string(),
            region_size: 32,
            pathfinder_budget: 4096,
            kinds: PathBuf::from("kinds.yml"),
            tiles: PathBuf::from("tiles.yml"),
            houses: PathBuf::from("houses.yml"),
        }
    }
}

impl WorldConfig {
    pub fn load(path: &Path) -> WorldResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| WorldError::io(path, err))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> WorldResult<Self> {
        let config: WorldConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> WorldResult<()> {
        if self.item_stack_size == 0 {
            return Err(WorldError::Config("item_stack_size must be positive".to_string()));
        }
        if self.region_size == 0 {
            return Err(WorldError::Config("region_size must be positive".to_string()));
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> WorldResult<log::LevelFilter> {
        self.log_level
            .trim()
            .parse()
            .map_err(|_| WorldError::Config(format!("unknown log level {:?}", self.log_level)))
    }

    pub fn tick_length(&self) -> Duration {
        Duration::from_millis(self.tick_length_ms)
    }

    /// Resolves a configured data file against the asset root.
    pub fn resolve(&self, root: &Path, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            root.join(file)
        }
    }
}
