use super::{
    evolution::{EvolutionConfig, ParentSelection},
    expressions::{ExpressionConfig, StartProgram},
    fitness::FitnessConfig,
    roles::RoleConfig,
    specification::SpecificationConfig,
    topology::TopologyConfig,
    traits::ConfigSection,
};
use crate::error::{CoevoError, Result};
use config::{Config, Environment, File, FileFormat};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix of environment overrides, e.g. `COEVO__EVOLUTION__GENERATIONS=20`.
pub const ENV_PREFIX: &str = "COEVO";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub antagonist: RoleConfig,
    pub protagonist: RoleConfig,
    pub expressions: ExpressionConfig,
    pub fitness: FitnessConfig,
    pub topology: TopologyConfig,
    pub specification: SpecificationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            evolution: EvolutionConfig::default(),
            antagonist: RoleConfig::antagonist(),
            protagonist: RoleConfig::protagonist(),
            expressions: ExpressionConfig::default(),
            fitness: FitnessConfig::default(),
            topology: TopologyConfig::default(),
            specification: SpecificationConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.evolution.validate()?;
        self.antagonist.validate()?;
        self.protagonist.validate()?;
        self.expressions.validate()?;
        self.fitness.validate()?;
        self.topology.validate()?;
        self.specification.validate()?;

        let smallest = self
            .antagonist
            .population_size
            .min(self.protagonist.population_size);
        if let ParentSelection::Tournament { size } = self.evolution.parent_selection {
            if size > smallest {
                return Err(CoevoError::InvalidConfiguration(format!(
                    "Tournament size {} exceeds the smallest population ({})",
                    size, smallest
                )));
            }
        }
        if let StartProgram::Random { depth } = self.expressions.start {
            if depth > self.evolution.max_tree_depth {
                return Err(CoevoError::InvalidConfiguration(format!(
                    "Start program depth {} exceeds max tree depth {}",
                    depth, self.evolution.max_tree_depth
                )));
            }
        }
        Ok(())
    }

    /// Parses TOML text; environment overrides are not applied.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

fn poisoned() -> CoevoError {
    CoevoError::InvalidConfiguration("configuration lock poisoned".to_string())
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Loads a TOML or JSON file (by extension) layered with `COEVO__*` overrides.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config: AppConfig = Config::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        info!("Loaded configuration from {}", path.display());

        *self.config.write().map_err(|_| poisoned())? = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config = self.config.read().map_err(|_| poisoned())?;
        let toml_str = toml::to_string_pretty(&*config)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> Result<AppConfig> {
        Ok(self.config.read().map_err(|_| poisoned())?.clone())
    }

    /// Applies `f` and keeps the result only if it validates.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().map_err(|_| poisoned())?;
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }
}
