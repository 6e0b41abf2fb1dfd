//! Settings for the tree and the terminal viewer, read from a TOML file.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::error::Error;
use crate::quadtree::SkipQuadTree;
use crate::quadtree::Square;
use crate::quadtree::promotion::DEFAULT_PROBABILITY;
use crate::quadtree::promotion::check_probability;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid tree settings: {0}")]
    Tree(#[from] Error),

    #[error("Invalid view setting `{name}`: {value}")]
    View { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

impl Config {
    /// Loads the configuration at `path`, or the defaults when there is no such file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        contents.parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tree.validate()?;

        let view = &self.view;
        let checks = [
            ("delete_eps", view.delete_eps, view.delete_eps >= 0.0),
            ("query_eps", view.query_eps, view.query_eps >= 0.0),
            ("step", view.step, view.step > 0.0),
        ];

        for (name, value, ok) in checks {
            if !ok || !value.is_finite() {
                return Err(ConfigError::View { name, value });
            }
        }

        Ok(())
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;

        Ok(config)
    }
}

/// Domain bounds, half-open on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bounds {
    pub from_x: f64,
    pub to_x: f64,
    pub from_y: f64,
    pub to_y: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TreeConfig {
    /// Fixed domain. Without one the tree grows to fit every point.
    #[serde(default = "default_bounds")]
    pub bounds: Option<Bounds>,

    /// Ignore `bounds` and grow the domain instead.
    #[serde(default)]
    pub expanding: bool,

    #[serde(default = "default_probability")]
    pub promotion_probability: f64,

    /// Seed for the promotion coin, for reproducible towers.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl TreeConfig {
    pub fn build(&self) -> Result<SkipQuadTree, Error> {
        SkipQuadTree::from_config(self)
    }

    /// Checks the same things as [`TreeConfig::build`], without seeding an rng.
    pub fn validate(&self) -> Result<(), Error> {
        check_probability(self.promotion_probability)?;

        if let (Some(b), false) = (self.bounds, self.expanding) {
            Square::domain(b.from_x, b.to_x, b.from_y, b.to_y)?;
        }

        Ok(())
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            bounds: default_bounds(),
            expanding: false,
            promotion_probability: default_probability(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ViewConfig {
    /// How far from the cursor a point may be to get deleted.
    #[serde(default = "default_delete_eps")]
    pub delete_eps: f64,

    /// Slack added around selected rectangles.
    #[serde(default = "default_query_eps")]
    pub query_eps: f64,

    /// World units the cursor moves per key press.
    #[serde(default = "default_step")]
    pub step: f64,

    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            delete_eps: default_delete_eps(),
            query_eps: default_query_eps(),
            step: default_step(),
            log_file: None,
        }
    }
}

fn default_bounds() -> Option<Bounds> {
    Some(Bounds {
        from_x: -320.0,
        to_x: 320.0,
        from_y: -240.0,
        to_y: 240.0,
    })
}
fn default_probability() -> f64 {
    DEFAULT_PROBABILITY
}
fn default_delete_eps() -> f64 {
    5.0
}
fn default_query_eps() -> f64 {
    0.1
}
fn default_step() -> f64 {
    4.0
}
