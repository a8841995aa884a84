//! # Headless Run Configuration
//!
//! ```toml
//! [instancing]
//! layout = "transformed"
//! buffer_policy = "grow_only"
//!
//! [demo]
//! instances = 10000
//! frames = 600
//! seed = 42
//! radius = 250.0
//! pulse = true
//! ```
//!
//! Both tables are optional. `[instancing]` takes the same keys as a
//! standalone instancing config file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use swarm_core::{InstancingConfig, InstancingError, InstancingResult};

/// Parameters of the procedural swarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// Instances in the swarm.
    pub instances: usize,
    /// Frames to run.
    pub frames: u64,
    /// Seed for orbits and colors.
    pub seed: u64,
    /// Orbit radius of the outermost instances.
    pub radius: f32,
    /// Swing the active count between half and all instances.
    pub pulse: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            instances: 1000,
            frames: 120,
            seed: 42,
            radius: 100.0,
            pulse: false,
        }
    }
}

/// Everything `swarm_headless` reads from its config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeadlessConfig {
    /// Instance set configuration.
    pub instancing: InstancingConfig,
    /// Swarm parameters.
    pub demo: DemoConfig,
}

impl HeadlessConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`InstancingError::InvalidConfig`] on malformed TOML, unknown
    /// keys or invalid values.
    pub fn from_toml_str(text: &str) -> InstancingResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| InstancingError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`InstancingError::InvalidConfig`] if the file cannot be read
    /// or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> InstancingResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            InstancingError::InvalidConfig(format!("{}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks values serde cannot check.
    ///
    /// # Errors
    ///
    /// Returns [`InstancingError::InvalidConfig`] for invalid instancing
    /// bounds or a non-positive radius.
    pub fn validate(&self) -> InstancingResult<()> {
        self.instancing.validate()?;
        if !(self.demo.radius.is_finite() && self.demo.radius > 0.0) {
            return Err(InstancingError::InvalidConfig(format!(
                "demo.radius must be positive, got {}",
                self.demo.radius
            )));
        }
        Ok(())
    }
}
