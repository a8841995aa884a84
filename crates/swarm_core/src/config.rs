//! # Instancing Configuration
//!
//! Loaded once at startup from TOML. Every key is optional:
//!
//! ```toml
//! layout = "transformed"
//! submesh_index = 0
//! length_policy = "strict"
//! buffer_policy = "rebuild_every_frame"
//!
//! [bounds]
//! center = [0.0, 0.0, 0.0]
//! size = [1000.0, 1000.0, 1000.0]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::attributes::InstanceLayout;
use crate::error::{InstancingError, InstancingResult};
use crate::host::Bounds;

/// What to do when attribute arrays disagree with the position count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthPolicy {
    /// Reject the frame with `LengthMismatch` before touching any buffer.
    #[default]
    Strict,
    /// Log a warning and size each buffer from its own array.
    ///
    /// The draw still reads `positions.len()` records from every buffer, so
    /// shorter buffers are over-read. Only for hosts that guarantee equal
    /// lengths themselves.
    BestEffort,
}

/// How attribute and argument buffers are (re)allocated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferPolicy {
    /// Release and reallocate every buffer on every update.
    ///
    /// Buffer size always equals the current array; costs one allocation per
    /// buffer per frame.
    #[default]
    RebuildEveryFrame,
    /// Keep a buffer while its capacity covers the array, grow to the next
    /// power of two otherwise. Logical length is tracked separately.
    GrowOnly,
}

/// Configuration of one instance set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstancingConfig {
    /// Attribute set.
    pub layout: InstanceLayout,
    /// Submesh drawn for every instance.
    pub submesh_index: u32,
    /// Cross-array length handling.
    pub length_policy: LengthPolicy,
    /// Buffer allocation strategy.
    pub buffer_policy: BufferPolicy,
    /// Culling bounds handed to the host with every draw.
    pub bounds: Bounds,
}

impl Default for InstancingConfig {
    fn default() -> Self {
        Self {
            layout: InstanceLayout::default(),
            submesh_index: 0,
            length_policy: LengthPolicy::default(),
            buffer_policy: BufferPolicy::default(),
            bounds: Bounds::default(),
        }
    }
}

impl InstancingConfig {
    /// Default configuration for `layout`.
    #[must_use]
    pub fn for_layout(layout: InstanceLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`InstancingError::InvalidConfig`] on malformed TOML, unknown
    /// keys or invalid bounds.
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
    /// Returns [`InstancingError::InvalidConfig`] for non-finite or negative bounds.
    pub fn validate(&self) -> InstancingResult<()> {
        let finite = self
            .bounds
            .center
            .iter()
            .chain(self.bounds.size.iter())
            .all(|v| v.is_finite());
        if !finite {
            return Err(InstancingError::InvalidConfig(
                "bounds must be finite".to_string(),
            ));
        }
        if self.bounds.size.iter().any(|&s| s < 0.0) {
            return Err(InstancingError::InvalidConfig(
                "bounds size must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = InstancingConfig::from_toml_str("").unwrap();
        assert_eq!(config, InstancingConfig::default());
        assert_eq!(config.length_policy, LengthPolicy::Strict);
        assert_eq!(config.buffer_policy, BufferPolicy::RebuildEveryFrame);
    }

    #[test]
    fn test_full_config() {
        let text = r#"
            layout = "transformed"
            submesh_index = 2
            length_policy = "best_effort"
            buffer_policy = "grow_only"

            [bounds]
            center = [1.0, 2.0, 3.0]
            size = [10.0, 10.0, 10.0]
        "#;
        let config = InstancingConfig::from_toml_str(text).unwrap();

        assert_eq!(config.layout, InstanceLayout::Transformed);
        assert_eq!(config.submesh_index, 2);
        assert_eq!(config.length_policy, LengthPolicy::BestEffort);
        assert_eq!(config.buffer_policy, BufferPolicy::GrowOnly);
        assert_eq!(config.bounds.center, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = InstancingConfig::from_toml_str("instances = 5");
        assert!(matches!(result, Err(InstancingError::InvalidConfig(_))));
    }

    #[test]
    fn test_negative_bounds_rejected() {
        let text = "[bounds]\ncenter = [0.0, 0.0, 0.0]\nsize = [-1.0, 1.0, 1.0]\n";
        let result = InstancingConfig::from_toml_str(text);
        assert!(matches!(result, Err(InstancingError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = InstancingConfig::from_file("/nonexistent/swarm.toml");
        assert!(matches!(result, Err(InstancingError::InvalidConfig(_))));
    }
}
