//! Motion configuration, loaded from TOML.
//!
//! Every section and field is optional; anything missing takes the
//! built-in default.
//!
//! ```toml
//! [visitor]
//! base_count = 1250
//!
//! [tween]
//! duration_secs = 2.0
//!
//! [magnetic]
//! strength = 0.3
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::state::cursor::CursorConfig;
use crate::state::magnetic::MagneticConfig;
use crate::state::reveal::RootMargin;
use crate::state::tween::TweenConfig;
use crate::state::visitor::VisitorConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub root_margin: RootMargin,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub visitor: VisitorConfig,
    pub tween: TweenConfig,
    pub reveal: RevealConfig,
    pub magnetic: MagneticConfig,
    pub cursor: CursorConfig,
}

impl MotionConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - TOML file; sections and fields may be omitted
    ///
    /// # Returns
    ///
    /// The parsed config, [`ConfigError::Io`] if the file cannot be read
    /// (including when it does not exist), or [`ConfigError::Parse`].
    /// Fall back to `MotionConfig::default()` if a missing file is fine.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "loaded motion config");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
