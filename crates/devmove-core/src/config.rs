use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DevmoveError;
use crate::types::{PartitionLayout, Side};

/// Top-level configuration loaded from `.devmove.toml`.
///
/// Supports layered resolution: CLI flags > config file > defaults.
///
/// # Examples
///
/// ```
/// use devmove_core::DevmoveConfig;
///
/// let config = DevmoveConfig::default();
/// assert_eq!(config.movement.pivot, "apache/zookeeper");
/// assert_eq!(config.groups.sizes, vec![2, 3, 4]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevmoveConfig {
    /// Pivot and partition settings.
    #[serde(default)]
    pub movement: MovementConfig,
    /// Group co-occurrence settings.
    #[serde(default)]
    pub groups: GroupsConfig,
    /// Time windows for co-contribution and key-person analysis.
    #[serde(default)]
    pub window: WindowConfig,
    /// Where result tables are written.
    #[serde(default)]
    pub output: OutputConfig,
}

impl DevmoveConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DevmoveError::Io`] if the file cannot be read,
    /// [`DevmoveError::Toml`] if the content is not valid TOML, or
    /// [`DevmoveError::Config`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, DevmoveError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`DevmoveError::Toml`] if parsing fails, or
    /// [`DevmoveError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use devmove_core::DevmoveConfig;
    ///
    /// let toml = r#"
    /// [movement]
    /// pivot = "apache/kafka"
    /// "#;
    /// let config = DevmoveConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.movement.pivot, "apache/kafka");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, DevmoveError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), DevmoveError> {
        if self.movement.pivot.trim().is_empty() {
            return Err(DevmoveError::Config("movement.pivot must not be empty".into()));
        }
        if self.window.co_contribution_days < 0 || self.window.key_person_days < 0 {
            return Err(DevmoveError::Config(
                "window lengths must be zero or positive".into(),
            ));
        }
        Ok(())
    }
}

/// Pivot repository and partition output settings.
///
/// # Examples
///
/// ```
/// use devmove_core::{MovementConfig, PartitionLayout};
///
/// let config = MovementConfig::default();
/// assert_eq!(config.layout, PartitionLayout::Repository);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementConfig {
    /// Repository used as the before/after split marker.
    #[serde(default = "default_pivot")]
    pub pivot: String,
    /// Table shape for partition exports.
    #[serde(default)]
    pub layout: PartitionLayout,
}

fn default_pivot() -> String {
    "apache/zookeeper".into()
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            pivot: default_pivot(),
            layout: PartitionLayout::default(),
        }
    }
}

/// Group co-occurrence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupsConfig {
    /// Group sizes to analyse (default: 2, 3, 4).
    #[serde(default = "default_sizes")]
    pub sizes: Vec<usize>,
    /// Side of the pivot the membership table describes (default: after).
    #[serde(default = "default_side")]
    pub side: Side,
    /// Skip repositories with more developers than this; 0 disables the bound.
    #[serde(default)]
    pub max_developers_per_repo: usize,
}

fn default_sizes() -> Vec<usize> {
    vec![2, 3, 4]
}

fn default_side() -> Side {
    Side::After
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            sizes: default_sizes(),
            side: default_side(),
            max_developers_per_repo: 0,
        }
    }
}

/// Time windows, in days.
///
/// # Examples
///
/// ```
/// use devmove_core::WindowConfig;
///
/// let config = WindowConfig::default();
/// assert_eq!(config.co_contribution_days, 5);
/// assert_eq!(config.key_person_days, 30);
/// assert_eq!(config.key_person_top, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Half-width of the co-contribution window (default: 5).
    #[serde(default = "default_co_contribution_days")]
    pub co_contribution_days: i64,
    /// Half-width of the key-person window (default: 30).
    #[serde(default = "default_key_person_days")]
    pub key_person_days: i64,
    /// Number of key persons to follow (default: 3).
    #[serde(default = "default_key_person_top")]
    pub key_person_top: usize,
}

fn default_co_contribution_days() -> i64 {
    5
}

fn default_key_person_days() -> i64 {
    30
}

fn default_key_person_top() -> usize {
    3
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            co_contribution_days: default_co_contribution_days(),
            key_person_days: default_key_person_days(),
            key_person_top: default_key_person_top(),
        }
    }
}

/// Result table destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory result files are written to (default: `results`).
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// File-name prefix for partition exports (default: `zookeeper`).
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_prefix() -> String {
    "zookeeper".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            prefix: default_prefix(),
        }
    }
}
