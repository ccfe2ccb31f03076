use std::io;
use std::path::{Path, PathBuf};

use layers::{LayerKey, LayerStyle};
use navigation::NavigatorConfig;
use serde::{Deserialize, Serialize};
use timeline::TimelineConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One overlay drawn on the globe, backed by a server dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    pub key: LayerKey,
    pub dataset: String,
    #[serde(default)]
    pub style: LayerStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub frame_rate: f64,
    /// Committed hour at startup; clamped into the timeline range.
    pub initial_timestamp: Option<String>,
    pub navigator: NavigatorConfig,
    pub timeline: TimelineConfig,
    pub overlays: Vec<OverlayConfig>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            initial_timestamp: None,
            navigator: NavigatorConfig::default(),
            timeline: TimelineConfig::default(),
            overlays: vec![OverlayConfig {
                key: LayerKey::new("moisture-transport"),
                dataset: "moisture_transport".to_string(),
                style: LayerStyle::default(),
            }],
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
