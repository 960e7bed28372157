use serde::Deserialize;
use std::path::PathBuf;

use crate::tmdd::ExportSettings;

const CONFIG_NAME: &str = "tmdd-correct";

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_source_samples() -> PathBuf {
    PathBuf::from("aimsun_samples.csv")
}
fn default_target_samples() -> PathBuf {
    PathBuf::from("google_samples.csv")
}
fn default_parallel() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct FileConfig {
    /// Number of zones along the longitude axis
    #[serde(default)]
    pub horizontal: Option<usize>,
    /// Number of zones along the latitude axis
    #[serde(default)]
    pub vertical: Option<usize>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Simulation-space control points, `longitude,latitude` per row
    #[serde(default = "default_source_samples")]
    pub source_samples: PathBuf,
    /// Real-world control points, index-aligned with `source_samples`
    #[serde(default = "default_target_samples")]
    pub target_samples: PathBuf,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            horizontal: None,
            vertical: None,
            data_dir: default_data_dir(),
            source_samples: default_source_samples(),
            target_samples: default_target_samples(),
            verbose: false,
            parallel: default_parallel(),
            export: ExportConfig::default(),
        }
    }
}

fn default_organization_id() -> String {
    "PATH Connected Corridors".to_string()
}
fn default_network_id() -> String {
    "network".to_string()
}
fn default_network_name() -> String {
    "TMDD Network".to_string()
}
fn default_utc_offset() -> String {
    "-8".to_string()
}

/// Identification written into built TMDD documents
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ExportConfig {
    #[serde(default = "default_organization_id")]
    pub organization_id: String,
    #[serde(default = "default_network_id")]
    pub network_id: String,
    #[serde(default = "default_network_name")]
    pub network_name: String,
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            organization_id: default_organization_id(),
            network_id: default_network_id(),
            network_name: default_network_name(),
            utc_offset: default_utc_offset(),
        }
    }
}

impl ExportConfig {
    pub fn settings(&self) -> ExportSettings {
        ExportSettings {
            organization_id: self.organization_id.clone(),
            network_id: self.network_id.clone(),
            network_name: self.network_name.clone(),
        }
    }
}

impl FileConfig {
    /// Load the first config file found in the standard locations
    pub fn load() -> Option<Self> {
        let config_paths = get_config_paths();

        for path in config_paths {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config file {:?}: {}", path, e);
                    }
                }
            }
        }
        None
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from(format!("{CONFIG_NAME}.toml")));
    paths.push(PathBuf::from(format!(".{CONFIG_NAME}.toml")));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(CONFIG_NAME).join("config.toml"));
        paths.push(config_dir.join(format!("{CONFIG_NAME}.toml")));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(format!(".{CONFIG_NAME}.toml")));
    }

    paths
}
