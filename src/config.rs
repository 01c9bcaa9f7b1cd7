use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::artifact_key::{
    check_segment, Dimension, KeyDimension, DEFAULT_BUILD_NAME, DEFAULT_OUTPUT_DIR,
};
use crate::error::{Result, TagCompareError};
use crate::image_diff::ERROR_THRESHOLD;

/// Run configuration, usually read from a TOML file.
///
/// ```toml
/// output_dir = "output"
/// compare_build = "default"
/// tag_sizes = ["300x250", "728x90"]
/// tag_types = ["iframe", "script"]
/// campaigns = [123456]
/// error_threshold = 10.0
///
/// [comparisons]
/// desktop = ["chrome_windows10", "firefox_windows10", "edge_windows10"]
///
/// [publisher_campaigns]
/// "9000" = [123456, 654321]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub output_dir: PathBuf,
    pub compare_build: String,
    pub tag_sizes: Vec<String>,
    pub tag_types: Vec<String>,
    pub comparisons: BTreeMap<String, Vec<String>>,
    pub campaigns: Vec<Dimension>,
    pub publishers: Vec<Dimension>,
    pub publisher_campaigns: BTreeMap<String, Vec<Dimension>>,
    pub error_threshold: f64,
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        let mut comparisons = BTreeMap::new();
        comparisons.insert(
            "desktop".to_string(),
            vec![
                "chrome_windows10".to_string(),
                "firefox_windows10".to_string(),
                "edge_windows10".to_string(),
                "safari_osx".to_string(),
            ],
        );
        comparisons.insert(
            "mobile".to_string(),
            vec!["chrome_android".to_string(), "safari_ios".to_string()],
        );

        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            compare_build: DEFAULT_BUILD_NAME.to_string(),
            tag_sizes: ["300x250", "728x90", "160x600", "320x50"]
                .into_iter()
                .map(String::from)
                .collect(),
            tag_types: ["iframe", "script"].into_iter().map(String::from).collect(),
            comparisons,
            campaigns: Vec::new(),
            publishers: Vec::new(),
            publisher_campaigns: BTreeMap::new(),
            error_threshold: ERROR_THRESHOLD,
            dry_run: false,
        }
    }
}

impl Config {
    /// `~/.config/tagcompare/config.toml` (platform equivalent elsewhere).
    pub fn central_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tagcompare").join("config.toml"))
    }

    /// Explicit path, then the central config file if present, then defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::central_config_path() {
            Some(central) if central.is_file() => Self::from_file(&central),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_toml(&data)
    }

    pub fn from_toml(data: &str) -> Result<Self> {
        Ok(toml::from_str(data)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(TagCompareError::Config("output_dir must not be empty".into()));
        }
        if self.compare_build.trim().is_empty() {
            return Err(TagCompareError::Config("compare_build must not be empty".into()));
        }
        check_entry("compare_build", KeyDimension::Build, &self.compare_build)?;
        if self.tag_sizes.is_empty() {
            return Err(TagCompareError::Config("tag_sizes must not be empty".into()));
        }
        if self.tag_types.is_empty() {
            return Err(TagCompareError::Config("tag_types must not be empty".into()));
        }
        for size in &self.tag_sizes {
            check_entry("tag_sizes", KeyDimension::TagSize, size)?;
        }
        for tag_type in &self.tag_types {
            check_entry("tag_types", KeyDimension::TagType, tag_type)?;
        }
        if !self.error_threshold.is_finite() || self.error_threshold < 0.0 {
            return Err(TagCompareError::Config(format!(
                "error_threshold must be a non-negative number, got {}",
                self.error_threshold
            )));
        }
        if self.comparisons.is_empty() {
            return Err(TagCompareError::Config(
                "at least one comparison set is required under [comparisons]".into(),
            ));
        }
        for (name, configs) in &self.comparisons {
            if configs.iter().any(|config| config.trim().is_empty()) {
                return Err(TagCompareError::Config(format!(
                    "comparison set '{name}' contains a blank config name"
                )));
            }
            for config in configs {
                check_entry(&format!("comparison set '{name}'"), KeyDimension::Config, config)?;
            }
            let distinct: HashSet<&str> = configs.iter().map(String::as_str).collect();
            if distinct.len() < 2 {
                return Err(TagCompareError::Config(format!(
                    "comparison set '{name}' needs at least two distinct configs"
                )));
            }
        }
        Ok(())
    }
}

/// Entries land in artifact paths, so they must be non-blank single
/// directory names.
fn check_entry(field: &str, dimension: KeyDimension, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TagCompareError::Config(format!(
            "{field} must not contain blank entries"
        )));
    }
    check_segment(dimension, value)
        .map_err(|e| TagCompareError::Config(format!("{field}: {e}")))
}
