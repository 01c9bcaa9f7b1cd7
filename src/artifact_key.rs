//! Addressable artifact paths.
//!
//! Every captured artifact is addressed by a five-part key:
//!
//! ```text
//! {base}/{build}/{config}/{campaign_id}/{tag_size}/{tag_type}/{config}-{campaign_id}-{tag_size}-{tag_type}.png
//! ```
//!
//! Keys may be partial (directory-level operations) or complete (file-level
//! operations). A partial key resolves to the prefix ending just before its
//! first unset dimension. Identity is the resolved path: two keys are equal
//! when they point at the same place, however they were built.
//!
//! Each dimension must be a single plain directory name, so a key never
//! resolves outside its base path.
//!
//! # Example
//!
//! ```
//! use tagcompare_lib::ArtifactKey;
//!
//! let key = ArtifactKey::with_base("20240101-120000", "/tmp/output")?
//!     .with_config("chrome_windows10")?
//!     .with_campaign_id(131313u32)?
//!     .with_tag_size("300x250")?
//!     .with_tag_type("iframe")?;
//!
//! assert!(key.image_path()?.ends_with(
//!     "chrome_windows10/131313/300x250/iframe/chrome_windows10-131313-300x250-iframe.png"
//! ));
//! # Ok::<(), tagcompare_lib::KeyError>(())
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

/// Default root for captured and compared artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Build name that aggregated captures land in.
pub const DEFAULT_BUILD_NAME: &str = "default";

/// Number of dimensions in a complete key.
pub const KEY_DIMENSIONS: usize = 5;

/// One addressing component of an [`ArtifactKey`], in path order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyDimension {
    Build,
    Config,
    CampaignId,
    TagSize,
    TagType,
}

impl KeyDimension {
    pub const fn all() -> [KeyDimension; KEY_DIMENSIONS] {
        [
            KeyDimension::Build,
            KeyDimension::Config,
            KeyDimension::CampaignId,
            KeyDimension::TagSize,
            KeyDimension::TagType,
        ]
    }

    const fn index(self) -> usize {
        match self {
            KeyDimension::Build => 0,
            KeyDimension::Config => 1,
            KeyDimension::CampaignId => 2,
            KeyDimension::TagSize => 3,
            KeyDimension::TagType => 4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            KeyDimension::Build => "build",
            KeyDimension::Config => "config",
            KeyDimension::CampaignId => "campaign_id",
            KeyDimension::TagSize => "tag_size",
            KeyDimension::TagType => "tag_type",
        }
    }
}

impl fmt::Display for KeyDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single key dimension value.
///
/// Numeric input (campaign ids are usually numbers upstream) is converted to
/// its decimal string form on the way in; everything downstream sees text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Dimension(String);

impl Dimension {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Dimension {
    fn from(value: &str) -> Self {
        Dimension(value.to_string())
    }
}

impl From<String> for Dimension {
    fn from(value: String) -> Self {
        Dimension(value)
    }
}

impl From<&String> for Dimension {
    fn from(value: &String) -> Self {
        Dimension(value.clone())
    }
}

impl From<&Dimension> for Dimension {
    fn from(value: &Dimension) -> Self {
        value.clone()
    }
}

impl From<u32> for Dimension {
    fn from(value: u32) -> Self {
        Dimension(value.to_string())
    }
}

impl From<u64> for Dimension {
    fn from(value: u64) -> Self {
        Dimension(value.to_string())
    }
}

impl From<i64> for Dimension {
    fn from(value: i64) -> Self {
        Dimension(value.to_string())
    }
}

impl AsRef<str> for Dimension {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Dimension(text),
            Raw::Number(number) => Dimension::from(number),
        })
    }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Key dimension '{dimension}' is not set")]
    MissingDimension { dimension: KeyDimension },
    #[error("Base path is empty")]
    InvalidBasePath,
    #[error("Key has {actual} parts; expected {expected}")]
    InvalidKeyArity { expected: usize, actual: usize },
    #[error("Build name is required")]
    MissingBuild,
    #[error("Key dimension '{dimension}' value '{value}' {reason}")]
    InvalidDimension {
        dimension: KeyDimension,
        value: String,
        reason: &'static str,
    },
    #[error("Invalid artifact path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("IO error at '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl KeyError {
    fn invalid_path(path: &Path, reason: impl Into<String>) -> Self {
        KeyError::InvalidPath {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        KeyError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Rejects values that would not land as exactly one directory below the
/// previous segment.
pub fn check_segment(dimension: KeyDimension, text: &str) -> Result<(), KeyError> {
    let reason = if text.contains(['/', '\\']) {
        Some("contains a path separator")
    } else if text == "." || text == ".." {
        Some("is a relative path marker")
    } else if !matches!(
        Path::new(text).components().collect::<Vec<_>>().as_slice(),
        [Component::Normal(_)]
    ) {
        Some("is not a single directory name")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(KeyError::InvalidDimension {
            dimension,
            value: text.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Dimension values to replace when deriving a key with
/// [`ArtifactKey::clone_with`]. Unset fields keep the source key's value.
#[derive(Debug, Clone, Default)]
pub struct KeyOverrides {
    pub build: Option<Dimension>,
    pub config: Option<Dimension>,
    pub campaign_id: Option<Dimension>,
    pub tag_size: Option<Dimension>,
    pub tag_type: Option<Dimension>,
    pub base_path: Option<PathBuf>,
}

impl KeyOverrides {
    #[must_use]
    pub fn build(mut self, value: impl Into<Dimension>) -> Self {
        self.build = Some(value.into());
        self
    }

    #[must_use]
    pub fn config(mut self, value: impl Into<Dimension>) -> Self {
        self.config = Some(value.into());
        self
    }

    #[must_use]
    pub fn campaign_id(mut self, value: impl Into<Dimension>) -> Self {
        self.campaign_id = Some(value.into());
        self
    }

    #[must_use]
    pub fn tag_size(mut self, value: impl Into<Dimension>) -> Self {
        self.tag_size = Some(value.into());
        self
    }

    #[must_use]
    pub fn tag_type(mut self, value: impl Into<Dimension>) -> Self {
        self.tag_type = Some(value.into());
        self
    }

    #[must_use]
    pub fn base_path(mut self, value: impl Into<PathBuf>) -> Self {
        self.base_path = Some(value.into());
        self
    }
}

/// Structured address of a captured artifact or of one of its parent
/// directories.
///
/// Keys are immutable values: the `with_*` methods consume the key and
/// return the updated one, and [`ArtifactKey::clone_with`] derives a new key
/// from a borrowed one.
#[derive(Debug, Clone)]
pub struct ArtifactKey {
    base_path: PathBuf,
    parts: [Option<Dimension>; KEY_DIMENSIONS],
}

impl ArtifactKey {
    /// Key for `build` under [`DEFAULT_OUTPUT_DIR`].
    pub fn new(build: impl Into<Dimension>) -> Result<Self, KeyError> {
        Self::with_base(build, DEFAULT_OUTPUT_DIR)
    }

    /// Key for `build` under an explicit base directory.
    pub fn with_base(
        build: impl Into<Dimension>,
        base_path: impl Into<PathBuf>,
    ) -> Result<Self, KeyError> {
        let mut parts: [Option<Dimension>; KEY_DIMENSIONS] = Default::default();
        parts[0] = Some(build.into());
        Self::from_parts(parts, base_path)
    }

    /// Builds a key from exactly [`KEY_DIMENSIONS`] optional parts in path
    /// order. Empty strings count as unset; anything that is not a single
    /// directory name is rejected.
    pub fn from_parts<I, D>(parts: I, base_path: impl Into<PathBuf>) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = Option<D>>,
        D: Into<Dimension>,
    {
        let base_path = base_path.into();
        if base_path.as_os_str().is_empty() {
            return Err(KeyError::InvalidBasePath);
        }

        let parts: Vec<Option<Dimension>> = parts
            .into_iter()
            .map(|part| part.map(Into::<Dimension>::into).filter(|d| !d.is_empty()))
            .collect();
        let parts: [Option<Dimension>; KEY_DIMENSIONS] =
            parts
                .try_into()
                .map_err(|rejected: Vec<_>| KeyError::InvalidKeyArity {
                    expected: KEY_DIMENSIONS,
                    actual: rejected.len(),
                })?;

        if parts[0].is_none() {
            return Err(KeyError::MissingBuild);
        }
        for (dimension, part) in KeyDimension::all().into_iter().zip(&parts) {
            if let Some(part) = part {
                check_segment(dimension, part.as_str())?;
            }
        }

        Ok(Self { base_path, parts })
    }

    /// Reconstructs a key from an existing directory laid out as
    /// `{base}/{build}/{config}/{campaign_id}/{tag_size}/{tag_type}`.
    ///
    /// The last five path components become the dimensions and everything
    /// above them becomes the base path, so the result resolves back to the
    /// same directory.
    pub fn from_existing_dir(dir: impl AsRef<Path>) -> Result<Self, KeyError> {
        let dir = dir.as_ref();
        if dir.as_os_str().is_empty() {
            return Err(KeyError::invalid_path(dir, "path is empty"));
        }
        if !dir.is_dir() {
            return Err(KeyError::invalid_path(dir, "directory does not exist"));
        }

        let components: Vec<Component<'_>> = dir.components().collect();
        let split = components.len().checked_sub(KEY_DIMENSIONS).ok_or_else(|| {
            KeyError::invalid_path(
                dir,
                format!("expected at least {KEY_DIMENSIONS} path segments"),
            )
        })?;
        let (base, segments) = components.split_at(split);

        let mut parts = Vec::with_capacity(KEY_DIMENSIONS);
        for (segment, dimension) in segments.iter().zip(KeyDimension::all()) {
            let value = match segment {
                Component::Normal(name) => name.to_str().ok_or_else(|| {
                    KeyError::invalid_path(dir, format!("{dimension} segment is not valid UTF-8"))
                })?,
                _ => {
                    return Err(KeyError::invalid_path(
                        dir,
                        format!("{dimension} segment must be a plain directory name"),
                    ))
                }
            };
            parts.push(Some(value));
        }

        let base_path: PathBuf = base.iter().collect();
        if base_path.as_os_str().is_empty() {
            return Err(KeyError::invalid_path(
                dir,
                "no base directory above the key segments",
            ));
        }

        Self::from_parts(parts, base_path)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn get(&self, dimension: KeyDimension) -> Option<&str> {
        self.parts[dimension.index()].as_ref().map(Dimension::as_str)
    }

    pub fn build(&self) -> &str {
        self.get(KeyDimension::Build).unwrap_or_default()
    }

    pub fn config(&self) -> Option<&str> {
        self.get(KeyDimension::Config)
    }

    pub fn campaign_id(&self) -> Option<&str> {
        self.get(KeyDimension::CampaignId)
    }

    pub fn tag_size(&self) -> Option<&str> {
        self.get(KeyDimension::TagSize)
    }

    pub fn tag_type(&self) -> Option<&str> {
        self.get(KeyDimension::TagType)
    }

    pub fn is_complete(&self) -> bool {
        self.parts.iter().all(Option::is_some)
    }

    /// Replaces one dimension. Empty values leave the key untouched.
    pub fn with_dimension(
        mut self,
        dimension: KeyDimension,
        value: impl Into<Dimension>,
    ) -> Result<Self, KeyError> {
        let value = value.into();
        if !value.is_empty() {
            check_segment(dimension, value.as_str())?;
            self.parts[dimension.index()] = Some(value);
        }
        Ok(self)
    }

    pub fn with_build(self, value: impl Into<Dimension>) -> Result<Self, KeyError> {
        self.with_dimension(KeyDimension::Build, value)
    }

    pub fn with_config(self, value: impl Into<Dimension>) -> Result<Self, KeyError> {
        self.with_dimension(KeyDimension::Config, value)
    }

    pub fn with_campaign_id(self, value: impl Into<Dimension>) -> Result<Self, KeyError> {
        self.with_dimension(KeyDimension::CampaignId, value)
    }

    pub fn with_tag_size(self, value: impl Into<Dimension>) -> Result<Self, KeyError> {
        self.with_dimension(KeyDimension::TagSize, value)
    }

    pub fn with_tag_type(self, value: impl Into<Dimension>) -> Result<Self, KeyError> {
        self.with_dimension(KeyDimension::TagType, value)
    }

    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        if !base_path.as_os_str().is_empty() {
            self.base_path = base_path;
        }
        self
    }

    /// Derives a new key from this one, replacing whatever `overrides` sets.
    pub fn clone_with(&self, overrides: &KeyOverrides) -> Result<Self, KeyError> {
        let mut key = self.clone();
        let replacements = [
            (KeyDimension::Build, &overrides.build),
            (KeyDimension::Config, &overrides.config),
            (KeyDimension::CampaignId, &overrides.campaign_id),
            (KeyDimension::TagSize, &overrides.tag_size),
            (KeyDimension::TagType, &overrides.tag_type),
        ];
        for (dimension, value) in replacements {
            if let Some(value) = value {
                key = key.with_dimension(dimension, value)?;
            }
        }
        if let Some(base_path) = &overrides.base_path {
            key = key.with_base_path(base_path.clone());
        }
        Ok(key)
    }

    /// Joins the base path with each set dimension in order.
    ///
    /// With `allow_partial` the path stops at the first unset dimension, even
    /// if later ones are set. Without it, any unset dimension is an error.
    pub fn resolve_path(&self, allow_partial: bool) -> Result<PathBuf, KeyError> {
        let mut path = self.base_path.clone();
        for dimension in KeyDimension::all() {
            match &self.parts[dimension.index()] {
                Some(part) => path.push(part.as_str()),
                None if allow_partial => break,
                None => return Err(KeyError::MissingDimension { dimension }),
            }
        }
        trace!(path = %path.display(), "resolved artifact path");
        Ok(path)
    }

    /// The deepest directory this key addresses.
    pub fn path(&self) -> PathBuf {
        let mut path = self.base_path.clone();
        for part in self.parts.iter().map_while(Option::as_ref) {
            path.push(part.as_str());
        }
        path
    }

    /// `{config}-{campaign_id}-{tag_size}-{tag_type}`; requires a complete key.
    pub fn artifact_file_name(&self) -> Result<String, KeyError> {
        let [config, campaign_id, tag_size, tag_type] = [
            KeyDimension::Config,
            KeyDimension::CampaignId,
            KeyDimension::TagSize,
            KeyDimension::TagType,
        ]
        .map(|dimension| {
            self.get(dimension)
                .ok_or(KeyError::MissingDimension { dimension })
        });
        Ok(format!(
            "{}-{}-{}-{}",
            config?, campaign_id?, tag_size?, tag_type?
        ))
    }

    pub fn image_path(&self) -> Result<PathBuf, KeyError> {
        self.artifact_path("png")
    }

    pub fn html_path(&self) -> Result<PathBuf, KeyError> {
        self.artifact_path("html")
    }

    fn artifact_path(&self, extension: &str) -> Result<PathBuf, KeyError> {
        let dir = self.resolve_path(false)?;
        let name = self.artifact_file_name()?;
        Ok(dir.join(format!("{name}.{extension}")))
    }

    /// `{base}/{build}`, regardless of the other dimensions.
    pub fn build_directory(&self) -> PathBuf {
        self.base_path.join(self.build())
    }

    pub fn directory_exists(&self) -> bool {
        self.path().exists()
    }

    /// Creates the resolved directory tree if it is missing and returns it.
    pub fn ensure_directory(&self, allow_partial: bool) -> Result<PathBuf, KeyError> {
        let path = self.resolve_path(allow_partial)?;
        if !path.is_dir() {
            debug!(path = %path.display(), "creating artifact directory");
            fs::create_dir_all(&path).map_err(|e| KeyError::io(&path, e))?;
        }
        Ok(path)
    }

    /// Deletes the whole build directory. Returns `false` when there was
    /// nothing to delete.
    ///
    /// Must not run while other readers or writers use the same build.
    pub fn remove_build_directory(&self) -> Result<bool, KeyError> {
        let path = self.build_directory();
        if !path.exists() {
            return Ok(false);
        }
        debug!(path = %path.display(), "removing build directory");
        fs::remove_dir_all(&path).map_err(|e| KeyError::io(&path, e))?;
        Ok(true)
    }
}

impl PartialEq for ArtifactKey {
    fn eq(&self, other: &Self) -> bool {
        self.path().as_os_str() == other.path().as_os_str()
    }
}

impl Eq for ArtifactKey {}

impl Hash for ArtifactKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path().as_os_str().hash(state);
    }
}

impl PartialOrd for ArtifactKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ArtifactKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path().as_os_str().cmp(other.path().as_os_str())
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .parts
            .iter()
            .map(|part| part.as_ref().map(Dimension::as_str).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("-");
        f.write_str(rendered.trim_end_matches('-'))
    }
}

/// Timestamped build name for a new job, e.g. `20240131-154502`.
pub fn generate_build_name() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}
