use crate::artifact_key::KeyError;
use crate::image_diff::DiffError;
use crate::image_loader::ImageLoadError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TagCompareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Artifact key error: {0}")]
    Key(#[from] KeyError),

    #[error("Image diff error: {0}")]
    Diff(#[from] DiffError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Campaign lookup error: {0}")]
    Campaign(String),
}

impl TagCompareError {
    pub fn precondition(message: impl Into<String>) -> Self {
        TagCompareError::Precondition(message.into())
    }

    pub fn campaign(message: impl Into<String>) -> Self {
        TagCompareError::Campaign(message.into())
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            TagCompareError::Io(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check file paths/permissions under the output directory.",
            ),
            TagCompareError::Image(e) => ErrorPayload::new(
                ErrorCategory::Image,
                e.to_string(),
                "Verify the captured screenshots are readable PNG files.",
            ),
            TagCompareError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check JSON inputs; run with --verbose for details.",
            ),
            TagCompareError::Toml(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Fix the TOML syntax or remove unknown keys from the config file.",
            ),
            TagCompareError::Key(e) => {
                let remediation = match e {
                    KeyError::MissingDimension { .. } => {
                        "Set every key dimension (build, config, campaign id, size, type) before resolving artifact files."
                    }
                    KeyError::InvalidPath { .. } => {
                        "Pass an existing directory laid out as {output}/{build}/{config}/{campaign}/{size}/{type}."
                    }
                    KeyError::MissingBuild | KeyError::InvalidBasePath => {
                        "Provide a non-empty build name and output directory (--build / --output-dir)."
                    }
                    KeyError::InvalidDimension { .. } => {
                        "Use plain directory names for builds, configs, campaign ids, sizes and types (no '/', '\\', '.' or '..')."
                    }
                    KeyError::InvalidKeyArity { .. } => {
                        "Keys have exactly five parts: build, config, campaign id, size, type."
                    }
                    KeyError::Io { .. } => "Check file paths/permissions under the output directory.",
                };
                ErrorPayload::new(ErrorCategory::Path, e.to_string(), remediation)
            }
            TagCompareError::Diff(e) => ErrorPayload::new(
                ErrorCategory::Image,
                e.to_string(),
                "Verify image path/format and readability.",
            ),
            TagCompareError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("output directory does not exist") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Create the output directory or point --output-dir at the capture output.",
                    )
                } else if lower.contains("blank") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Remove empty entries from tag_sizes, tag_types, [comparisons] and --sizes/--types.",
                    )
                } else if lower.contains("key dimension") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Use plain directory names for sizes, types and config names (no '/', '\\', '.' or '..').",
                    )
                } else if lower.contains("comparison set") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Each [comparisons] entry needs at least two distinct config names.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Check flags/paths and the config file (--config).",
                    )
                }
            }
            TagCompareError::Precondition(msg) => ErrorPayload::new(
                ErrorCategory::Comparison,
                msg.to_string(),
                "Compare at least two configs per set.",
            ),
            TagCompareError::Campaign(msg) => ErrorPayload::new(
                ErrorCategory::Config,
                msg.to_string(),
                "Add the publisher to [publisher_campaigns] or pass --campaigns explicitly.",
            ),
        }
    }
}

impl From<ImageLoadError> for TagCompareError {
    fn from(err: ImageLoadError) -> Self {
        match err {
            ImageLoadError::Load(e) => TagCompareError::Image(e),
            ImageLoadError::NotFound(path) => {
                TagCompareError::Config(format!("Image file not found: {}", path))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, TagCompareError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Path,
    Image,
    Comparison,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
