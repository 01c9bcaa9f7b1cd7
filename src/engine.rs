//! Pairwise comparison of configurations.
//!
//! For every unordered pair of configs and every (size, type) combination the
//! engine resolves both screenshots under the comparison build, scores them
//! with an [`ImageDiffer`] and, when the score exceeds the threshold, writes a
//! merged diff image into the run's build directory.

use std::fs;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::artifact_key::{ArtifactKey, KeyOverrides};
use crate::config::Config;
use crate::error::{Result, TagCompareError};
use crate::image_diff::{ImageDiffer, PixelDiffer};
use crate::merge::{ImageMerger, MergeInfo, SideBySideMerger};

/// Result of comparing one pair of artifacts.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonOutcome {
    /// Diff computed and within the threshold.
    Compared { score: f64 },
    /// At least one artifact was missing; nothing was diffed.
    Skipped { missing: PathBuf },
    /// The diff itself could not be computed.
    Error { message: String },
    /// Diff computed and above the threshold. `merged_image` is set when the
    /// merged diff was written.
    Failed {
        score: f64,
        merged_image: Option<PathBuf>,
    },
}

impl ComparisonOutcome {
    /// Threshold failures count as errors alongside diff errors.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ComparisonOutcome::Error { .. } | ComparisonOutcome::Failed { .. }
        )
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ComparisonOutcome::Skipped { .. })
    }
}

/// Running counters for a batch of comparisons. `errors` includes `failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonTally {
    pub total: usize,
    pub errors: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ComparisonTally {
    pub fn record(&mut self, outcome: &ComparisonOutcome) {
        self.total += 1;
        if outcome.is_error() {
            self.errors += 1;
        }
        if outcome.is_skipped() {
            self.skipped += 1;
        }
        if matches!(outcome, ComparisonOutcome::Failed { .. }) {
            self.failed += 1;
        }
    }

    pub fn passed(&self) -> usize {
        self.total - self.errors - self.skipped
    }
}

impl AddAssign for ComparisonTally {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.errors += other.errors;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Build that source screenshots are read from.
    pub compare_build: String,
    pub tag_sizes: Vec<String>,
    pub tag_types: Vec<String>,
    pub error_threshold: f64,
    /// Skip writing merged images.
    pub dry_run: bool,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            compare_build: config.compare_build.clone(),
            tag_sizes: config.tag_sizes.clone(),
            tag_types: config.tag_types.clone(),
            error_threshold: config.error_threshold,
            dry_run: config.dry_run,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct ComparisonEngine<D = PixelDiffer, M = SideBySideMerger> {
    settings: EngineSettings,
    differ: D,
    merger: M,
}

impl ComparisonEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_collaborators(settings, PixelDiffer, SideBySideMerger::default())
    }
}

impl<D: ImageDiffer, M: ImageMerger> ComparisonEngine<D, M> {
    pub fn with_collaborators(settings: EngineSettings, differ: D, merger: M) -> Self {
        Self {
            settings,
            differ,
            merger,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Compares every unordered pair of `configs` for every configured size
    /// and type.
    ///
    /// `root_key` supplies the base path, the campaign id and the run build
    /// (merged images land in its build directory). Duplicate config names
    /// are compared once. Missing screenshots and failed diffs are counted,
    /// never returned as errors; a root key without a campaign id is.
    pub fn compare_configs<S: AsRef<str>>(
        &self,
        root_key: &ArtifactKey,
        configs: &[S],
    ) -> Result<ComparisonTally> {
        let mut distinct: Vec<&str> = Vec::with_capacity(configs.len());
        for config in configs {
            let config = config.as_ref();
            if !config.is_empty() && !distinct.contains(&config) {
                distinct.push(config);
            }
        }
        if distinct.len() < 2 {
            return Err(TagCompareError::precondition(format!(
                "at least two distinct configs are required to compare, got {}",
                distinct.len()
            )));
        }

        let output_dir = root_key.build_directory();
        let mut tally = ComparisonTally::default();

        for (i, config_a) in distinct.iter().enumerate() {
            for config_b in &distinct[i + 1..] {
                for tag_size in &self.settings.tag_sizes {
                    for tag_type in &self.settings.tag_types {
                        let overrides = KeyOverrides::default()
                            .build(&self.settings.compare_build)
                            .tag_size(tag_size)
                            .tag_type(tag_type);
                        let image_a = root_key
                            .clone_with(&overrides.clone().config(*config_a))?
                            .image_path()?;
                        let image_b = root_key
                            .clone_with(&overrides.config(*config_b))?
                            .image_path()?;

                        let outcome = self.compare_images(&image_a, &image_b, &output_dir);
                        tally.record(&outcome);
                    }
                }
            }
        }

        debug!(
            compared = tally.total,
            errors = tally.errors,
            skipped = tally.skipped,
            "compared {} images: {} errors, {} skipped",
            tally.total,
            tally.errors,
            tally.skipped
        );
        Ok(tally)
    }

    /// Scores one pair of screenshots.
    pub fn compare_images(
        &self,
        path_a: &Path,
        path_b: &Path,
        output_dir: &Path,
    ) -> ComparisonOutcome {
        let name = compare_name(path_a, path_b);
        for path in [path_a, path_b] {
            if !path.exists() {
                warn!("SKIPPING {} - {} not found!", name, path.display());
                return ComparisonOutcome::Skipped {
                    missing: path.to_path_buf(),
                };
            }
        }

        let score = match self.differ.compare(path_a, path_b) {
            Ok(score) => score,
            Err(err) => {
                warn!("{} could not be diffed: {}", name, err);
                return ComparisonOutcome::Error {
                    message: err.to_string(),
                };
            }
        };

        if score > self.settings.error_threshold {
            let info = MergeInfo {
                name: name.clone(),
                diff: score,
            };
            let merged_image = self.write_merged_image(path_a, path_b, &info, output_dir);
            warn!("{}", regression_message(&name, score, merged_image.as_deref()));
            return ComparisonOutcome::Failed {
                score,
                merged_image,
            };
        }

        debug!(comparison = %name, score, "within threshold");
        ComparisonOutcome::Compared { score }
    }

    fn write_merged_image(
        &self,
        path_a: &Path,
        path_b: &Path,
        info: &MergeInfo,
        output_dir: &Path,
    ) -> Option<PathBuf> {
        let destination = output_dir.join(format!("{}.png", info.name));
        if self.settings.dry_run {
            debug!(path = %destination.display(), "dry run, merged image not written");
            return None;
        }

        let written = fs::create_dir_all(output_dir)
            .map_err(TagCompareError::from)
            .and_then(|()| self.merger.merge(path_a, path_b))
            .and_then(|merged| {
                let annotated = self.merger.annotate(merged, info);
                self.merger.save(&annotated, info, &destination)
            });

        match written {
            Ok(()) => Some(destination),
            Err(err) => {
                warn!(
                    "failed to write merged image {}: {}",
                    destination.display(),
                    err
                );
                None
            }
        }
    }
}

/// `{stem_a}__vs__{stem_b}` for a pair of artifact files.
pub fn compare_name(path_a: &Path, path_b: &Path) -> String {
    let stem = |path: &Path| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    format!("{}__vs__{}", stem(path_a), stem(path_b))
}

/// Warning line for a pair over the threshold, pointing at the merged image
/// only when one was actually written.
fn regression_message(name: &str, score: f64, merged_image: Option<&Path>) -> String {
    match merged_image {
        Some(path) => format!("{name} produced diff={score:.3}. See {}", path.display()),
        None => format!("{name} produced diff={score:.3}; no merged image written"),
    }
}
