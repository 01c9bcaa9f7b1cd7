//! tagcompare Library
//!
//! Visual regression checks for ad tag creatives. Screenshots of the same
//! campaign are captured once per browser/OS configuration; this library
//! addresses those captures, cross-compares every configuration pair and
//! writes merged diff images for the pairs that drifted apart.
//!
//! # Module Overview
//!
//! - [`artifact_key`] - Five-part artifact addressing and directory layout
//! - [`engine`] - Pairwise comparison of configurations
//! - [`orchestrator`] - Runs comparison sets across campaigns
//! - [`campaigns`] - Campaign id resolution from publishers
//! - [`aggregate`] - Folds capture builds into the comparison build
//! - [`image_diff`] / [`merge`] - Scoring and merged diff images
//! - [`config`] - Configuration file support
//! - [`output`] - JSON output schemas
//!
//! # Example
//!
//! ```no_run
//! use tagcompare_lib::{ArtifactKey, CampaignOrchestrator, Config, Dimension};
//!
//! # fn example() -> tagcompare_lib::Result<()> {
//! let config = Config::load(None)?;
//! let orchestrator = CampaignOrchestrator::from_config(&config);
//! let summary = orchestrator.run_all(&[Dimension::from(131313u32)], &[], None)?;
//! println!("{} errors in build {}", summary.totals.errors, summary.build);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod artifact_key;
pub mod campaigns;
pub mod config;
pub mod engine;
pub mod error;
pub mod image_diff;
pub mod image_loader;
pub mod merge;
pub mod orchestrator;
pub mod output;

pub use aggregate::{aggregate_builds, AggregateReport, BuildAggregator, DirectoryAggregator};
pub use artifact_key::{
    check_segment, generate_build_name, ArtifactKey, Dimension, KeyDimension, KeyError,
    KeyOverrides, DEFAULT_BUILD_NAME, DEFAULT_OUTPUT_DIR, KEY_DIMENSIONS,
};
pub use campaigns::{CampaignLookup, ConfiguredCampaigns};
pub use config::Config;
pub use engine::{
    compare_name, ComparisonEngine, ComparisonOutcome, ComparisonTally, EngineSettings,
};
pub use error::{ErrorCategory, ErrorPayload, Result, TagCompareError};
pub use image_diff::{rms_difference, DiffError, ImageDiffer, PixelDiffer, ERROR_THRESHOLD};
pub use image_loader::{load_image, load_pair, ImageLoadError};
pub use merge::{diff_heatmap, ImageMerger, MergeInfo, SideBySideMerger};
pub use orchestrator::{CampaignOrchestrator, RunSummary, SetResult};
pub use output::{
    AggregateOutput, CleanOutput, CompareOutput, ErrorOutput, TagCompareOutput,
    TAGCOMPARE_OUTPUT_VERSION,
};
