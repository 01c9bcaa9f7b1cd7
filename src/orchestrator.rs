//! Runs every comparison set for every requested campaign.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{BuildAggregator, DirectoryAggregator};
use crate::artifact_key::{generate_build_name, ArtifactKey, Dimension};
use crate::campaigns::{CampaignLookup, ConfiguredCampaigns};
use crate::config::Config;
use crate::engine::{ComparisonEngine, ComparisonTally, EngineSettings};
use crate::error::Result;
use crate::image_diff::{ImageDiffer, PixelDiffer};
use crate::merge::{ImageMerger, SideBySideMerger};

/// Tally for one comparison set of one campaign.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetResult {
    pub campaign_id: Dimension,
    pub set: String,
    pub tally: ComparisonTally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// The run build; merged diffs land under `output_build_dir`.
    pub build: String,
    pub output_build_dir: PathBuf,
    pub campaigns: Vec<Dimension>,
    pub sets: Vec<SetResult>,
    pub totals: ComparisonTally,
}

pub struct CampaignOrchestrator<D = PixelDiffer, M = SideBySideMerger> {
    engine: ComparisonEngine<D, M>,
    comparisons: BTreeMap<String, Vec<String>>,
    output_dir: PathBuf,
    campaigns: Box<dyn CampaignLookup>,
    aggregator: Option<Box<dyn BuildAggregator>>,
}

impl CampaignOrchestrator {
    /// Built-in collaborators: pixel diffs, side-by-side merges, the
    /// `[publisher_campaigns]` table and aggregation into `compare_build`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config,
            ComparisonEngine::new(EngineSettings::from_config(config)),
            Box::new(ConfiguredCampaigns::from_config(config)),
        )
        .with_aggregator(Box::new(DirectoryAggregator::new(
            config.compare_build.clone(),
        )))
    }
}

impl<D: ImageDiffer, M: ImageMerger> CampaignOrchestrator<D, M> {
    /// No aggregation step until [`Self::with_aggregator`] is called.
    pub fn new(
        config: &Config,
        engine: ComparisonEngine<D, M>,
        campaigns: Box<dyn CampaignLookup>,
    ) -> Self {
        Self {
            engine,
            comparisons: config.comparisons.clone(),
            output_dir: config.output_dir.clone(),
            campaigns,
            aggregator: None,
        }
    }

    #[must_use]
    pub fn with_aggregator(mut self, aggregator: Box<dyn BuildAggregator>) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    #[must_use]
    pub fn without_aggregation(mut self) -> Self {
        self.aggregator = None;
        self
    }

    pub fn engine(&self) -> &ComparisonEngine<D, M> {
        &self.engine
    }

    /// Aggregates builds, resolves campaigns and compares every set for each
    /// campaign.
    ///
    /// `root_key` fixes the run build and base path; when absent a key with a
    /// fresh timestamped build under the configured output directory is
    /// used. Comparison errors are reported in the summary and never fail the
    /// call.
    pub fn run_all(
        &self,
        campaign_ids: &[Dimension],
        publisher_ids: &[Dimension],
        root_key: Option<ArtifactKey>,
    ) -> Result<RunSummary> {
        if let Some(aggregator) = &self.aggregator {
            let report = aggregator.aggregate(&self.output_dir)?;
            debug!(
                builds = report.builds.len(),
                files = report.files_copied,
                "aggregated builds into {}",
                report.path.display()
            );
        }

        let campaigns = self.campaigns.resolve(campaign_ids, publisher_ids)?;
        if campaigns.is_empty() {
            warn!("No campaigns to compare");
        }

        let root_key = match root_key {
            Some(key) => key,
            None => ArtifactKey::with_base(generate_build_name(), &self.output_dir)?,
        };
        info!(
            "Comparing {} campaigns across {} comparison sets (build {})",
            campaigns.len(),
            self.comparisons.len(),
            root_key.build()
        );

        let mut sets = Vec::with_capacity(campaigns.len() * self.comparisons.len());
        let mut totals = ComparisonTally::default();
        for campaign_id in &campaigns {
            let campaign_key = root_key.clone().with_campaign_id(campaign_id)?;
            for (set, configs) in &self.comparisons {
                debug!(campaign = %campaign_id, set = %set, "running comparison set");
                let tally = self.engine.compare_configs(&campaign_key, configs.as_slice())?;
                totals += tally;
                sets.push(SetResult {
                    campaign_id: campaign_id.clone(),
                    set: set.clone(),
                    tally,
                });
            }
        }

        let output_build_dir = root_key.build_directory();
        info!(
            "Done. Compared {} images: {} errors ({} over threshold), {} skipped",
            totals.total, totals.errors, totals.failed, totals.skipped
        );
        if totals.errors > 0 {
            info!("See merged diff images in {}", output_build_dir.display());
        }

        Ok(RunSummary {
            build: root_key.build().to_string(),
            output_build_dir,
            campaigns,
            sets,
            totals,
        })
    }
}
