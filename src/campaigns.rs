use std::collections::BTreeMap;

use tracing::debug;

use crate::artifact_key::Dimension;
use crate::config::Config;
use crate::error::{Result, TagCompareError};

/// Turns the campaign and publisher ids a run was asked for into the final
/// list of campaign ids to compare.
pub trait CampaignLookup {
    fn resolve(&self, campaign_ids: &[Dimension], publisher_ids: &[Dimension])
        -> Result<Vec<Dimension>>;
}

/// Resolves publishers through the `[publisher_campaigns]` table of the
/// configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredCampaigns {
    publisher_campaigns: BTreeMap<String, Vec<Dimension>>,
}

impl ConfiguredCampaigns {
    pub fn new(publisher_campaigns: BTreeMap<String, Vec<Dimension>>) -> Self {
        Self {
            publisher_campaigns,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.publisher_campaigns.clone())
    }
}

impl CampaignLookup for ConfiguredCampaigns {
    /// Explicit campaign ids come first, followed by each publisher's
    /// campaigns in the order given. Duplicates keep their first position.
    fn resolve(
        &self,
        campaign_ids: &[Dimension],
        publisher_ids: &[Dimension],
    ) -> Result<Vec<Dimension>> {
        let mut resolved: Vec<Dimension> = Vec::new();
        let mut push = |id: &Dimension| {
            if !id.is_empty() && !resolved.contains(id) {
                resolved.push(id.clone());
            }
        };

        campaign_ids.iter().for_each(&mut push);
        for publisher in publisher_ids {
            let campaigns = self
                .publisher_campaigns
                .get(publisher.as_str())
                .ok_or_else(|| {
                    TagCompareError::campaign(format!("unknown publisher id '{publisher}'"))
                })?;
            debug!(
                publisher = %publisher,
                count = campaigns.len(),
                "expanded publisher campaigns"
            );
            campaigns.iter().for_each(&mut push);
        }

        Ok(resolved)
    }
}
