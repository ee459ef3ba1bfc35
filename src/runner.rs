//! Campaign Runner
//!
//! Runs an ordered list of campaigns against one cart. Each campaign sees the cart as left by the
//! campaigns before it, including any lines they split.

use thiserror::Error;
use tracing::info;

use crate::{
    campaigns::{Campaign, CampaignError, CampaignReport},
    cart::Cart,
};

/// Errors raised while running campaigns.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunnerError {
    /// A campaign failed; campaigns before it keep their changes.
    #[error("campaign {campaign} failed: {source}")]
    Campaign {
        /// Name of the failing campaign.
        campaign: String,

        /// Underlying failure.
        #[source]
        source: CampaignError,
    },
}

/// Reports from a full run, in campaign order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// One report per campaign.
    pub campaigns: Vec<CampaignReport>,
}

impl RunReport {
    /// Units discounted across all campaigns.
    pub fn discounted_quantity(&self) -> u64 {
        self.campaigns
            .iter()
            .map(CampaignReport::discounted_quantity)
            .sum()
    }
}

/// Campaign Runner
#[derive(Debug, Default)]
pub struct CampaignRunner {
    campaigns: Vec<Box<dyn Campaign>>,
}

impl CampaignRunner {
    /// Create a runner for `campaigns`, which run in the given order.
    pub fn new(campaigns: Vec<Box<dyn Campaign>>) -> Self {
        Self { campaigns }
    }

    /// Append a campaign to the end of the run order.
    #[must_use]
    pub fn with_campaign(mut self, campaign: impl Campaign + 'static) -> Self {
        self.campaigns.push(Box::new(campaign));
        self
    }

    /// Number of campaigns.
    pub fn len(&self) -> usize {
        self.campaigns.len()
    }

    /// Check if there are no campaigns.
    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
    }

    /// Run every campaign against `cart`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Campaign`] for the first campaign that fails. The pass stops there;
    /// discounts already applied are kept.
    #[tracing::instrument(
        name = "runner.run",
        skip_all,
        fields(campaigns = self.campaigns.len(), lines = cart.len()),
        err
    )]
    pub fn run(&self, cart: &mut Cart<'_>) -> Result<RunReport, RunnerError> {
        let mut report = RunReport::default();

        for campaign in &self.campaigns {
            let campaign_report = campaign.run(cart).map_err(|source| RunnerError::Campaign {
                campaign: campaign.name().to_string(),
                source,
            })?;

            report.campaigns.push(campaign_report);
        }

        info!(
            lines = cart.len(),
            discounted_quantity = report.discounted_quantity(),
            "campaigns complete"
        );

        Ok(report)
    }
}
