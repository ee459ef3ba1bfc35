//! Campaign Fixtures

use serde::Deserialize;

use crate::campaigns::BundleCampaign;

/// Wrapper for campaigns in YAML
#[derive(Debug, Deserialize)]
pub struct CampaignsFixture {
    /// Campaigns, in run order
    pub campaigns: Vec<BundleCampaign>,
}
