//! Cart Fixtures

use serde::Deserialize;

use crate::products::SellingPlanId;

/// Wrapper for cart lines in YAML
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// Lines, in cart order
    pub lines: Vec<LineFixture>,
}

/// Line Fixture
#[derive(Debug, Deserialize)]
pub struct LineFixture {
    /// Variant key reference
    pub variant: String,

    /// Number of units
    pub quantity: u32,

    /// Selling plan, for subscription lines
    #[serde(default)]
    pub selling_plan_id: Option<SellingPlanId>,
}
