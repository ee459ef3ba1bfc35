//! Trellis prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    campaigns::{
        BundleCampaign, BundleDefinition, BuySide, Campaign, CampaignError, CampaignOutcome,
        CampaignReport, GetSide, SkipReason,
    },
    cart::{Cart, CartError, LineItemKey},
    discounts::{DiscountApplicator, DiscountError, DiscountKind, DiscountRule, DiscountSpec},
    distribution::{DiscountLoop, Distribution, DistributionError},
    fixtures::{Fixture, FixtureError},
    items::{LineItem, LineItemError, PriceAdjustment},
    products::{Product, ProductId, SellingPlanId, Variant, VariantId},
    runner::{CampaignRunner, RunReport, RunnerError},
    selectors::{MatchType, ProductSelector, SelectorError, SelectorKind, SelectorSpec, SelectorValue},
    tags::TagSet,
};
