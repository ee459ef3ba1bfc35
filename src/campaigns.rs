//! Campaigns

use std::fmt;

use thiserror::Error;

use crate::{
    cart::Cart,
    distribution::{Distribution, DistributionError},
    selectors::SelectorError,
};

pub mod bundle;

pub use bundle::{BundleCampaign, BundleDefinition, BuySide, GetSide};

/// Errors raised while evaluating a campaign against a cart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CampaignError {
    /// A selector in the campaign could not be built.
    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// The earned discount could not be distributed.
    #[error(transparent)]
    Distribution(#[from] DistributionError),
}

/// Why a campaign definition left the cart untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No line matched the buy selector.
    NoBuyItems,

    /// No line matched the get selector.
    NoGetItems,

    /// Lines matched, but not enough to earn a bundle.
    NoBundles,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoBuyItems => "no buy items",
            Self::NoGetItems => "no get items",
            Self::NoBundles => "no complete bundles",
        })
    }
}

/// Result of evaluating one campaign definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignOutcome {
    /// Nothing was discounted.
    Skipped(SkipReason),

    /// A discount was distributed.
    Applied {
        /// Bundles earned.
        bundles: u64,

        /// Lines touched by the discount.
        distribution: Distribution,
    },
}

impl CampaignOutcome {
    /// Units discounted by this outcome.
    pub fn discounted_quantity(&self) -> u64 {
        match self {
            Self::Skipped(_) => 0,
            Self::Applied { distribution, .. } => distribution.discounted_quantity,
        }
    }
}

/// Outcomes of one campaign's definitions, in definition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignReport {
    /// Campaign name.
    pub name: String,

    /// One outcome per definition.
    pub outcomes: Vec<CampaignOutcome>,
}

impl CampaignReport {
    /// Units discounted across all definitions.
    pub fn discounted_quantity(&self) -> u64 {
        self.outcomes
            .iter()
            .map(CampaignOutcome::discounted_quantity)
            .sum()
    }
}

/// A campaign that can be run against a cart.
pub trait Campaign: fmt::Debug {
    /// Campaign name, used in reports and logs.
    fn name(&self) -> &str;

    /// Evaluate the campaign, mutating `cart` in place.
    ///
    /// # Errors
    ///
    /// Returns a [`CampaignError`] if evaluation fails. Changes made before the failure stand.
    fn run(&self, cart: &mut Cart<'_>) -> Result<CampaignReport, CampaignError>;
}
