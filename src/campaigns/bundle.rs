//! Buy V of W, Get X of Y for Z
//!
//! Buy a number of lines matching one selector, get a number of lines matching another selector
//! discounted. For example, "buy 2 t-shirts, get 1 hat for 10% off".

use std::num::NonZeroU32;

use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    campaigns::{Campaign, CampaignError, CampaignOutcome, CampaignReport, SkipReason},
    cart::{Cart, LineItemKey},
    discounts::{DiscountApplicator, DiscountSpec},
    distribution::DiscountLoop,
    selectors::{ProductSelector, SelectorSpec},
};

/// The qualifying side of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuySide {
    /// Which lines count towards the purchase.
    #[serde(flatten)]
    pub selector: SelectorSpec,

    /// Units needed to earn one bundle.
    pub quantity: NonZeroU32,
}

/// The discounted side of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GetSide {
    /// Which lines can be discounted.
    #[serde(flatten)]
    pub selector: SelectorSpec,

    /// Units discounted per bundle.
    pub quantity: NonZeroU32,

    /// Discount what is there even when fewer get units exist than the bundles imply.
    #[serde(default)]
    pub allow_incomplete_bundle: bool,
}

/// One "buy V of W, get X of Y for Z" rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BundleDefinition {
    /// Buy side.
    pub buy: BuySide,

    /// Get side.
    pub get: GetSide,

    /// Discount applied to the get side.
    pub discount: DiscountSpec,
}

impl BundleDefinition {
    /// Create a bundle definition.
    pub fn new(buy: BuySide, get: GetSide, discount: DiscountSpec) -> Self {
        Self {
            buy,
            get,
            discount,
        }
    }

    /// Evaluate this definition against `cart`, discounting the cheapest get units first.
    ///
    /// # Errors
    ///
    /// - [`CampaignError::Selector`]: a selector kind is not recognised. Raised before the cart
    ///   is touched.
    /// - [`CampaignError::Distribution`]: the discount could not be applied.
    pub fn evaluate(&self, cart: &mut Cart<'_>) -> Result<CampaignOutcome, CampaignError> {
        let buy_selector = ProductSelector::new(&self.buy.selector)?;
        let get_selector = ProductSelector::new(&self.get.selector)?;

        let mut buy_lines = 0_usize;
        let mut buy_quantity = 0_u64;
        let mut get_lines: Vec<(LineItemKey, i64, u64)> = Vec::new();

        // A line may count on both sides.
        for (key, line) in cart.iter() {
            let quantity = u64::from(line.quantity());

            if buy_selector.matches(line) {
                buy_lines += 1;
                buy_quantity += quantity;
            }

            if get_selector.matches(line) {
                get_lines.push((key, line.variant().price().to_minor_units(), quantity));
            }
        }

        if buy_lines == 0 {
            return Ok(CampaignOutcome::Skipped(SkipReason::NoBuyItems));
        }

        if get_lines.is_empty() {
            return Ok(CampaignOutcome::Skipped(SkipReason::NoGetItems));
        }

        // Cheapest units first; ties keep cart order.
        get_lines.sort_by_key(|(_, unit_price, _)| *unit_price);

        let quantity_to_discount = u64::from(self.get.quantity.get());
        let buy_offers = buy_quantity / u64::from(self.buy.quantity.get());

        let bundles = if self.get.allow_incomplete_bundle {
            buy_offers
        } else {
            let get_quantity: u64 = get_lines.iter().map(|(_, _, quantity)| quantity).sum();

            buy_offers.min(get_quantity / quantity_to_discount)
        };

        let discountable = bundles.saturating_mul(quantity_to_discount);

        debug!(
            buy_kind = %buy_selector.kind(),
            get_kind = %get_selector.kind(),
            buy_lines,
            buy_quantity,
            get_lines = get_lines.len(),
            bundles,
            discountable,
            "evaluated bundle"
        );

        if discountable == 0 {
            return Ok(CampaignOutcome::Skipped(SkipReason::NoBundles));
        }

        let candidates: Vec<LineItemKey> = get_lines.iter().map(|(key, _, _)| *key).collect();
        let applicator = DiscountApplicator::from(&self.discount);
        let distribution = DiscountLoop::new(&applicator).distribute(cart, &candidates, discountable)?;

        Ok(CampaignOutcome::Applied {
            bundles,
            distribution,
        })
    }
}

/// A named list of bundle definitions, evaluated in order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BundleCampaign {
    name: String,
    definitions: Vec<BundleDefinition>,
}

impl BundleCampaign {
    /// Create a bundle campaign.
    pub fn new(name: impl Into<String>, definitions: impl Into<Vec<BundleDefinition>>) -> Self {
        Self {
            name: name.into(),
            definitions: definitions.into(),
        }
    }

    /// The definitions, in evaluation order.
    pub fn definitions(&self) -> &[BundleDefinition] {
        &self.definitions
    }
}

impl Campaign for BundleCampaign {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(
        name = "campaigns.bundle.run",
        skip_all,
        fields(campaign = %self.name, definitions = self.definitions.len()),
        err
    )]
    fn run(&self, cart: &mut Cart<'_>) -> Result<CampaignReport, CampaignError> {
        let mut outcomes = Vec::with_capacity(self.definitions.len());

        for (index, definition) in self.definitions.iter().enumerate() {
            let outcome = definition.evaluate(cart)?;

            match &outcome {
                CampaignOutcome::Skipped(reason) => {
                    debug!(index, %reason, "bundle definition skipped");
                }
                CampaignOutcome::Applied {
                    bundles,
                    distribution,
                } => {
                    info!(
                        index,
                        bundles,
                        discounted_quantity = distribution.discounted_quantity,
                        split = distribution.split.is_some(),
                        message = %definition.discount.message,
                        "bundle discount applied"
                    );
                }
            }

            outcomes.push(outcome);
        }

        Ok(CampaignReport {
            name: self.name.clone(),
            outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use crate::{
        discounts::DiscountKind,
        items::{LineItem, LineItemError},
        products::{Product, ProductId, Variant, VariantId},
        selectors::{MatchType, SelectorError, SelectorValue},
        tags::TagSet,
    };

    use super::*;

    fn line(
        tags: &[&str],
        unit_minor: i64,
        quantity: u32,
    ) -> Result<LineItem<'static>, LineItemError> {
        let product = Arc::new(Product::new(ProductId(1), "Acme", "Apparel", TagSet::from_strs(tags)));
        let variant = Variant::new(VariantId(1), Money::from_minor(unit_minor, USD), product);

        LineItem::new(Arc::new(variant), quantity)
    }

    fn tag_side(tag: &str) -> SelectorSpec {
        SelectorSpec::new(MatchType::Include, "tag", [SelectorValue::from(tag)])
    }

    fn definition(buy: u32, get: u32, allow_incomplete_bundle: bool) -> Result<BundleDefinition, &'static str> {
        Ok(BundleDefinition::new(
            BuySide {
                selector: tag_side("shirt"),
                quantity: NonZeroU32::new(buy).ok_or("zero buy quantity")?,
            },
            GetSide {
                selector: tag_side("hat"),
                quantity: NonZeroU32::new(get).ok_or("zero get quantity")?,
                allow_incomplete_bundle,
            },
            DiscountSpec::new(DiscountKind::Percent, Decimal::from(10), "Hat deal"),
        ))
    }

    #[test]
    fn skips_without_buy_items() -> TestResult {
        let mut cart = Cart::with_items([line(&["hat"], 1_000, 2)?], USD)?;

        let outcome = definition(2, 1, false)?.evaluate(&mut cart)?;

        assert_eq!(outcome, CampaignOutcome::Skipped(SkipReason::NoBuyItems));
        assert_eq!(cart.subtotal()?.to_minor_units(), 2_000);

        Ok(())
    }

    #[test]
    fn skips_without_get_items() -> TestResult {
        let mut cart = Cart::with_items([line(&["shirt"], 1_000, 2)?], USD)?;

        let outcome = definition(2, 1, false)?.evaluate(&mut cart)?;

        assert_eq!(outcome, CampaignOutcome::Skipped(SkipReason::NoGetItems));

        Ok(())
    }

    #[test]
    fn skips_when_buy_quantity_is_short() -> TestResult {
        let mut cart = Cart::with_items(
            [line(&["shirt"], 1_000, 1)?, line(&["hat"], 500, 1)?],
            USD,
        )?;

        let outcome = definition(2, 1, false)?.evaluate(&mut cart)?;

        assert_eq!(outcome, CampaignOutcome::Skipped(SkipReason::NoBundles));

        Ok(())
    }

    #[test]
    fn complete_bundles_are_capped_by_get_quantity() -> TestResult {
        // 6 shirts earn 3 bundles of 2 hats, but only 5 hats means 2 complete bundles.
        let mut cart = Cart::with_items(
            [line(&["shirt"], 2_000, 6)?, line(&["hat"], 1_000, 5)?],
            USD,
        )?;

        let outcome = definition(2, 2, false)?.evaluate(&mut cart)?;

        assert_eq!(outcome.discounted_quantity(), 4);
        assert!(matches!(outcome, CampaignOutcome::Applied { bundles: 2, .. }));
        assert_eq!(cart.len(), 3);

        Ok(())
    }

    #[test]
    fn incomplete_bundles_discount_what_is_available() -> TestResult {
        let mut cart = Cart::with_items(
            [line(&["shirt"], 2_000, 6)?, line(&["hat"], 1_000, 5)?],
            USD,
        )?;

        let outcome = definition(2, 2, true)?.evaluate(&mut cart)?;

        assert!(matches!(outcome, CampaignOutcome::Applied { bundles: 3, .. }));
        assert_eq!(outcome.discounted_quantity(), 5);
        assert_eq!(cart.len(), 2);

        Ok(())
    }

    #[test]
    fn cheapest_get_units_are_discounted_first() -> TestResult {
        let mut cart = Cart::new(USD);
        cart.push(line(&["shirt"], 2_000, 1)?)?;
        let pricey = cart.push(line(&["hat"], 3_000, 1)?)?;
        let cheap = cart.push(line(&["hat"], 1_000, 1)?)?;

        definition(1, 1, false)?.evaluate(&mut cart)?;

        assert!(cart.get(cheap).ok_or("missing cheap hat")?.is_discounted());
        assert!(!cart.get(pricey).ok_or("missing pricey hat")?.is_discounted());

        Ok(())
    }

    #[test]
    fn line_matching_both_sides_counts_twice() -> TestResult {
        let mut cart = Cart::with_items([line(&["shirt", "hat"], 1_000, 2)?], USD)?;

        let outcome = definition(1, 1, false)?.evaluate(&mut cart)?;

        // 2 buy offers and 2 get offers; both units of the same line are discounted.
        assert_eq!(outcome.discounted_quantity(), 2);

        Ok(())
    }

    #[test]
    fn invalid_selector_leaves_cart_untouched() -> TestResult {
        let mut cart = Cart::with_items(
            [line(&["shirt"], 1_000, 2)?, line(&["hat"], 1_000, 2)?],
            USD,
        )?;
        let mut bogus = definition(1, 1, false)?;
        bogus.get.selector.kind = "bogus".to_string();

        let result = bogus.evaluate(&mut cart);

        assert_eq!(
            result,
            Err(CampaignError::Selector(SelectorError::InvalidSelectorKind(
                "bogus".to_string()
            )))
        );
        assert_eq!(cart.subtotal()?.to_minor_units(), 4_000);

        Ok(())
    }

    #[test]
    fn invalid_selector_errors_on_an_empty_cart() -> TestResult {
        let mut cart = Cart::new(USD);
        let mut bogus = definition(1, 1, false)?;
        bogus.buy.selector.kind = "bogus".to_string();

        // Selectors are built before the cart is read, so there is no empty-cart shortcut.
        let result = bogus.evaluate(&mut cart);

        assert_eq!(
            result,
            Err(CampaignError::Selector(SelectorError::InvalidSelectorKind(
                "bogus".to_string()
            )))
        );
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn run_reports_each_definition() -> TestResult {
        let mut cart = Cart::with_items(
            [line(&["shirt"], 2_000, 2)?, line(&["hat"], 1_000, 2)?],
            USD,
        )?;
        let campaign = BundleCampaign::new(
            "Hats",
            vec![definition(1, 1, false)?, definition(5, 1, false)?],
        );

        let report = campaign.run(&mut cart)?;

        assert_eq!(report.name, "Hats");
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.discounted_quantity(), 2);
        assert_eq!(
            report.outcomes.get(1),
            Some(&CampaignOutcome::Skipped(SkipReason::NoBundles))
        );

        Ok(())
    }

    #[test]
    fn definition_deserializes_from_yaml() -> TestResult {
        let yaml = r"
buy:
  match_type: include
  type: product_id
  values: [7711893487793]
  quantity: 1
get:
  type: product_id
  values: [7712977518769]
  quantity: 5
  allow_incomplete_bundle: true
discount:
  type: dollar
  amount: 30
  message: $30 Off Lens with Purchase of Havok!
";
        let definition: BundleDefinition = serde_norway::from_str(yaml)?;

        assert_eq!(definition.buy.quantity.get(), 1);
        assert_eq!(definition.get.quantity.get(), 5);
        assert!(definition.get.allow_incomplete_bundle);
        assert_eq!(definition.get.selector.match_type, MatchType::Include);
        assert_eq!(definition.discount.kind, DiscountKind::Flat);

        Ok(())
    }

    #[test]
    fn zero_quantities_are_rejected_at_load() {
        let yaml = r"
buy: { type: all, quantity: 0 }
get: { type: all, quantity: 1 }
discount: { type: percent, amount: 10, message: nope }
";
        let result: Result<BundleDefinition, _> = serde_norway::from_str(yaml);

        assert!(result.is_err());
    }
}
