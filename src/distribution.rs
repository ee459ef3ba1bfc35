//! Discount Distribution
//!
//! Spreads a number of discounted units over an ordered list of candidate lines, splitting the
//! line where the count runs out.

use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use crate::{
    cart::{Cart, CartError, LineItemKey},
    discounts::{DiscountApplicator, DiscountError},
    items::LineItemError,
};

/// Errors raised while distributing a discount.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DistributionError {
    /// A candidate key is missing from the cart, or the split could not be inserted.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The boundary line could not be split.
    #[error(transparent)]
    LineItem(#[from] LineItemError),

    /// The discount could not be applied.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// What a distribution pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    /// Units discounted across all touched lines.
    pub discounted_quantity: u64,

    /// Lines that received the discount, in the order they were discounted.
    pub discounted_lines: SmallVec<[LineItemKey; 4]>,

    /// The line split off at the boundary, if any.
    pub split: Option<LineItemKey>,
}

/// Applies a discount to a fixed number of units.
#[derive(Debug)]
pub struct DiscountLoop<'d> {
    applicator: &'d DiscountApplicator,
}

impl<'d> DiscountLoop<'d> {
    /// Create a loop applying `applicator`.
    pub fn new(applicator: &'d DiscountApplicator) -> Self {
        Self { applicator }
    }

    /// Discount `quantity` units of `candidates`, in the order given.
    ///
    /// Whole lines are discounted until the remaining count is smaller than a line's quantity.
    /// That line is split: the split-off part carries the remaining count, is discounted, and is
    /// inserted directly after it. At most one line is split per call.
    ///
    /// # Errors
    ///
    /// Returns a [`DistributionError`] if a candidate is not in `cart` or the discount fails.
    /// Lines discounted before the failure keep their discount.
    #[tracing::instrument(
        name = "distribution.distribute",
        skip_all,
        fields(
            quantity = quantity,
            candidates = candidates.len(),
            message = self.applicator.message()
        ),
        err
    )]
    pub fn distribute(
        &self,
        cart: &mut Cart<'_>,
        candidates: &[LineItemKey],
        quantity: u64,
    ) -> Result<Distribution, DistributionError> {
        let mut remaining = quantity;
        let mut distribution = Distribution::default();

        for &key in candidates {
            if remaining == 0 {
                break;
            }

            let line = cart.get_mut(key).ok_or(CartError::UnknownLineItem(key))?;
            let line_quantity = u64::from(line.quantity());

            if line_quantity > remaining {
                // remaining < line quantity, so it fits in a u32
                let take = u32::try_from(remaining).unwrap_or(u32::MAX);

                let mut remainder = line.clone();
                let mut split = remainder.split(take)?;
                self.applicator.apply(&mut split)?;
                *line = remainder;

                let split_key = cart.insert_after(key, split)?;

                debug!(
                    line = ?key,
                    split = ?split_key,
                    take,
                    "split line item at discount boundary"
                );

                distribution.discounted_quantity += remaining;
                distribution.discounted_lines.push(split_key);
                distribution.split = Some(split_key);

                break;
            }

            self.applicator.apply(line)?;

            debug!(line = ?key, quantity = line_quantity, "discounted whole line item");

            remaining -= line_quantity;
            distribution.discounted_quantity += line_quantity;
            distribution.discounted_lines.push(key);
        }

        Ok(distribution)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use crate::{
        discounts::{DiscountKind, DiscountSpec},
        items::LineItem,
        products::{Product, ProductId, Variant, VariantId},
        tags::TagSet,
    };

    use super::*;

    fn line(unit_minor: i64, quantity: u32) -> Result<LineItem<'static>, LineItemError> {
        let product = Arc::new(Product::new(ProductId(1), "Acme", "Lens", TagSet::empty()));
        let variant = Variant::new(VariantId(1), Money::from_minor(unit_minor, USD), product);

        LineItem::new(Arc::new(variant), quantity)
    }

    fn half_off() -> DiscountApplicator {
        DiscountApplicator::from(&DiscountSpec::new(
            DiscountKind::Percent,
            Decimal::from(50),
            "Half off",
        ))
    }

    fn quantities(cart: &Cart<'_>) -> Vec<u32> {
        cart.line_items().map(LineItem::quantity).collect()
    }

    #[test]
    fn discounts_whole_lines_when_quantity_covers_them() -> TestResult {
        let mut cart = Cart::new(USD);
        let first = cart.push(line(100, 2)?)?;
        let second = cart.push(line(100, 3)?)?;
        let applicator = half_off();

        let distribution = DiscountLoop::new(&applicator).distribute(&mut cart, &[first, second], 5)?;

        assert_eq!(distribution.discounted_quantity, 5);
        assert_eq!(distribution.split, None);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.subtotal()?.to_minor_units(), 250);

        Ok(())
    }

    #[test]
    fn splits_boundary_line_and_inserts_after_it() -> TestResult {
        let mut cart = Cart::new(USD);
        let first = cart.push(line(100, 3)?)?;
        let second = cart.push(line(200, 4)?)?;
        let last = cart.push(line(300, 1)?)?;
        let applicator = half_off();

        let distribution =
            DiscountLoop::new(&applicator).distribute(&mut cart, &[first, second], 5)?;

        let split = distribution.split.ok_or("expected a split")?;

        assert_eq!(distribution.discounted_quantity, 5);
        assert_eq!(cart.keys(), &[first, second, split, last]);
        assert_eq!(quantities(&cart), vec![3, 2, 2, 1]);

        let split_line = cart.get(split).ok_or("missing split line")?;
        let remainder = cart.get(second).ok_or("missing remainder")?;

        assert_eq!(split_line.line_price().to_minor_units(), 200);
        assert!(split_line.is_discounted());
        assert_eq!(remainder.line_price().to_minor_units(), 400);
        assert!(!remainder.is_discounted());

        Ok(())
    }

    #[test]
    fn stops_when_candidates_run_out() -> TestResult {
        let mut cart = Cart::new(USD);
        let only = cart.push(line(100, 2)?)?;
        let applicator = half_off();

        let distribution = DiscountLoop::new(&applicator).distribute(&mut cart, &[only], 10)?;

        assert_eq!(distribution.discounted_quantity, 2);
        assert_eq!(cart.len(), 1);

        Ok(())
    }

    #[test]
    fn zero_quantity_changes_nothing() -> TestResult {
        let mut cart = Cart::new(USD);
        let only = cart.push(line(100, 2)?)?;
        let applicator = half_off();

        let distribution = DiscountLoop::new(&applicator).distribute(&mut cart, &[only], 0)?;

        assert_eq!(distribution, Distribution::default());
        assert_eq!(cart.subtotal()?.to_minor_units(), 200);

        Ok(())
    }

    #[test]
    fn unknown_candidate_errors() -> TestResult {
        let mut cart = Cart::new(USD);
        cart.push(line(100, 2)?)?;
        let missing = LineItemKey::default();
        let applicator = half_off();

        let result = DiscountLoop::new(&applicator).distribute(&mut cart, &[missing], 1);

        assert_eq!(
            result,
            Err(DistributionError::Cart(CartError::UnknownLineItem(missing)))
        );

        Ok(())
    }
}
