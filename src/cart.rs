//! Cart
//!
//! An ordered collection of line items. Lines are addressed by [`LineItemKey`], which stays valid
//! when other lines are inserted, so callers never have to re-resolve indexes after a split.

use rusty_money::{Money, iso::Currency};
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

use crate::{
    items::LineItem,
    pricing::{TotalPriceError, total_price},
};

new_key_type! {
    /// Line Item Key
    pub struct LineItemKey;
}

/// Errors related to cart construction or mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// A line's currency differs from the cart currency (line currency, cart currency).
    #[error("line item has currency {0}, but cart has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// The key does not refer to a line in this cart.
    #[error("line item {0:?} is not in the cart")]
    UnknownLineItem(LineItemKey),
}

/// Cart
#[derive(Debug, Clone)]
pub struct Cart<'a> {
    currency: &'static Currency,
    lines: SlotMap<LineItemKey, LineItem<'a>>,
    order: Vec<LineItemKey>,
}

impl<'a> Cart<'a> {
    /// Create an empty cart.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            currency,
            lines: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    /// Create a cart holding `items`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if any line is priced in another currency.
    pub fn with_items(
        items: impl IntoIterator<Item = LineItem<'a>>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let mut cart = Self::new(currency);

        for item in items {
            cart.push(item)?;
        }

        Ok(cart)
    }

    /// Append a line to the end of the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if the line is priced in another currency.
    pub fn push(&mut self, item: LineItem<'a>) -> Result<LineItemKey, CartError> {
        self.ensure_currency(&item)?;

        let key = self.lines.insert(item);
        self.order.push(key);

        Ok(key)
    }

    /// Insert `item` directly after the line at `after`.
    ///
    /// # Errors
    ///
    /// - [`CartError::UnknownLineItem`]: `after` is not in this cart.
    /// - [`CartError::CurrencyMismatch`]: the line is priced in another currency.
    pub fn insert_after(
        &mut self,
        after: LineItemKey,
        item: LineItem<'a>,
    ) -> Result<LineItemKey, CartError> {
        let position = self
            .position(after)
            .ok_or(CartError::UnknownLineItem(after))?;

        self.ensure_currency(&item)?;

        let key = self.lines.insert(item);
        self.order.insert(position + 1, key);

        Ok(key)
    }

    /// Current index of the line at `key`.
    pub fn position(&self, key: LineItemKey) -> Option<usize> {
        self.order.iter().position(|candidate| *candidate == key)
    }

    /// Line at `key`.
    pub fn get(&self, key: LineItemKey) -> Option<&LineItem<'a>> {
        self.lines.get(key)
    }

    /// Line at `key`, mutably.
    pub fn get_mut(&mut self, key: LineItemKey) -> Option<&mut LineItem<'a>> {
        self.lines.get_mut(key)
    }

    /// Line keys in cart order.
    pub fn keys(&self) -> &[LineItemKey] {
        &self.order
    }

    /// Lines with their keys, in cart order.
    pub fn iter(&self) -> impl Iterator<Item = (LineItemKey, &LineItem<'a>)> {
        self.order
            .iter()
            .filter_map(|key| self.lines.get(*key).map(|line| (*key, line)))
    }

    /// Lines in cart order.
    pub fn line_items(&self) -> impl Iterator<Item = &LineItem<'a>> {
        self.iter().map(|(_, line)| line)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.line_items().map(|line| u64::from(line.quantity())).sum()
    }

    /// Cart currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Sum of current line prices.
    ///
    /// # Errors
    ///
    /// Returns a [`TotalPriceError`] if money arithmetic fails.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, TotalPriceError> {
        total_price(self.line_items().map(LineItem::line_price), self.currency)
    }

    /// Sum of line prices before any adjustments.
    ///
    /// # Errors
    ///
    /// Returns a [`TotalPriceError`] if money arithmetic fails.
    pub fn original_subtotal(&self) -> Result<Money<'a, Currency>, TotalPriceError> {
        total_price(
            self.line_items().map(LineItem::original_line_price),
            self.currency,
        )
    }

    fn ensure_currency(&self, item: &LineItem<'a>) -> Result<(), CartError> {
        let item_currency = item.line_price().currency();

        if item_currency == self.currency {
            Ok(())
        } else {
            Err(CartError::CurrencyMismatch(
                item_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ))
        }
    }
}
