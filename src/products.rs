//! Products

use std::{fmt, sync::Arc};

use rusty_money::{Money, iso::Currency};
use serde::Deserialize;

use crate::tags::{TagSet, normalize};

/// Product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

/// Variant identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct VariantId(pub u64);

/// Selling plan identifier, present on subscription line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct SellingPlanId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Product
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    vendor: String,
    product_type: String,
    tags: TagSet,
}

impl Product {
    /// Create a new product. Tags are normalized on the way in.
    pub fn new(
        id: ProductId,
        vendor: impl Into<String>,
        product_type: impl Into<String>,
        tags: TagSet,
    ) -> Self {
        Self {
            id,
            vendor: vendor.into(),
            product_type: product_type.into(),
            tags,
        }
    }

    /// Product id
    pub fn id(&self) -> ProductId {
        self.id
    }

    /// Vendor as entered.
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// Product type as entered.
    pub fn product_type(&self) -> &str {
        &self.product_type
    }

    /// Normalized vendor, for matching.
    pub fn normalized_vendor(&self) -> String {
        normalize(&self.vendor)
    }

    /// Normalized product type, for matching.
    pub fn normalized_type(&self) -> String {
        normalize(&self.product_type)
    }

    /// Product tags
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }
}

/// A purchasable variant of a product, with its own unit price.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant<'a> {
    id: VariantId,
    price: Money<'a, Currency>,
    product: Arc<Product>,
}

impl<'a> Variant<'a> {
    /// Create a new variant of `product`.
    pub fn new(id: VariantId, price: Money<'a, Currency>, product: Arc<Product>) -> Self {
        Self { id, price, product }
    }

    /// Variant id
    pub fn id(&self) -> VariantId {
        self.id
    }

    /// Unit price
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.price
    }

    /// The product this variant belongs to.
    pub fn product(&self) -> &Product {
        &self.product
    }
}
