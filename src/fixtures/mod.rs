//! Fixtures
//!
//! YAML fixture sets for tests and demos. A set named `havok` is read from
//! `products/havok.yml`, `carts/havok.yml` and `campaigns/havok.yml` under the base path.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::debug;

use crate::{
    campaigns::{BundleCampaign, Campaign},
    cart::{Cart, CartError},
    fixtures::{campaigns::CampaignsFixture, carts::CartFixture, products::ProductsFixture},
    items::{LineItem, LineItemError},
    products::{Product, Variant},
    runner::CampaignRunner,
    tags::TagSet,
};

pub mod campaigns;
pub mod carts;
pub mod products;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Variant key defined twice
    #[error("Duplicate variant: {0}")]
    DuplicateVariant(String),

    /// Variant not found
    #[error("Variant not found: {0}")]
    VariantNotFound(String),

    /// Currency mismatch between products
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No products loaded yet
    #[error("No products loaded yet; currency unknown")]
    NoCurrency,

    /// Line item could not be built
    #[error("Invalid line item: {0}")]
    LineItem(#[from] LineItemError),

    /// Cart creation error
    #[error("Failed to create cart: {0}")]
    Cart(#[from] CartError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Variant key -> variant
    variants: FxHashMap<String, Arc<Variant<'a>>>,

    /// Pre-built lines, in cart order
    lines: Vec<LineItem<'a>>,

    /// Campaigns, in run order
    campaigns: Vec<BundleCampaign>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl<'a> Fixture<'a> {
    /// Create an empty fixture reading from `base_path`
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            variants: FxHashMap::default(),
            lines: Vec::new(),
            campaigns: Vec::new(),
            currency: None,
        }
    }

    /// Load products, cart and campaigns for the set `name` from `base_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the three files cannot be read or parsed.
    pub fn from_set_at(base_path: impl Into<PathBuf>, name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::with_base_path(base_path);

        fixture
            .load_products(name)?
            .load_cart(name)?
            .load_campaigns(name)?;

        Ok(fixture)
    }

    /// Load products and their variants from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a price is invalid, a variant key
    /// is repeated, or the prices use more than one currency.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: ProductsFixture = read_yaml(&self.base_path, "products", name)?;

        for (product_key, product_fixture) in fixture.products {
            let product = Arc::new(Product::new(
                product_fixture.id,
                product_fixture.vendor,
                product_fixture.product_type,
                product_fixture.tags.iter().collect::<TagSet>(),
            ));

            for (variant_key, variant_fixture) in product_fixture.variants {
                let (minor_units, currency) = products::parse_price(&variant_fixture.price)?;

                self.ensure_currency(currency)?;

                if self.variants.contains_key(&variant_key) {
                    return Err(FixtureError::DuplicateVariant(variant_key));
                }

                let variant = Variant::new(
                    variant_fixture.id,
                    Money::from_minor(minor_units, currency),
                    Arc::clone(&product),
                );

                self.variants.insert(variant_key, Arc::new(variant));
            }

            debug!(product = %product_key, "loaded fixture product");
        }

        Ok(self)
    }

    /// Load cart lines from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, a referenced variant doesn't
    /// exist, or a line has zero quantity.
    pub fn load_cart(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CartFixture = read_yaml(&self.base_path, "carts", name)?;

        for line_fixture in fixture.lines {
            let variant = self
                .variants
                .get(&line_fixture.variant)
                .ok_or_else(|| FixtureError::VariantNotFound(line_fixture.variant.clone()))?;

            let mut line = LineItem::new(Arc::clone(variant), line_fixture.quantity)?;

            if let Some(selling_plan_id) = line_fixture.selling_plan_id {
                line = line.with_selling_plan(selling_plan_id);
            }

            self.lines.push(line);
        }

        Ok(self)
    }

    /// Load campaigns from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_campaigns(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CampaignsFixture = read_yaml(&self.base_path, "campaigns", name)?;

        self.campaigns.extend(fixture.campaigns);

        Ok(self)
    }

    /// Build a cart holding the loaded lines.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::NoCurrency`] if no products were loaded.
    pub fn cart(&self) -> Result<Cart<'a>, FixtureError> {
        let currency = self.currency.ok_or(FixtureError::NoCurrency)?;

        Ok(Cart::with_items(self.lines.iter().cloned(), currency)?)
    }

    /// Loaded campaigns, in run order.
    pub fn campaigns(&self) -> &[BundleCampaign] {
        &self.campaigns
    }

    /// A runner for the loaded campaigns.
    pub fn runner(&self) -> CampaignRunner {
        CampaignRunner::new(
            self.campaigns
                .iter()
                .cloned()
                .map(|campaign| Box::new(campaign) as Box<dyn Campaign>)
                .collect(),
        )
    }

    /// Variant by fixture key.
    pub fn variant(&self, key: &str) -> Option<&Arc<Variant<'a>>> {
        self.variants.get(key)
    }

    /// Currency of the fixture set, once products are loaded.
    pub fn currency(&self) -> Option<&'static Currency> {
        self.currency
    }

    fn ensure_currency(&mut self, currency: &'static Currency) -> Result<(), FixtureError> {
        match self.currency {
            Some(existing) if existing != currency => Err(FixtureError::CurrencyMismatch(
                existing.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            )),
            Some(_) => Ok(()),
            None => {
                self.currency = Some(currency);
                Ok(())
            }
        }
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(
    base_path: &Path,
    kind: &str,
    name: &str,
) -> Result<T, FixtureError> {
    let file_path = base_path.join(kind).join(format!("{name}.yml"));
    let contents = fs::read_to_string(&file_path)?;

    Ok(serde_norway::from_str(&contents)?)
}
