//! Product Selectors
//!
//! Decide whether a line item matches a campaign's buy or get criteria.

use std::{fmt, str::FromStr};

use rustc_hash::FxHashSet;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    items::LineItem,
    products::{ProductId, VariantId},
    tags::{TagSet, normalize},
};

/// Errors raised while building a selector.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    /// The selector kind name is not one of the supported kinds.
    #[error("invalid product selector type: {0}")]
    InvalidSelectorKind(String),
}

/// Whether matching values are required present or required absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// The line must match the selector values.
    #[default]
    Include,

    /// The line must not match the selector values.
    Exclude,
}

/// The attribute a selector inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    /// Product tags.
    Tag,

    /// Product type.
    Type,

    /// Product vendor.
    Vendor,

    /// Product id.
    ProductId,

    /// Variant id.
    VariantId,

    /// Lines with a selling plan. Ignores match type.
    Subscription,

    /// Every line. Ignores match type.
    All,
}

impl SelectorKind {
    /// The configuration name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Type => "type",
            Self::Vendor => "vendor",
            Self::ProductId => "product_id",
            Self::VariantId => "variant_id",
            Self::Subscription => "subscription",
            Self::All => "all",
        }
    }
}

impl FromStr for SelectorKind {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "tag" => Ok(Self::Tag),
            "type" => Ok(Self::Type),
            "vendor" => Ok(Self::Vendor),
            "product_id" => Ok(Self::ProductId),
            "variant_id" => Ok(Self::VariantId),
            "subscription" => Ok(Self::Subscription),
            "all" => Ok(Self::All),
            other => Err(SelectorError::InvalidSelectorKind(other.to_string())),
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single selector value: an id, or a tag/type/vendor string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SelectorValue {
    /// Numeric product or variant id.
    Id(u64),

    /// Tag, product type or vendor.
    Text(String),
}

impl From<u64> for SelectorValue {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for SelectorValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl SelectorValue {
    fn as_text(&self) -> String {
        match self {
            Self::Id(id) => id.to_string(),
            Self::Text(text) => text.clone(),
        }
    }

    fn as_id(&self) -> Option<u64> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Text(_) => None,
        }
    }
}

/// Selector configuration as written in a campaign definition.
///
/// `kind` is kept as its raw name and only checked when a [`ProductSelector`] is built from it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectorSpec {
    /// Include or exclude.
    #[serde(default)]
    pub match_type: MatchType,

    /// Selector kind name, e.g. `"tag"` or `"product_id"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Selector values. Ignored for `subscription` and `all`.
    #[serde(default)]
    pub values: Vec<SelectorValue>,
}

impl SelectorSpec {
    /// Create a selector spec.
    pub fn new(
        match_type: MatchType,
        kind: impl Into<String>,
        values: impl IntoIterator<Item = SelectorValue>,
    ) -> Self {
        Self {
            match_type,
            kind: kind.into(),
            values: values.into_iter().collect(),
        }
    }

    /// A spec matching every line.
    pub fn all() -> Self {
        Self::new(MatchType::Include, SelectorKind::All.as_str(), [])
    }
}

#[derive(Debug, Clone)]
enum Criteria {
    Tags(TagSet),
    Types(FxHashSet<String>),
    Vendors(FxHashSet<String>),
    ProductIds(FxHashSet<ProductId>),
    VariantIds(FxHashSet<VariantId>),
    Subscription,
    All,
}

/// Matches line items against one selector spec. Values are normalized once, at construction.
#[derive(Debug, Clone)]
pub struct ProductSelector {
    match_type: MatchType,
    kind: SelectorKind,
    criteria: Criteria,
}

impl ProductSelector {
    /// Build a selector from its spec.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::InvalidSelectorKind`] if the kind name is not recognised.
    pub fn new(spec: &SelectorSpec) -> Result<Self, SelectorError> {
        let kind: SelectorKind = spec.kind.parse()?;

        let criteria = match kind {
            SelectorKind::Tag => {
                Criteria::Tags(spec.values.iter().map(SelectorValue::as_text).collect())
            }
            SelectorKind::Type => Criteria::Types(normalized_texts(&spec.values)),
            SelectorKind::Vendor => Criteria::Vendors(normalized_texts(&spec.values)),
            SelectorKind::ProductId => Criteria::ProductIds(
                spec.values
                    .iter()
                    .filter_map(SelectorValue::as_id)
                    .map(ProductId)
                    .collect(),
            ),
            SelectorKind::VariantId => Criteria::VariantIds(
                spec.values
                    .iter()
                    .filter_map(SelectorValue::as_id)
                    .map(VariantId)
                    .collect(),
            ),
            SelectorKind::Subscription => Criteria::Subscription,
            SelectorKind::All => Criteria::All,
        };

        Ok(Self {
            match_type: spec.match_type,
            kind,
            criteria,
        })
    }

    /// The selector kind.
    pub fn kind(&self) -> SelectorKind {
        self.kind
    }

    /// Check whether `line_item` satisfies this selector.
    pub fn matches(&self, line_item: &LineItem<'_>) -> bool {
        let include = self.match_type == MatchType::Include;
        let variant = line_item.variant();
        let product = variant.product();

        match &self.criteria {
            Criteria::Tags(tags) => product.tags().intersects(tags) == include,
            Criteria::Types(types) => types.contains(&product.normalized_type()) == include,
            Criteria::Vendors(vendors) => vendors.contains(&product.normalized_vendor()) == include,
            Criteria::ProductIds(ids) => ids.contains(&product.id()) == include,
            Criteria::VariantIds(ids) => ids.contains(&variant.id()) == include,
            Criteria::Subscription => line_item.selling_plan_id().is_some(),
            Criteria::All => true,
        }
    }
}

fn normalized_texts(values: &[SelectorValue]) -> FxHashSet<String> {
    values.iter().map(|value| normalize(&value.as_text())).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use crate::products::{Product, SellingPlanId, Variant};

    use super::*;

    fn line(tags: &[&str]) -> Result<LineItem<'static>, crate::items::LineItemError> {
        let product = Arc::new(Product::new(
            ProductId(123),
            "  Havok ",
            "Sunglasses",
            TagSet::from_strs(tags),
        ));
        let variant = Variant::new(VariantId(456), Money::from_minor(1_000, USD), product);

        LineItem::new(Arc::new(variant), 1)
    }

    fn selector(
        match_type: MatchType,
        kind: &str,
        values: Vec<SelectorValue>,
    ) -> Result<ProductSelector, SelectorError> {
        ProductSelector::new(&SelectorSpec::new(match_type, kind, values))
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let result = selector(MatchType::Include, "bogus", vec![]);

        assert_eq!(
            result.err(),
            Some(SelectorError::InvalidSelectorKind("bogus".to_string()))
        );
    }

    #[test]
    fn kind_is_parsed_from_its_name() -> TestResult {
        let selector = selector(MatchType::Exclude, "variant_id", vec![SelectorValue::Id(7)])?;

        assert_eq!(selector.kind(), SelectorKind::VariantId);

        Ok(())
    }

    #[test]
    fn tag_match_ignores_case_and_whitespace() -> TestResult {
        let item = line(&["Summer Sale", "Polarized"])?;

        let include = selector(MatchType::Include, "tag", vec![" POLARIZED ".into()])?;
        let exclude = selector(MatchType::Exclude, "tag", vec!["polarized".into()])?;
        let miss = selector(MatchType::Include, "tag", vec!["winter".into()])?;

        assert!(include.matches(&item));
        assert!(!exclude.matches(&item));
        assert!(!miss.matches(&item));

        Ok(())
    }

    #[test]
    fn exclude_tag_matches_untagged_product() -> TestResult {
        let item = line(&[])?;

        let exclude = selector(MatchType::Exclude, "tag", vec!["clearance".into()])?;

        assert!(exclude.matches(&item));

        Ok(())
    }

    #[test]
    fn type_and_vendor_are_normalized() -> TestResult {
        let item = line(&[])?;

        let by_type = selector(MatchType::Include, "type", vec!["sunglasses ".into()])?;
        let by_vendor = selector(MatchType::Include, "vendor", vec!["HAVOK".into()])?;
        let not_vendor = selector(MatchType::Exclude, "vendor", vec!["havok".into()])?;

        assert!(by_type.matches(&item));
        assert!(by_vendor.matches(&item));
        assert!(!not_vendor.matches(&item));

        Ok(())
    }

    #[test]
    fn product_and_variant_ids_follow_match_type() -> TestResult {
        let item = line(&[])?;

        let product = selector(MatchType::Include, "product_id", vec![SelectorValue::Id(123)])?;
        let other_product = selector(MatchType::Exclude, "product_id", vec![SelectorValue::Id(999)])?;
        let variant = selector(MatchType::Include, "variant_id", vec![SelectorValue::Id(456)])?;
        let not_variant = selector(MatchType::Exclude, "variant_id", vec![SelectorValue::Id(456)])?;

        assert!(product.matches(&item));
        assert!(other_product.matches(&item));
        assert!(variant.matches(&item));
        assert!(!not_variant.matches(&item));

        Ok(())
    }

    #[test]
    fn text_values_never_match_ids() -> TestResult {
        let item = line(&[])?;

        let product = selector(MatchType::Include, "product_id", vec!["123".into()])?;

        assert!(!product.matches(&item));

        Ok(())
    }

    #[test]
    fn subscription_ignores_match_type() -> TestResult {
        let plain = line(&[])?;
        let subscribed = line(&[])?.with_selling_plan(SellingPlanId(1));

        let include = selector(MatchType::Include, "subscription", vec![])?;
        let exclude = selector(MatchType::Exclude, "subscription", vec![])?;

        assert!(include.matches(&subscribed));
        assert!(exclude.matches(&subscribed));
        assert!(!include.matches(&plain));
        assert!(!exclude.matches(&plain));

        Ok(())
    }

    #[test]
    fn all_matches_everything() -> TestResult {
        let item = line(&["anything"])?;

        assert!(ProductSelector::new(&SelectorSpec::all())?.matches(&item));
        assert!(selector(MatchType::Exclude, "all", vec![])?.matches(&item));

        Ok(())
    }

    #[test]
    fn spec_deserializes_mixed_values() -> TestResult {
        let yaml = r"
match_type: exclude
type: product_id
values: [7711893487793, 'hats']
";
        let spec: SelectorSpec = serde_norway::from_str(yaml)?;

        assert_eq!(spec.match_type, MatchType::Exclude);
        assert_eq!(spec.kind, "product_id");
        assert_eq!(
            spec.values,
            vec![SelectorValue::Id(7_711_893_487_793), SelectorValue::from("hats")]
        );

        Ok(())
    }
}
