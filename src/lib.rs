//! Trellis
//!
//! Trellis evaluates "buy V of W, get X of Y for Z% or $Z off" campaigns against a cart, and
//! rewrites the cart's line items to carry the discounts they earn.
//!
//! Campaigns run in order through a [`runner::CampaignRunner`]. Each bundle definition picks its
//! buy and get lines with [`selectors::ProductSelector`]s, works out how many bundles were earned,
//! and hands the discount to a [`distribution::DiscountLoop`], which discounts the cheapest get
//! units first and splits the one line where the discounted quantity runs out.

pub mod campaigns;
pub mod cart;
pub mod discounts;
pub mod distribution;
pub mod fixtures;
pub mod items;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod runner;
pub mod selectors;
pub mod tags;
pub mod utils;
