//! # Inventory Rules
//!
//! Stock views used by the dashboard cards and the low-stock badge.
//! The threshold is passed in; the client reads it from configuration.

use crate::money::Money;
use crate::types::Product;

/// Products at or below `threshold`, lowest stock first.
pub fn low_stock(products: &[Product], threshold: i64) -> Vec<&Product> {
    let mut low: Vec<&Product> = products
        .iter()
        .filter(|p| p.is_low_stock(threshold))
        .collect();
    low.sort_by(|a, b| {
        a.quantity_in_stock
            .cmp(&b.quantity_in_stock)
            .then_with(|| a.name.cmp(&b.name))
    });
    low
}

/// Number of products the low-stock badge shows.
pub fn low_stock_count(products: &[Product], threshold: i64) -> usize {
    products.iter().filter(|p| p.is_low_stock(threshold)).count()
}

/// Products with nothing left on the shelf.
pub fn out_of_stock(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.quantity_in_stock <= 0).collect()
}

/// Aggregate stock figures for the inventory card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StockValuation {
    pub units: i64,
    /// Σ stock × purchase price
    pub cost_value: Money,
    /// Σ stock × selling price
    pub retail_value: Money,
}

impl StockValuation {
    pub fn potential_margin(&self) -> Money {
        self.retail_value - self.cost_value
    }
}

pub fn valuation(products: &[Product]) -> StockValuation {
    products
        .iter()
        .fold(StockValuation::default(), |mut acc, p| {
            let qty = p.quantity_in_stock.max(0);
            acc.units += qty;
            acc.cost_value += p.purchase_price.multiply_quantity(qty);
            acc.retail_value += p.selling_price.multiply_quantity(qty);
            acc
        })
}
