//! # Sale Cart
//!
//! The in-progress sale on the "New Sale" screen. Lives only until the sale
//! is submitted or the cashier navigates away.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Page Action              Operation              Effect                 │
//! │  ───────────              ─────────              ──────                 │
//! │  Pick product ──────────► add_product() ───────► stock check, add_item  │
//! │  Same product again ────► add_item() ──────────► quantity accumulates   │
//! │  Change quantity ───────► set_quantity() ──────► one line recomputed    │
//! │  Change discount/tax ───► set_discount/tax() ──► one line recomputed    │
//! │  Click remove ──────────► remove_item() ───────► line dropped           │
//! │  Submit / leave page ───► clear() ─────────────► empty cart             │
//! │                                                                         │
//! │  After EVERY operation the cart totals are re-summed from the lines.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Numeric Semantics
//! Per line, in paisa:
//! ```text
//! gross    = unit_price × qty
//! discount = round(gross × discount%)
//! tax      = round((gross − discount) × tax%)
//! total    = gross − discount + tax
//! ```
//! Cart totals are plain sums of the line values, so
//! `total == subtotal − discount + tax` holds exactly.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Percent};
use crate::types::{NewSale, NewSaleItem, PaymentStatus, Product};
use crate::validation::{validate_cart_size, validate_percent, validate_quantity};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Item
// =============================================================================

/// A line in the cart.
///
/// `unit_price`, `name` and `sku` are frozen when the line is created; a price
/// edit on the product screen does not change a sale already being composed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: i64,
    pub name: String,
    pub sku: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub discount: Percent,
    pub tax: Percent,
    line: LineAmounts,
}

/// Computed amounts of one line.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineAmounts {
    gross: Money,
    discount: Money,
    tax: Money,
    total: Money,
}

impl CartItem {
    pub fn new(
        product_id: i64,
        name: impl Into<String>,
        sku: impl Into<String>,
        unit_price: Money,
        quantity: i64,
        discount: Percent,
        tax: Percent,
    ) -> Self {
        let mut item = CartItem {
            product_id,
            name: name.into(),
            sku: sku.into(),
            unit_price,
            quantity,
            discount,
            tax,
            line: LineAmounts::default(),
        };
        item.recompute();
        item
    }

    /// Creates a line from a product at its selling price, no discount, no tax.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem::new(
            product.id,
            product.name.clone(),
            product.sku.clone(),
            product.selling_price,
            quantity,
            Percent::zero(),
            Percent::zero(),
        )
    }

    fn recompute(&mut self) {
        let gross = self.unit_price.multiply_quantity(self.quantity);
        let discount = gross.percent_of(self.discount);
        let tax = (gross - discount).percent_of(self.tax);
        self.line = LineAmounts {
            gross,
            discount,
            tax,
            total: gross - discount + tax,
        };
    }

    /// `unit_price × quantity`, before discount and tax.
    pub fn gross(&self) -> Money {
        self.line.gross
    }

    pub fn discount_amount(&self) -> Money {
        self.line.discount
    }

    pub fn tax_amount(&self) -> Money {
        self.line.tax
    }

    /// `unit_price·qty·(1−discount)·(1+tax)`, rounded per component.
    pub fn total(&self) -> Money {
        self.line.total
    }

    fn to_sale_item(&self) -> NewSaleItem {
        NewSaleItem {
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount: self.discount,
            tax: self.tax,
            total: self.total(),
        }
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Cart-wide sums shown under the cart table.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

impl CartTotals {
    fn from_items(items: &[CartItem]) -> Self {
        CartTotals {
            item_count: items.len(),
            total_quantity: items.iter().map(|i| i.quantity).sum(),
            subtotal: items.iter().map(CartItem::gross).sum(),
            discount: items.iter().map(CartItem::discount_amount).sum(),
            tax: items.iter().map(CartItem::tax_amount).sum(),
            total: items.iter().map(CartItem::total).sum(),
        }
    }
}

// =============================================================================
// Sale Cart
// =============================================================================

/// The sale being composed.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product accumulates)
/// - Every line has `1 ≤ quantity ≤ MAX_ITEM_QUANTITY`
/// - At most `MAX_CART_ITEMS` lines
/// - `totals()` always reflects the current lines
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleCart {
    items: Vec<CartItem>,
    totals: CartTotals,
}

impl SaleCart {
    pub fn new() -> Self {
        SaleCart::default()
    }

    /// Adds a line, or accumulates quantity onto the existing line for the
    /// same product.
    ///
    /// ## Errors
    /// - `Validation` if the item quantity or rates are out of range
    /// - `QuantityTooLarge` if the merged quantity exceeds the maximum
    /// - `CartTooLarge` if a new line would exceed the line limit
    pub fn add_item(&mut self, item: CartItem) -> CoreResult<()> {
        validate_quantity(item.quantity)?;
        validate_percent("discount", item.discount)?;
        validate_percent("tax", item.tax)?;

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            let new_qty = existing.quantity + item.quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            existing.quantity = new_qty;
            existing.recompute();
        } else {
            if validate_cart_size(self.items.len()).is_err() {
                return Err(CoreError::CartTooLarge {
                    max: MAX_CART_ITEMS,
                });
            }
            self.items.push(item);
        }

        self.refresh_totals();
        Ok(())
    }

    /// Adds `quantity` units of a product, refusing to sell more than is on
    /// the shelf (counting what is already in the cart).
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        let in_cart = self.get(product.id).map(|i| i.quantity).unwrap_or(0);
        let requested = in_cart + quantity;
        if quantity > 0 && !product.can_sell(requested) {
            return Err(CoreError::InsufficientStock {
                sku: product.sku.clone(),
                available: product.quantity_in_stock,
                requested,
            });
        }
        self.add_item(CartItem::from_product(product, quantity))
    }

    /// Removes a line by product id.
    pub fn remove_item(&mut self, product_id: i64) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            return Err(CoreError::ItemNotInCart(product_id));
        }

        self.refresh_totals();
        Ok(())
    }

    /// Replaces the quantity of one line. `qty` must be in `1..=999`;
    /// removing a line is [`SaleCart::remove_item`].
    pub fn set_quantity(&mut self, product_id: i64, qty: i64) -> CoreResult<()> {
        validate_quantity(qty)?;
        self.update_line(product_id, |item| item.quantity = qty)
    }

    pub fn set_discount(&mut self, product_id: i64, discount: Percent) -> CoreResult<()> {
        validate_percent("discount", discount)?;
        self.update_line(product_id, |item| item.discount = discount)
    }

    pub fn set_tax(&mut self, product_id: i64, tax: Percent) -> CoreResult<()> {
        validate_percent("tax", tax)?;
        self.update_line(product_id, |item| item.tax = tax)
    }

    fn update_line<F>(&mut self, product_id: i64, f: F) -> CoreResult<()>
    where
        F: FnOnce(&mut CartItem),
    {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or(CoreError::ItemNotInCart(product_id))?;
        f(item);
        item.recompute();
        self.refresh_totals();
        Ok(())
    }

    /// Resets to an empty cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.totals = CartTotals::default();
    }

    /// Takes the lines of an already submitted cart out of this one.
    ///
    /// Each submitted line lowers the matching line by its quantity; lines
    /// that reach zero go. Anything added after the snapshot was taken
    /// stays. Applied to an unchanged cart this is the same as `clear`.
    pub fn remove_submitted(&mut self, submitted: &[CartItem]) {
        for sold in submitted {
            if let Some(line) = self
                .items
                .iter_mut()
                .find(|i| i.product_id == sold.product_id)
            {
                line.quantity -= sold.quantity;
                line.recompute();
            }
        }
        self.items.retain(|i| i.quantity > 0);
        self.refresh_totals();
    }

    fn refresh_totals(&mut self) {
        self.totals = CartTotals::from_items(&self.items);
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn get(&self, product_id: i64) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    pub fn totals(&self) -> CartTotals {
        self.totals
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Builds the submit payload.
    ///
    /// The payment status is derived from `amount_paid` against the cart
    /// total; anything short of the total becomes khata on the server.
    pub fn to_new_sale(
        &self,
        customer_name: impl Into<String>,
        customer_phone: Option<String>,
        amount_paid: Money,
    ) -> CoreResult<NewSale> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        if amount_paid.is_negative() {
            return Err(CoreError::InvalidPaymentAmount {
                reason: "amount paid cannot be negative".to_string(),
            });
        }

        let totals = self.totals();
        Ok(NewSale {
            customer_name: customer_name.into(),
            customer_phone,
            items: self.items.iter().map(CartItem::to_sale_item).collect(),
            quantity_sold_summary: totals.total_quantity,
            total_amount_summary: totals.total,
            amount_paid,
            payment_status: PaymentStatus::from_amounts(totals.total, amount_paid),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
