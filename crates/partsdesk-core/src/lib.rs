//! # partsdesk-core: Pure Business Logic for PartsDesk
//!
//! Everything in the dashboard that is a *rule* rather than a *request*
//! lives here: the sale cart, the khata ledger, pagination math, the route
//! gate policy and the record types shared with the REST API.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PartsDesk Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Rendering layer (pages, tables)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │     partsdesk-client: REST calls, session, list pages, store    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ partsdesk-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │pagination│ │auth_gate│ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └─────────┘ │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐                          │   │
//! │  │   │  khata  │ │inventory│ │validation│                          │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘                          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO TIMERS • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records mirrored from the API (Product, Sale, Debtor, ...)
//! - [`money`] - Integer paisa money and percentage rates
//! - [`cart`] - The in-progress sale cart and its totals
//! - [`khata`] - Customer credit ledger
//! - [`inventory`] - Stock rules (low stock, valuation)
//! - [`pagination`] - Page clamping, page windows, delete step-back
//! - [`auth_gate`] - Route classification and redirect decisions
//! - [`validation`] - Field rules and `{field: message}` error maps
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use partsdesk_core::cart::{CartItem, SaleCart};
//! use partsdesk_core::money::{Money, Percent};
//!
//! let mut cart = SaleCart::new();
//! cart.add_item(CartItem::new(
//!     1,
//!     "Brake Pad",
//!     "BP-125",
//!     Money::from_major_minor(100, 0),
//!     2,
//!     Percent::from_percentage(10.0),
//!     Percent::from_percentage(5.0),
//! ))
//! .unwrap();
//!
//! assert_eq!(cart.totals().total, Money::from_major_minor(189, 0));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth_gate;
pub mod cart;
pub mod error;
pub mod inventory;
pub mod khata;
pub mod money;
pub mod pagination;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, FieldErrors, ValidationError};
pub use money::{Money, Percent};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single sale cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in the cart.
///
/// ## Business Reason
/// Catches typos at the counter (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Stock level at or below which a product is flagged as low stock.
///
/// The dashboard used different thresholds on different screens; this is
/// the single default, overridable through client configuration.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Rows per page when a list screen does not ask for something else.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
