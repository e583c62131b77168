//! # Domain Types
//!
//! Records mirrored from the REST API. The dashboard holds no authoritative
//! state: every type here is a copy of what the backend returned, or a
//! draft about to be sent to it.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Reference lists        Inventory            Selling                    │
//! │  ───────────────        ─────────            ───────                    │
//! │  Brand                  Product ──┐          Sale ──► SaleItem          │
//! │  Supplier               ProductDraft         SaleSummary                │
//! │  Shelf                            │          NewSale ─► NewSaleItem     │
//! │  CompatibleModel ◄────────────────┘          PaymentStatus              │
//! │                                                                         │
//! │  Credit                 Spending             Access                     │
//! │  ──────                 ────────             ──────                     │
//! │  Debtor (khata)         Expense              User ──► Role              │
//! │  KhataTransaction       ExpenseDraft         LoginRequest               │
//! │  DebtorPayment                               SignupRequest              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All JSON keys are camelCase. Ids are backend-assigned integers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::FieldErrors;
use crate::money::{Money, Percent};
use crate::validation;

// =============================================================================
// Reference Lists
// =============================================================================

/// A product brand (Honda, Yamaha, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Brand {
    pub id: i64,
    pub name: String,
}

/// A supplier parts are purchased from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// A physical shelf location, identified by its code (e.g. `A-03`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Shelf {
    pub id: i64,
    #[serde(alias = "name", alias = "shelfCode")]
    pub code: String,
}

/// A motorcycle model a part fits (e.g. `CD-70`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompatibleModel {
    pub id: i64,
    pub name: String,
}

/// Body for creating or renaming a brand, shelf or compatible model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NameDraft {
    pub name: String,
}

impl NameDraft {
    pub fn new(name: impl Into<String>) -> Self {
        NameDraft { name: name.into() }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(validation::validate_name("name", &self.name));
        errors.into_result()
    }
}

/// Body for creating or editing a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SupplierDraft {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl SupplierDraft {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(validation::validate_name("name", &self.name));
        if let Some(phone) = &self.phone {
            errors.check(validation::validate_phone(phone));
        }
        errors.into_result()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A spare part in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,

    /// Display name shown in tables and on receipts.
    pub name: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    #[serde(default)]
    pub brand: Option<Brand>,

    /// Models this part fits.
    #[serde(default)]
    pub compatible_models: Vec<CompatibleModel>,

    #[serde(default)]
    pub shelf: Option<Shelf>,

    /// Units on hand. Never negative on the server.
    #[serde(default)]
    pub quantity_in_stock: i64,

    #[ts(type = "number")]
    pub purchase_price: Money,

    #[ts(type = "number")]
    pub selling_price: Money,
}

impl Product {
    /// Checks if `quantity` units can be taken from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.quantity_in_stock >= quantity
    }

    /// True when stock is at or below `threshold`.
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.quantity_in_stock <= threshold
    }

    /// Stock valued at purchase price.
    pub fn stock_value(&self) -> Money {
        self.purchase_price.multiply_quantity(self.quantity_in_stock)
    }

    /// Profit per unit at current prices.
    pub fn unit_margin(&self) -> Money {
        self.selling_price - self.purchase_price
    }
}

/// Body for creating or editing a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub sku: String,
    pub brand_id: Option<i64>,
    #[serde(default)]
    pub compatible_model_ids: Vec<i64>,
    pub shelf_id: Option<i64>,
    pub quantity_in_stock: i64,
    #[ts(type = "number")]
    pub purchase_price: Money,
    #[ts(type = "number")]
    pub selling_price: Money,
}

impl ProductDraft {
    /// Checks every field and returns all failures at once, keyed by the
    /// JSON field name the form binds to.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(validation::validate_product_name(&self.name));
        errors.check(validation::validate_sku(&self.sku));
        errors.check(validation::validate_stock(self.quantity_in_stock));
        errors.check(validation::validate_price("purchasePrice", self.purchase_price));
        errors.check(validation::validate_price("sellingPrice", self.selling_price));
        errors.into_result()
    }
}

impl From<&Product> for ProductDraft {
    fn from(p: &Product) -> Self {
        ProductDraft {
            name: p.name.clone(),
            sku: p.sku.clone(),
            brand_id: p.brand.as_ref().map(|b| b.id),
            compatible_model_ids: p.compatible_models.iter().map(|m| m.id).collect(),
            shelf_id: p.shelf.as_ref().map(|s| s.id),
            quantity_in_stock: p.quantity_in_stock,
            purchase_price: p.purchase_price,
            selling_price: p.selling_price,
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// How much of a sale has been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Unpaid,
    Partial,
}

impl PaymentStatus {
    /// Derives the status from what is owed and what was handed over.
    ///
    /// ## Rules
    /// - paid ≥ total → `Paid` (a zero-total sale is paid)
    /// - paid ≤ 0 → `Unpaid`
    /// - otherwise → `Partial`
    pub fn from_amounts(total: Money, paid: Money) -> Self {
        if paid >= total {
            PaymentStatus::Paid
        } else if !paid.is_positive() {
            PaymentStatus::Unpaid
        } else {
            PaymentStatus::Partial
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A line of a persisted sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub product_id: i64,
    #[serde(default)]
    pub product_name: Option<String>,
    pub quantity: i64,
    #[ts(type = "number")]
    pub unit_price: Money,
    #[serde(default)]
    #[ts(type = "number")]
    pub discount: Percent,
    #[serde(default)]
    #[ts(type = "number")]
    pub tax: Percent,
    #[ts(type = "number")]
    pub total: Money,
}

/// A sale as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: i64,
    pub customer_name: String,
    #[serde(default)]
    pub items: Vec<SaleItem>,
    pub quantity_sold_summary: i64,
    #[ts(type = "number")]
    pub total_amount_summary: Money,
    #[serde(default)]
    #[ts(type = "number")]
    pub amount_paid: Money,
    pub payment_status: PaymentStatus,
    #[serde(with = "timestamp")]
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// What the customer still owes on this sale.
    pub fn outstanding(&self) -> Money {
        let remaining = self.total_amount_summary - self.amount_paid;
        if remaining.is_negative() {
            Money::zero()
        } else {
            remaining
        }
    }
}

/// Row of the sales-summary screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleSummary {
    pub id: i64,
    pub customer_name: String,
    pub quantity_sold_summary: i64,
    #[ts(type = "number")]
    pub total_amount_summary: Money,
    pub payment_status: PaymentStatus,
    #[serde(with = "timestamp")]
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl From<&Sale> for SaleSummary {
    fn from(sale: &Sale) -> Self {
        SaleSummary {
            id: sale.id,
            customer_name: sale.customer_name.clone(),
            quantity_sold_summary: sale.quantity_sold_summary,
            total_amount_summary: sale.total_amount_summary,
            payment_status: sale.payment_status,
            created_at: sale.created_at,
        }
    }
}

/// Line of a sale being submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewSaleItem {
    pub product_id: i64,
    pub quantity: i64,
    #[ts(type = "number")]
    pub unit_price: Money,
    #[ts(type = "number")]
    pub discount: Percent,
    #[ts(type = "number")]
    pub tax: Percent,
    #[ts(type = "number")]
    pub total: Money,
}

/// Body of `POST /api/v1/sales`, built from the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub items: Vec<NewSaleItem>,
    pub quantity_sold_summary: i64,
    #[ts(type = "number")]
    pub total_amount_summary: Money,
    #[ts(type = "number")]
    pub amount_paid: Money,
    pub payment_status: PaymentStatus,
}

impl NewSale {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(validation::validate_name("customerName", &self.customer_name));
        if let Some(phone) = &self.customer_phone {
            errors.check(validation::validate_phone(phone));
        }
        if self.items.is_empty() {
            errors.insert("items", "at least one item is required");
        }
        if self.amount_paid.is_negative() {
            errors.insert("amountPaid", "amountPaid must not be negative");
        }
        errors.into_result()
    }
}

/// Body of the payment-status endpoint, the only client-side mutation of a
/// persisted sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusUpdate {
    pub payment_status: PaymentStatus,
    #[ts(type = "number")]
    pub amount_paid: Money,
}

// =============================================================================
// Khata (Debtors)
// =============================================================================

/// One credit entry in a customer's khata, usually one unpaid sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct KhataTransaction {
    pub id: i64,
    #[serde(default)]
    pub sale_id: Option<i64>,
    #[ts(type = "number")]
    pub amount: Money,
    #[serde(default)]
    #[ts(type = "number")]
    pub paid: Money,
    #[ts(type = "number")]
    pub remaining: Money,
    #[serde(with = "timestamp")]
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
}

impl KhataTransaction {
    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::from_amounts(self.amount, self.paid)
    }
}

/// A customer with an outstanding balance.
///
/// ## Invariant
/// `total_credit == Σ transactions.remaining` (see [`crate::khata`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Debtor {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[ts(type = "number")]
    pub total_credit: Money,
    #[serde(default)]
    pub transactions: Vec<KhataTransaction>,
}

/// Body of `POST /api/v1/debtors/{id}/payments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DebtorPayment {
    #[ts(type = "number")]
    pub amount: Money,
    pub note: Option<String>,
}

// =============================================================================
// Expense
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i64,
    pub description: String,
    #[ts(type = "number")]
    pub amount: Money,
    pub category: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDraft {
    pub description: String,
    #[ts(type = "number")]
    pub amount: Money,
    pub category: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
}

impl ExpenseDraft {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(validation::validate_name("description", &self.description));
        errors.check(validation::validate_payment_amount("amount", self.amount));
        errors.check(validation::validate_name("category", &self.category));
        errors.into_result()
    }
}

// =============================================================================
// Users & Roles
// =============================================================================

/// Access role claim as the backend spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Role {
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_USER")]
    User,
}

/// An authenticated dashboard user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(validation::validate_username(&self.username));
        if self.password.is_empty() {
            errors.insert("password", "password is required");
        }
        errors.into_result()
    }
}

/// Body of `POST /api/auth/signup` (admin-only screen).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub roles: Vec<Role>,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(validation::validate_username(&self.username));
        errors.check(validation::validate_password(&self.password));
        if self.roles.is_empty() {
            errors.insert("roles", "at least one role is required");
        }
        errors.into_result()
    }
}

/// Body of `PUT /api/auth/users/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub roles: Option<Vec<Role>>,
}

// =============================================================================
// Timestamps
// =============================================================================

/// Timestamps arrive either as RFC 3339 (`2024-05-01T10:00:00Z`) or as a
/// zone-less local date-time (`2024-05-01T10:00:00`); the latter is read as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        serde_json::from_str(
            r#"{
                "id": 7,
                "name": "Brake Shoe CD-70",
                "sku": "BS-CD70",
                "brand": {"id": 1, "name": "Honda"},
                "compatibleModels": [{"id": 3, "name": "CD-70"}],
                "shelf": {"id": 2, "shelfCode": "A-03"},
                "quantityInStock": 4,
                "purchasePrice": 350,
                "sellingPrice": 450.5
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_product_from_api_json() {
        let product = sample_product();
        assert_eq!(product.brand.as_ref().unwrap().name, "Honda");
        assert_eq!(product.shelf.as_ref().unwrap().code, "A-03");
        assert_eq!(product.selling_price, Money::from_paisa(45_050));
        assert_eq!(product.stock_value(), Money::from_major_minor(1400, 0));
        assert_eq!(product.unit_margin(), Money::from_paisa(10_050));
    }

    #[test]
    fn test_product_stock_checks() {
        let product = sample_product();
        assert!(product.can_sell(4));
        assert!(!product.can_sell(5));
        assert!(!product.can_sell(0));
        assert!(product.is_low_stock(5));
        assert!(!product.is_low_stock(3));
    }

    #[test]
    fn test_product_draft_validation_collects_fields() {
        let mut draft = ProductDraft::from(&sample_product());
        assert!(draft.validate().is_ok());

        draft.name = String::new();
        draft.sku = "has space".to_string();
        draft.selling_price = Money::from_paisa(-1);
        let errors = draft.validate().unwrap_err();
        assert!(errors.get("name").is_some());
        assert!(errors.get("sku").is_some());
        assert!(errors.get("sellingPrice").is_some());
        assert!(errors.get("purchasePrice").is_none());
    }

    #[test]
    fn test_payment_status_from_amounts() {
        let total = Money::from_paisa(10_000);
        assert_eq!(PaymentStatus::from_amounts(total, total), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from_amounts(total, Money::zero()), PaymentStatus::Unpaid);
        assert_eq!(
            PaymentStatus::from_amounts(total, Money::from_paisa(100)),
            PaymentStatus::Partial
        );
        assert_eq!(
            PaymentStatus::from_amounts(Money::zero(), Money::zero()),
            PaymentStatus::Paid
        );
        assert_eq!(serde_json::to_string(&PaymentStatus::Partial).unwrap(), "\"PARTIAL\"");
    }

    #[test]
    fn test_user_roles() {
        let user: User =
            serde_json::from_str(r#"{"id":1,"username":"admin","roles":["ROLE_ADMIN","ROLE_USER"]}"#)
                .unwrap();
        assert!(user.is_admin());
        assert!(user.has_role(Role::User));

        let clerk: User = serde_json::from_str(r#"{"id":2,"username":"clerk","roles":["ROLE_USER"]}"#)
            .unwrap();
        assert!(!clerk.is_admin());
    }

    #[test]
    fn test_timestamps_with_and_without_zone() {
        assert!(timestamp::parse("2024-05-01T10:00:00Z").is_some());
        assert!(timestamp::parse("2024-05-01T10:00:00.123").is_some());
        assert!(timestamp::parse("2024-05-01T15:00:00+05:00").is_some());
        assert!(timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn test_sale_outstanding_never_negative() {
        let sale: Sale = serde_json::from_str(
            r#"{
                "id": 1,
                "customerName": "Ali",
                "quantitySoldSummary": 3,
                "totalAmountSummary": 1000,
                "amountPaid": 1200,
                "paymentStatus": "PAID",
                "createdAt": "2024-05-01T10:00:00"
            }"#,
        )
        .unwrap();
        assert_eq!(sale.outstanding(), Money::zero());
        assert_eq!(SaleSummary::from(&sale).quantity_sold_summary, 3);
    }
}
