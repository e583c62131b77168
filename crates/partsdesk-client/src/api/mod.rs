//! # Resource APIs
//!
//! One accessor per backend route family, hung off [`ApiClient`].
//!
//! ## Access Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Page controller                                                       │
//! │       │                                                                 │
//! │       │  api.products().list(&query)                                   │
//! │       ▼                                                                 │
//! │  ProductsApi ────────────── /api/v1/products[/{id}|/low-stock]         │
//! │  SalesApi ───────────────── /api/v1/sales[/{id}/payment-status]        │
//! │                             /api/v1/sales-summary                      │
//! │  DebtorsApi ─────────────── /api/v1/debtors[/{id}/payments]            │
//! │  AuthApi ────────────────── /api/auth/login|logout|me|signup           │
//! │  UsersApi ───────────────── /api/auth/users[/{id}]                     │
//! │  ResourceApi<T> ─────────── brands, suppliers, shelf,                  │
//! │                             compatible-models, expenses                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiClient (shared pool + token)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Accessors are cheap: each holds a clone of the client.

pub mod auth;
pub mod debtors;
pub mod products;
pub mod resource;
pub mod sales;
pub mod users;

use partsdesk_core::{
    Brand, CompatibleModel, Debtor, Expense, ExpenseDraft, FieldErrors, NameDraft, NewSale,
    Product, ProductDraft, Sale, SaleSummary, Shelf, SignupRequest, Supplier, SupplierDraft, User,
    UserUpdate,
};
use serde::Serialize;

use crate::http::ApiClient;

pub use auth::AuthApi;
pub use debtors::DebtorsApi;
pub use products::ProductsApi;
pub use resource::ResourceApi;
pub use sales::{SaleReceipt, SalesApi};
pub use users::UsersApi;

// =============================================================================
// Routes
// =============================================================================

pub mod routes {
    pub const PRODUCTS: &str = "/api/v1/products";
    pub const LOW_STOCK: &str = "/api/v1/products/low-stock";
    pub const BRANDS: &str = "/api/v1/brands";
    pub const SUPPLIERS: &str = "/api/v1/suppliers";
    pub const SHELVES: &str = "/api/v1/shelf";
    pub const COMPATIBLE_MODELS: &str = "/api/v1/compatible-models";
    pub const SALES: &str = "/api/v1/sales";
    pub const SALES_SUMMARY: &str = "/api/v1/sales-summary";
    pub const EXPENSES: &str = "/api/v1/expenses";
    pub const DEBTORS: &str = "/api/v1/debtors";
    pub const LOGIN: &str = "/api/auth/login";
    pub const LOGOUT: &str = "/api/auth/logout";
    pub const ME: &str = "/api/auth/me";
    pub const SIGNUP: &str = "/api/auth/signup";
    pub const USERS: &str = "/api/auth/users";
}

// =============================================================================
// Shared Traits
// =============================================================================

/// Records with a backend id.
pub trait Identified {
    fn id(&self) -> i64;
}

macro_rules! impl_identified {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identified for $ty {
                fn id(&self) -> i64 {
                    self.id
                }
            }
        )*
    };
}

impl_identified!(
    Brand,
    Supplier,
    Shelf,
    CompatibleModel,
    Product,
    Sale,
    SaleSummary,
    Expense,
    Debtor,
    User,
);

/// Request bodies that are checked before they are sent.
pub trait Draft: Serialize + Send + Sync {
    fn validate(&self) -> Result<(), FieldErrors>;
}

macro_rules! impl_draft {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Draft for $ty {
                fn validate(&self) -> Result<(), FieldErrors> {
                    <$ty>::validate(self)
                }
            }
        )*
    };
}

impl_draft!(
    NameDraft,
    SupplierDraft,
    ProductDraft,
    ExpenseDraft,
    NewSale,
    SignupRequest,
);

impl Draft for UserUpdate {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(username) = &self.username {
            errors.check(partsdesk_core::validation::validate_username(username));
        }
        if matches!(&self.roles, Some(roles) if roles.is_empty()) {
            errors.insert("roles", "at least one role is required");
        }
        errors.into_result()
    }
}

// =============================================================================
// Accessors
// =============================================================================

impl ApiClient {
    pub fn products(&self) -> ProductsApi {
        ProductsApi::new(self.clone())
    }

    pub fn brands(&self) -> ResourceApi<Brand> {
        ResourceApi::new(self.clone(), routes::BRANDS)
    }

    pub fn suppliers(&self) -> ResourceApi<Supplier> {
        ResourceApi::new(self.clone(), routes::SUPPLIERS)
    }

    pub fn shelves(&self) -> ResourceApi<Shelf> {
        ResourceApi::new(self.clone(), routes::SHELVES)
    }

    pub fn compatible_models(&self) -> ResourceApi<CompatibleModel> {
        ResourceApi::new(self.clone(), routes::COMPATIBLE_MODELS)
    }

    pub fn expenses(&self) -> ResourceApi<Expense> {
        ResourceApi::new(self.clone(), routes::EXPENSES)
    }

    /// Read-only sales summary rows.
    pub fn sales_summary(&self) -> ResourceApi<SaleSummary> {
        ResourceApi::new(self.clone(), routes::SALES_SUMMARY)
    }

    pub fn sales(&self) -> SalesApi {
        SalesApi::new(self.clone())
    }

    pub fn debtors(&self) -> DebtorsApi {
        DebtorsApi::new(self.clone())
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partsdesk_core::Role;

    #[test]
    fn test_user_update_validation() {
        let ok = UserUpdate {
            username: Some("cashier2".to_string()),
            email: None,
            roles: Some(vec![Role::User]),
        };
        assert!(Draft::validate(&ok).is_ok());

        let bad = UserUpdate {
            username: Some("x".to_string()),
            email: None,
            roles: Some(Vec::new()),
        };
        let errors = Draft::validate(&bad).unwrap_err();
        assert!(errors.get("username").is_some());
        assert!(errors.get("roles").is_some());
    }

    #[test]
    fn test_draft_delegates_to_record_rules() {
        let draft = NameDraft::new("   ");
        assert!(Draft::validate(&draft).is_err());
    }
}
