//! # partsdesk-client: REST Client & Page Controllers for PartsDesk
//!
//! The half of the dashboard that talks to the backend: the typed REST
//! client, the session context and route guard, one generic list-page
//! controller, and the store that pages share.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Client Architecture                              │
//! │                                                                         │
//! │  navigation ──► Gatekeeper::check(path)                                │
//! │                    │  verify cookie via /api/auth/me, then decide()    │
//! │                    ▼                                                    │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 Page controllers (one per screen)                │  │
//! │  │                                                                  │  │
//! │  │   ListPage<ProductsApi>   ListPage<ResourceApi<Brand>>   ...     │  │
//! │  │   debounced search • clamped paging • optimistic delete          │  │
//! │  │   newest request wins                                            │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  api/*         │  │  Store         │  │  checkout              │    │
//! │  │                │  │                │  │                        │    │
//! │  │ One accessor   │  │ Sale cart      │  │ cart → NewSale → POST  │    │
//! │  │ per route      │  │ Current user   │  │ clear cart, refresh    │    │
//! │  │ family         │  │ Cached lists   │  │ product cache          │    │
//! │  │                │  │ Low-stock badge│  │                        │    │
//! │  └───────┬────────┘  └────────────────┘  └────────────────────────┘    │
//! │          ▼                                                              │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  ApiClient: reqwest, `token` cookie, error bodies, list shapes   │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Client configuration (TOML file + env overrides)
//! - [`error`] - Client error types and banner codes
//! - [`http`] - `ApiClient`, cookie handling, response normalization
//! - [`api`] - Typed accessors per backend route family
//! - [`session`] - `AuthContext` and the request-time `Gatekeeper`
//! - [`debounce`] - Keystroke debouncer on tokio time
//! - [`listing`] - `ListPage`, the data-fetch pattern of every table
//! - [`store`] - Cross-page state
//! - [`checkout`] - Cart submission
//! - [`telemetry`] - `tracing` subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use partsdesk_client::{ApiClient, AuthContext, ClientConfig, Gatekeeper, ListPage};
//! use partsdesk_core::LoginRequest;
//!
//! let config = ClientConfig::load_or_default(None);
//! let api = ApiClient::new(&config)?;
//!
//! let auth = AuthContext::new(api.clone());
//! auth.login(&LoginRequest { username, password }).await?;
//!
//! let gate = Gatekeeper::new(auth.clone());
//! if gate.check("/products").await.is_allowed() {
//!     let page = ListPage::new(api.products(), &config);
//!     page.load().await;
//!     page.search("brake").await;
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod checkout;
pub mod config;
pub mod debounce;
pub mod error;
pub mod http;
pub mod listing;
pub mod session;
pub mod store;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{AuthApi, DebtorsApi, ProductsApi, ResourceApi, SaleReceipt, SalesApi, UsersApi};
pub use checkout::CheckoutRequest;
pub use config::ClientConfig;
pub use debounce::Debouncer;
pub use error::{ClientError, ClientResult, ErrorCode};
pub use http::{ApiClient, Page};
pub use listing::{ErrorBanner, ListPage, ListSnapshot, ListSource, LoadOutcome};
pub use session::{AuthContext, Gatekeeper};
pub use store::Store;
