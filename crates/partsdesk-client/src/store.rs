//! # Store
//!
//! Cross-page state: the sale cart, the logged-in user, the reference lists
//! that fill dropdowns, and the low-stock badge in the sidebar.
//!
//! ## Thread Safety
//! The cart sits behind `Arc<Mutex<_>>`: only one action may change it at a
//! time. The caches are read far more often than written and use `RwLock`.
//!
//! ## Cart Actions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Page Action              Store Call                    Cart Change     │
//! │  ───────────              ──────────                    ───────────     │
//! │                                                                         │
//! │  Pick product ──────────► with_cart_mut(add_product) ─► line merged     │
//! │  Edit qty / disc / tax ─► with_cart_mut(set_*) ───────► line recomputed │
//! │  Remove line ───────────► with_cart_mut(remove_item) ─► line dropped    │
//! │  Sale submitted ────────► checkout::submit ───────────► sold lines gone │
//! │  Render totals ─────────► with_cart(totals) ──────────► (read only)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is authoritative. The caches mirror the server and are
//! refreshed after mutations that change them.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use partsdesk_core::cart::SaleCart;
use partsdesk_core::{inventory, Brand, Product, Supplier, User};
use tracing::debug;

use crate::error::ClientResult;
use crate::http::ApiClient;

/// Cached catalogue and reference lists.
#[derive(Debug, Default)]
struct Caches {
    user: Option<User>,
    products: Vec<Product>,
    brands: Vec<Brand>,
    suppliers: Vec<Supplier>,
    low_stock_count: usize,
}

#[derive(Debug, Clone)]
pub struct Store {
    cart: Arc<Mutex<SaleCart>>,
    caches: Arc<RwLock<Caches>>,
    low_stock_threshold: i64,
}

impl Store {
    pub fn new(low_stock_threshold: i64) -> Self {
        Store {
            cart: Arc::new(Mutex::new(SaleCart::new())),
            caches: Arc::new(RwLock::new(Caches::default())),
            low_stock_threshold,
        }
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.low_stock_threshold
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = store.with_cart(|cart| cart.totals());
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SaleCart) -> R,
    {
        let cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&cart)
    }

    /// Write access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// store.with_cart_mut(|cart| cart.add_product(&product, 1))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SaleCart) -> R,
    {
        let mut cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut cart)
    }

    // =========================================================================
    // User
    // =========================================================================

    pub fn current_user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn set_current_user(&self, user: Option<User>) {
        self.write().user = user;
    }

    // =========================================================================
    // Caches
    // =========================================================================

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Caches> {
        self.caches.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Caches> {
        self.caches.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn products(&self) -> Vec<Product> {
        self.read().products.clone()
    }

    pub fn product(&self, id: i64) -> Option<Product> {
        self.read().products.iter().find(|p| p.id == id).cloned()
    }

    pub fn brands(&self) -> Vec<Brand> {
        self.read().brands.clone()
    }

    pub fn suppliers(&self) -> Vec<Supplier> {
        self.read().suppliers.clone()
    }

    /// Number shown on the sidebar badge.
    pub fn low_stock_count(&self) -> usize {
        self.read().low_stock_count
    }

    /// Replaces the product cache; the badge follows it.
    pub fn set_products(&self, products: Vec<Product>) {
        let count = inventory::low_stock_count(&products, self.low_stock_threshold);
        let mut caches = self.write();
        caches.products = products;
        caches.low_stock_count = count;
    }

    /// Fills the product cache and the badge from the server.
    pub async fn refresh_products(&self, api: &ApiClient) -> ClientResult<()> {
        let products: Vec<Product> = api.products().all().await?;
        debug!(count = products.len(), "Product cache refreshed");
        self.set_products(products);
        Ok(())
    }

    /// Brands and suppliers for form dropdowns.
    pub async fn refresh_reference_lists(&self, api: &ApiClient) -> ClientResult<()> {
        let (brands_api, suppliers_api) = (api.brands(), api.suppliers());
        let (brands, suppliers) = tokio::try_join!(brands_api.all(), suppliers_api.all())?;
        debug!(
            brands = brands.len(),
            suppliers = suppliers.len(),
            "Reference lists refreshed"
        );
        let mut caches = self.write();
        caches.brands = brands;
        caches.suppliers = suppliers;
        Ok(())
    }

    /// Updates only the badge, from the low-stock endpoint.
    pub async fn refresh_low_stock(&self, api: &ApiClient) -> ClientResult<usize> {
        let low = api.products().low_stock(self.low_stock_threshold).await?;
        let count = low.len();
        self.write().low_stock_count = count;
        Ok(count)
    }

    /// Forgets everything tied to the session.
    pub fn reset(&self) {
        self.with_cart_mut(SaleCart::clear);
        *self.write() = Caches::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partsdesk_core::money::Money;

    fn product(id: i64, stock: i64) -> Product {
        Product {
            id,
            name: format!("Part {}", id),
            sku: format!("SKU-{}", id),
            brand: None,
            compatible_models: Vec::new(),
            shelf: None,
            quantity_in_stock: stock,
            purchase_price: Money::from_major_minor(80, 0),
            selling_price: Money::from_major_minor(100, 0),
        }
    }

    #[test]
    fn test_cart_access() {
        let store = Store::new(5);
        store
            .with_cart_mut(|cart| cart.add_product(&product(1, 10), 2))
            .unwrap();

        let totals = store.with_cart(|cart| cart.totals());
        assert_eq!(totals.total_quantity, 2);
        assert_eq!(totals.subtotal, Money::from_major_minor(200, 0));
    }

    #[test]
    fn test_badge_follows_product_cache() {
        let store = Store::new(5);
        store.set_products(vec![product(1, 0), product(2, 5), product(3, 6)]);
        assert_eq!(store.low_stock_count(), 2);
        assert_eq!(store.product(3).unwrap().quantity_in_stock, 6);
        assert!(store.product(9).is_none());
    }

    #[test]
    fn test_reset_clears_session_state() {
        let store = Store::new(5);
        store
            .with_cart_mut(|cart| cart.add_product(&product(1, 10), 1))
            .unwrap();
        store.set_products(vec![product(1, 1)]);

        store.reset();
        assert!(store.with_cart(|cart| cart.is_empty()));
        assert!(store.products().is_empty());
        assert_eq!(store.low_stock_count(), 0);
        assert!(store.current_user().is_none());
    }
}
