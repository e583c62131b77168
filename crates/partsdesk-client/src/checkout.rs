//! # Checkout
//!
//! Turns the cart into a recorded sale.
//!
//! ## Flow
//! ```text
//!   cart ──► to_new_sale(customer, paid) ──► validate ──► POST /api/v1/sales
//!                 │ EmptyCart                   │ FieldErrors      │ 2xx
//!                 ▼                             ▼                  ▼
//!              error, cart kept             error, cart kept    submitted lines
//!                                                               taken out of the
//!                                                               cart, product
//!                                                               cache refreshed
//! ```
//!
//! Lines only leave the cart once the server accepted the sale, and only the
//! lines that were submitted: anything added while the request was in
//! flight stays. A failed refresh afterwards is logged and does not fail
//! the checkout, since the sale already exists.

use partsdesk_core::Money;
use tracing::{info, warn};

use crate::api::sales::SaleReceipt;
use crate::error::ClientResult;
use crate::http::ApiClient;
use crate::store::Store;

/// Who bought and how much they paid at the counter.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub amount_paid: Money,
}

/// Submits the store's cart as a sale.
///
/// Paying less than the total is allowed; the server books the rest as
/// khata against the customer.
pub async fn submit(
    api: &ApiClient,
    store: &Store,
    request: &CheckoutRequest,
) -> ClientResult<SaleReceipt> {
    let (new_sale, submitted) = store.with_cart(|cart| {
        cart.to_new_sale(
            request.customer_name.trim(),
            request.customer_phone.clone(),
            request.amount_paid,
        )
        .map(|sale| (sale, cart.items().to_vec()))
    })?;

    let receipt = api.sales().create(&new_sale).await?;
    store.with_cart_mut(|cart| cart.remove_submitted(&submitted));

    if let Err(err) = store.refresh_products(api).await {
        warn!(error = %err, "Product cache refresh after checkout failed");
    }

    info!(
        sale_id = ?receipt.id(),
        items = submitted.len(),
        status = ?receipt.payment_status(),
        "Checkout complete"
    );
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ClientError;
    use partsdesk_core::CoreError;

    #[tokio::test]
    async fn test_empty_cart_never_reaches_server() {
        let api = ApiClient::new(&ClientConfig::default()).unwrap();
        let store = Store::new(5);
        let request = CheckoutRequest {
            customer_name: "Walk-in".to_string(),
            customer_phone: None,
            amount_paid: Money::zero(),
        };

        let err = submit(&api, &store, &request).await.unwrap_err();
        assert!(matches!(err, ClientError::Core(CoreError::EmptyCart)));
    }
}
