//! # Sales API
//!
//! Sales are created from the cart and never edited afterwards, except for
//! the payment status when a customer settles up.
//!
//! Both mutations treat any 2xx as committed. When the reply does not carry
//! the sale, the caller still gets a success: a [`SaleReceipt::Accepted`]
//! for a new sale, or the locally updated copy for a payment.

use partsdesk_core::pagination::ListQuery;
use partsdesk_core::validation::validate_price;
use partsdesk_core::{Money, NewSale, PaymentStatus, PaymentStatusUpdate, Sale, SaleSummary};
use tracing::info;

use super::{routes, Draft};
use crate::error::ClientResult;
use crate::http::{accepted_item, ApiClient, Page};

#[derive(Debug, Clone)]
pub struct SalesApi {
    client: ApiClient,
}

impl SalesApi {
    pub fn new(client: ApiClient) -> Self {
        SalesApi { client }
    }

    pub async fn list(&self, query: &ListQuery) -> ClientResult<Page<Sale>> {
        self.client.get_list(routes::SALES, query).await
    }

    pub async fn get(&self, id: i64) -> ClientResult<Sale> {
        self.client
            .get_item(&format!("{}/{}", routes::SALES, id))
            .await
    }

    /// Submits a sale built by [`partsdesk_core::cart::SaleCart::to_new_sale`].
    pub async fn create(&self, sale: &NewSale) -> ClientResult<SaleReceipt> {
        Draft::validate(sale)?;
        let body: serde_json::Value = self.client.post(routes::SALES, sale).await?;

        let receipt = match accepted_item::<Sale>(body) {
            Some(created) => SaleReceipt::Recorded(created),
            None => SaleReceipt::Accepted(sale.clone()),
        };
        info!(
            sale_id = ?receipt.id(),
            total = %receipt.total(),
            status = ?receipt.payment_status(),
            "Sale recorded"
        );
        Ok(receipt)
    }

    /// Records that `amount_paid` has now been received in total for `sale`
    /// and updates it in place.
    ///
    /// ## Errors
    /// Validation before any request, or the transport/server error; `sale`
    /// is left untouched then.
    pub async fn update_payment_status(
        &self,
        sale: &mut Sale,
        amount_paid: Money,
    ) -> ClientResult<PaymentStatus> {
        validate_price("amountPaid", amount_paid)?;
        let update = payment_update(sale, amount_paid);

        let body: serde_json::Value = self
            .client
            .patch(
                &format!("{}/{}/payment-status", routes::SALES, sale.id),
                &update,
            )
            .await?;

        *sale = accepted_item(body).unwrap_or_else(|| Sale {
            amount_paid: update.amount_paid,
            payment_status: update.payment_status,
            ..sale.clone()
        });
        info!(sale_id = sale.id, status = ?sale.payment_status, "Payment status updated");
        Ok(sale.payment_status)
    }

    pub async fn summaries(&self, query: &ListQuery) -> ClientResult<Page<SaleSummary>> {
        self.client.get_list(routes::SALES_SUMMARY, query).await
    }
}

/// Outcome of a successful `POST /api/v1/sales`.
#[derive(Debug, Clone, PartialEq)]
pub enum SaleReceipt {
    /// The stored sale came back in the reply.
    Recorded(Sale),
    /// The backend accepted the sale but answered without it. The sale
    /// exists; only its id is unknown.
    Accepted(NewSale),
}

impl SaleReceipt {
    pub fn sale(&self) -> Option<&Sale> {
        match self {
            SaleReceipt::Recorded(sale) => Some(sale),
            SaleReceipt::Accepted(_) => None,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.sale().map(|sale| sale.id)
    }

    pub fn total(&self) -> Money {
        match self {
            SaleReceipt::Recorded(sale) => sale.total_amount_summary,
            SaleReceipt::Accepted(sale) => sale.total_amount_summary,
        }
    }

    pub fn payment_status(&self) -> PaymentStatus {
        match self {
            SaleReceipt::Recorded(sale) => sale.payment_status,
            SaleReceipt::Accepted(sale) => sale.payment_status,
        }
    }
}

/// Payment-status body for a sale where `amount_paid` has now been received
/// in total. The status follows from the amounts.
pub fn payment_update(sale: &Sale, amount_paid: Money) -> PaymentStatusUpdate {
    PaymentStatusUpdate {
        payment_status: PaymentStatus::from_amounts(sale.total_amount_summary, amount_paid),
        amount_paid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_payment_update_derives_status() {
        let sale = Sale {
            id: 4,
            customer_name: "Usman".to_string(),
            items: Vec::new(),
            quantity_sold_summary: 1,
            total_amount_summary: Money::from_major_minor(500, 0),
            amount_paid: Money::zero(),
            payment_status: PaymentStatus::Unpaid,
            created_at: Utc::now(),
        };

        let partial = payment_update(&sale, Money::from_major_minor(200, 0));
        assert_eq!(partial.payment_status, PaymentStatus::Partial);

        let full = payment_update(&sale, Money::from_major_minor(500, 0));
        assert_eq!(full.payment_status, PaymentStatus::Paid);
    }
}
