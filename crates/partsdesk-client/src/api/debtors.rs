//! # Debtors (Khata) API
//!
//! ## Payment Flow
//! ```text
//!   record_payment(&mut debtor, payment)
//!        │
//!        ├── ledger rules (amount > 0, no overpayment)  ── rejected locally
//!        │
//!        ├── POST /api/v1/debtors/{id}/payments
//!        │
//!        └── debtor ← server copy (or the locally settled copy when the
//!                     server answers with a bare message or no body)
//! ```

use partsdesk_core::khata::{self, PaymentAllocation};
use partsdesk_core::pagination::ListQuery;
use partsdesk_core::{Debtor, DebtorPayment, Money};
use tracing::info;

use super::routes;
use crate::error::ClientResult;
use crate::http::{accepted_item, ApiClient, Page};

#[derive(Debug, Clone)]
pub struct DebtorsApi {
    client: ApiClient,
}

impl DebtorsApi {
    pub fn new(client: ApiClient) -> Self {
        DebtorsApi { client }
    }

    pub async fn list(&self, query: &ListQuery) -> ClientResult<Page<Debtor>> {
        self.client.get_list(routes::DEBTORS, query).await
    }

    /// Every debtor, unpaged.
    pub async fn all(&self) -> ClientResult<Vec<Debtor>> {
        self.client.get_all(routes::DEBTORS).await
    }

    pub async fn get(&self, id: i64) -> ClientResult<Debtor> {
        self.client
            .get_item(&format!("{}/{}", routes::DEBTORS, id))
            .await
    }

    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.client
            .delete(&format!("{}/{}", routes::DEBTORS, id))
            .await
    }

    /// Records a khata payment and updates `debtor` in place.
    ///
    /// ## Errors
    /// - `Core(Overpayment)` / `Core(Validation)` before any request
    /// - any transport or server error; `debtor` is left untouched then
    ///
    /// A 2xx reply always counts as recorded, so a retry never books the
    /// same payment twice.
    pub async fn record_payment(
        &self,
        debtor: &mut Debtor,
        payment: &DebtorPayment,
    ) -> ClientResult<PaymentAllocation> {
        let mut settled = debtor.clone();
        let allocation = settled.apply_payment(payment.amount)?;

        let body: serde_json::Value = self
            .client
            .post(
                &format!("{}/{}/payments", routes::DEBTORS, debtor.id),
                payment,
            )
            .await?;

        // The payment is booked once the server said 2xx, whatever the body
        *debtor = accepted_item(body).unwrap_or(settled);

        info!(
            debtor_id = debtor.id,
            amount = %payment.amount,
            remaining = %debtor.total_credit,
            "Khata payment recorded"
        );
        Ok(allocation)
    }

    /// Total outstanding across every debtor.
    pub async fn total_receivable(&self) -> ClientResult<Money> {
        Ok(khata::total_receivable(&self.all().await?))
    }
}
