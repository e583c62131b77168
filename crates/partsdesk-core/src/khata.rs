//! # Khata Ledger
//!
//! Running credit of a customer. Every unpaid or partially paid sale adds a
//! transaction; payments settle transactions oldest first.
//!
//! ## Payment Allocation
//! ```text
//!   Payment Rs 700 against:
//!
//!   date        amount   paid   remaining        after
//!   ──────────  ──────   ────   ─────────        ─────
//!   2024-03-01   500      0       500      ──►   paid 500, remaining 0
//!   2024-04-10   400    100       300      ──►   paid 300, remaining 100
//!   2024-05-02   250      0       250      ──►   untouched
//!
//!   totalCredit: 1050 ──► 350
//! ```
//!
//! ## Invariant
//! `total_credit == Σ transactions.remaining`

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Debtor, KhataTransaction};
use crate::validation::validate_payment_amount;

/// How a payment was spread over transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentAllocation {
    /// `(transaction id, amount applied)` in settlement order.
    pub applied: Vec<(i64, Money)>,
    pub remaining_credit: Money,
}

impl Debtor {
    /// Σ remaining over all transactions.
    pub fn outstanding(&self) -> Money {
        self.transactions.iter().map(|t| t.remaining).sum()
    }

    /// True when the stored total agrees with the transactions.
    ///
    /// A debtor fetched without transactions has nothing to check against.
    pub fn is_consistent(&self) -> bool {
        self.transactions.is_empty() || self.total_credit == self.outstanding()
    }

    /// What the customer owes. Debtors listed without their transactions
    /// fall back to the stored total.
    pub fn balance(&self) -> Money {
        if self.transactions.is_empty() {
            self.total_credit
        } else {
            self.outstanding()
        }
    }

    /// Resets `total_credit` from the transactions.
    pub fn recompute_total(&mut self) {
        self.total_credit = self.outstanding();
    }

    /// Applies a payment oldest-transaction first.
    ///
    /// ## Errors
    /// - `Validation` if the amount is not positive
    /// - `Overpayment` if the amount exceeds what is owed
    pub fn apply_payment(&mut self, amount: Money) -> CoreResult<PaymentAllocation> {
        validate_payment_amount("amount", amount)?;

        let outstanding = self.balance();
        if amount > outstanding {
            return Err(CoreError::Overpayment {
                outstanding,
                offered: amount,
            });
        }

        if self.transactions.is_empty() {
            self.total_credit -= amount;
            return Ok(PaymentAllocation {
                applied: Vec::new(),
                remaining_credit: self.total_credit,
            });
        }

        let mut order: Vec<usize> = (0..self.transactions.len()).collect();
        order.sort_by_key(|&i| (self.transactions[i].date, self.transactions[i].id));

        let mut left = amount;
        let mut applied = Vec::new();
        for i in order {
            if left.is_zero() {
                break;
            }
            let tx = &mut self.transactions[i];
            let portion = left.min(tx.remaining);
            if !portion.is_positive() {
                continue;
            }
            settle(tx, portion);
            applied.push((tx.id, portion));
            left -= portion;
        }

        self.recompute_total();
        Ok(PaymentAllocation {
            applied,
            remaining_credit: self.total_credit,
        })
    }

    /// Transactions that still carry a balance, oldest first.
    pub fn open_transactions(&self) -> Vec<&KhataTransaction> {
        let mut open: Vec<_> = self
            .transactions
            .iter()
            .filter(|t| t.remaining.is_positive())
            .collect();
        open.sort_by_key(|t| (t.date, t.id));
        open
    }
}

fn settle(tx: &mut KhataTransaction, portion: Money) {
    tx.paid += portion;
    tx.remaining -= portion;
}

/// Σ [`Debtor::balance`] over a list of debtors (the "total receivable"
/// card). Uses the same per-debtor figure the debtor table shows.
pub fn total_receivable(debtors: &[Debtor]) -> Money {
    debtors.iter().map(Debtor::balance).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
