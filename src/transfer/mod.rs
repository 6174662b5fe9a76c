//! Transfer Dispatcher
//!
//! Executes a decided [`TransferPlan`] against the bank exactly once.
//!
//! # Safety Invariants
//!
//! 1. **Positive amounts only**: a plan for zero or less is refused before
//!    the bank is contacted
//! 2. **No retry**: a failure is returned to the caller and never replayed

pub mod error;

pub use error::TransferError;

use std::sync::Arc;
use tracing::debug;

use crate::bank::{BankApi, TransferReceipt};
use crate::policy::TransferPlan;

pub struct TransferDispatcher {
    bank: Arc<dyn BankApi>,
    account_uid: String,
}

impl TransferDispatcher {
    pub fn new(bank: Arc<dyn BankApi>, account_uid: impl Into<String>) -> Self {
        Self {
            bank,
            account_uid: account_uid.into(),
        }
    }

    pub async fn transfer(&self, plan: &TransferPlan) -> Result<TransferReceipt, TransferError> {
        if plan.amount.minor_units <= 0 {
            return Err(TransferError::NonPositiveAmount(plan.amount.minor_units));
        }

        debug!(
            kind = %plan.kind,
            goal_uid = %plan.goal_uid,
            amount = %plan.amount.display(),
            "[dispatch] Requesting transfer"
        );
        let receipt = self
            .bank
            .transfer_to_goal(&self.account_uid, &plan.goal_uid, &plan.amount)
            .await?;
        Ok(receipt)
    }
}
