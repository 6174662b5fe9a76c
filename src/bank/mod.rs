//! Banking API seam
//!
//! The pipeline only needs two operations from the bank: read the effective
//! balance and move money into a savings goal. `StarlingClient` talks to the
//! real REST API; tests substitute their own `BankApi`.

pub mod error;
pub mod starling;

pub use error::BankError;
pub use starling::StarlingClient;

use async_trait::async_trait;

use crate::money::Amount;

/// Result of a successful savings-goal transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub transfer_uid: String,
}

#[async_trait]
pub trait BankApi: Send + Sync {
    /// Current balance including the transaction that was just notified.
    async fn effective_balance(&self, account_uid: &str) -> Result<Amount, BankError>;

    /// Move `amount` from the account into a savings goal. Called once per
    /// decided transfer; never retried.
    async fn transfer_to_goal(
        &self,
        account_uid: &str,
        goal_uid: &str,
        amount: &Amount,
    ) -> Result<TransferReceipt, BankError>;
}


#[cfg(test)]
pub use mock::MockBank;
