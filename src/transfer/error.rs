//! Transfer Error Types

use thiserror::Error;

use crate::bank::BankError;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(i64),

    #[error(transparent)]
    Bank(#[from] BankError),
}

impl TransferError {
    /// Get the error code for logs
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::NonPositiveAmount(_) => "INVALID_AMOUNT",
            TransferError::Bank(BankError::Rejected { .. }) => "REJECTED",
            TransferError::Bank(BankError::Status { .. }) => "PROVIDER_ERROR",
            TransferError::Bank(BankError::Request(_)) => "REQUEST_FAILED",
            TransferError::Bank(BankError::Decode(_)) => "BAD_RESPONSE",
        }
    }

    /// Provider HTTP status, when the bank answered.
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            TransferError::Bank(e) => e.status(),
            TransferError::NonPositiveAmount(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TransferError::NonPositiveAmount(0).code(), "INVALID_AMOUNT");
        let rejected = TransferError::from(BankError::Rejected { errors: vec![] });
        assert_eq!(rejected.code(), "REJECTED");
    }

    #[test]
    fn test_provider_status() {
        let err = TransferError::from(BankError::Status {
            status: 422,
            body: "{}".to_string(),
        });
        assert_eq!(err.provider_status(), Some(422));
        assert_eq!(err.to_string(), "Starling Bank API returned 422: {}");
        assert_eq!(TransferError::NonPositiveAmount(-5).provider_status(), None);
    }
}
