use thiserror::Error;

/// Banking API failures.
#[derive(Error, Debug)]
pub enum BankError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Starling Bank API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Transfer rejected: {}", .errors.join("; "))]
    Rejected { errors: Vec<String> },
}

impl BankError {
    /// Provider HTTP status, when the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BankError::Status { status, .. } => Some(*status),
            BankError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = BankError::Status {
            status: 403,
            body: "forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "Starling Bank API returned 403: forbidden");
        assert_eq!(err.status(), Some(403));

        let err = BankError::Rejected {
            errors: vec!["INSUFFICIENT_FUNDS".to_string(), "LIMIT".to_string()],
        };
        assert_eq!(err.to_string(), "Transfer rejected: INSUFFICIENT_FUNDS; LIMIT");
        assert_eq!(err.status(), None);
    }
}
