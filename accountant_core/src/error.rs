use thiserror::Error;

/// Reasons a single explorer or rate request produced no value.
///
/// These never reach callers of the processors; they are logged and the
/// balance becomes absent.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} responded with status {status}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },
    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("response is missing field `{0}`")]
    MissingField(&'static str),
    #[error("not a number: {0:?}")]
    NotANumber(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("failed to encode record: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("store is corrupted: {0}")]
    Corrupted(String),
    #[error("wallet {0} not found")]
    WalletNotFound(u64),
}

/// Failures of user-triggered wallet operations.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{address} is not a valid {currency} address")]
    InvalidAddress {
        currency: crate::currencies::Currency,
        address: String,
    },
    #[error("token wallets need a contract address")]
    MissingContract,
    #[error("wallet {0} does not belong to you")]
    NotOwner(u64),
}

impl StoreError {
    /// Broken invariants of the persisted data. The process cannot keep
    /// tracking balances safely once one of these shows up.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Corrupted(_))
    }
}

impl From<bincode::error::DecodeError> for StoreError {
    fn from(e: bincode::error::DecodeError) -> Self {
        StoreError::Corrupted(format!("undecodable record: {}", e))
    }
}

impl From<sled::transaction::TransactionError<StoreError>> for StoreError {
    fn from(e: sled::transaction::TransactionError<StoreError>) -> Self {
        match e {
            sled::transaction::TransactionError::Abort(inner) => inner,
            sled::transaction::TransactionError::Storage(inner) => StoreError::Sled(inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_corruption_is_fatal() {
        assert!(StoreError::Corrupted("duplicate baseline".to_string()).is_fatal());
        assert!(!StoreError::WalletNotFound(7).is_fatal());
    }
}
