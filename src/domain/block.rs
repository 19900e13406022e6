use crate::error::PaymentError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Block that included the payment transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    number: u64,
    hash: String,
}

impl BlockInfo {
    /// Validates raw feed values: the number must be non-negative and the hash non-empty.
    pub fn new(number: i64, hash: impl Into<String>) -> Result<Self, PaymentError> {
        let number = u64::try_from(number).map_err(|_| {
            PaymentError::ValidationError(format!("Block number must not be negative, got {number}"))
        })?;
        let hash = hash.into();
        if hash.trim().is_empty() {
            return Err(PaymentError::ValidationError(
                "Block hash must not be empty".to_string(),
            ));
        }
        Ok(Self {
            number,
            hash: hash.trim().to_string(),
        })
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }
}

/// Fee paid to the network for the payment transaction. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkFee {
    amount: Decimal,
    currency: String,
}

impl NetworkFee {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Result<Self, PaymentError> {
        if amount <= Decimal::ZERO {
            return Err(PaymentError::ValidationError(
                "Network fee must be positive".to_string(),
            ));
        }
        let currency = currency.into();
        if currency.trim().is_empty() {
            return Err(PaymentError::ValidationError(
                "Fee currency must not be empty".to_string(),
            ));
        }
        Ok(Self {
            amount,
            currency: currency.trim().to_ascii_uppercase(),
        })
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}
