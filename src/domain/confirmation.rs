use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of blocks mined on top of the block that includes a payment.
///
/// Value semantics: every operation returns a new count.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConfirmationCount(u64);

impl ConfirmationCount {
    pub const ZERO: Self = Self(0);

    /// Builds a count from a raw feed value, rejecting negatives.
    pub fn new(value: i64) -> Result<Self, PaymentError> {
        u64::try_from(value).map(Self).map_err(|_| {
            PaymentError::ValidationError(format!(
                "Confirmation count must not be negative, got {value}"
            ))
        })
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn increment(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn meets(&self, required: u64) -> bool {
        self.0 >= required
    }
}

impl From<u64> for ConfirmationCount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConfirmationCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
