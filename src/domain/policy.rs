//! Amount-tiered confirmation policy.
//!
//! Reorg-driven double-spend risk is bounded by the payment size, so the number
//! of confirmations required before a payment is final grows with its amount.
//! Networks with faster block times can scale the tier result with a multiplier.

use super::values::{Amount, Network};
use crate::error::PaymentError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Amounts at or above `min_amount` need `confirmations` blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationTier {
    pub min_amount: Decimal,
    pub confirmations: u64,
}

/// Validated tier table. Deserialization goes through [`ConfirmationPolicy::new`],
/// so an unordered or zero-confirmation table is rejected at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPolicy")]
pub struct ConfirmationPolicy {
    tiers: Vec<ConfirmationTier>,
    network_multipliers: BTreeMap<String, u64>,
}

#[derive(Deserialize)]
struct RawPolicy {
    tiers: Vec<ConfirmationTier>,
    #[serde(default)]
    network_multipliers: BTreeMap<String, u64>,
}

impl TryFrom<RawPolicy> for ConfirmationPolicy {
    type Error = PaymentError;

    fn try_from(raw: RawPolicy) -> Result<Self, Self::Error> {
        Self::new(raw.tiers, raw.network_multipliers)
    }
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            tiers: vec![
                ConfirmationTier {
                    min_amount: Decimal::ZERO,
                    confirmations: 1,
                },
                ConfirmationTier {
                    min_amount: dec!(100),
                    confirmations: 12,
                },
                ConfirmationTier {
                    min_amount: dec!(10000),
                    confirmations: 19,
                },
            ],
            network_multipliers: BTreeMap::new(),
        }
    }
}

impl ConfirmationPolicy {
    /// Builds and validates a policy.
    pub fn new(
        tiers: Vec<ConfirmationTier>,
        network_multipliers: BTreeMap<String, u64>,
    ) -> Result<Self, PaymentError> {
        let policy = Self {
            tiers,
            network_multipliers: network_multipliers
                .into_iter()
                .map(|(network, factor)| (network.to_ascii_lowercase(), factor))
                .collect(),
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Same tiers, with `factor` applied to every payment on `network`.
    pub fn with_network_multiplier(
        mut self,
        network: &Network,
        factor: u64,
    ) -> Result<Self, PaymentError> {
        self.network_multipliers
            .insert(network.as_str().to_string(), factor);
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), PaymentError> {
        let first = self
            .tiers
            .first()
            .ok_or_else(|| PaymentError::ConfigError("Policy needs at least one tier".into()))?;
        if first.min_amount != Decimal::ZERO {
            return Err(PaymentError::ConfigError(
                "First tier must start at amount 0".into(),
            ));
        }
        for pair in self.tiers.windows(2) {
            if pair[1].min_amount <= pair[0].min_amount {
                return Err(PaymentError::ConfigError(format!(
                    "Tier bounds must be strictly ascending ({} after {})",
                    pair[1].min_amount, pair[0].min_amount
                )));
            }
        }
        if let Some(tier) = self.tiers.iter().find(|t| t.confirmations == 0) {
            return Err(PaymentError::ConfigError(format!(
                "Tier starting at {} requires zero confirmations",
                tier.min_amount
            )));
        }
        if let Some((network, _)) = self.network_multipliers.iter().find(|(_, f)| **f == 0) {
            return Err(PaymentError::ConfigError(format!(
                "Multiplier for network {network} must be at least 1"
            )));
        }
        Ok(())
    }

    /// Confirmations required before a payment of `amount` on `network` is final.
    pub fn required_confirmations(&self, amount: Amount, network: &Network) -> u64 {
        let base = self
            .tiers
            .iter()
            .rev()
            .find(|tier| amount.value() >= tier.min_amount)
            .map(|tier| tier.confirmations)
            .unwrap_or(1);
        let factor = self
            .network_multipliers
            .get(network.as_str())
            .copied()
            .unwrap_or(1);
        base.saturating_mul(factor)
    }
}
