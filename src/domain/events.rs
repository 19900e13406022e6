use super::block::NetworkFee;
use super::payment::Payment;
use super::status::{PaymentStatus, Trigger};
use super::transition::Transition;
use super::values::{Amount, Network, PaymentId, TxHash};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notifications a caller may publish after persisting a payment change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentEvent {
    Detected {
        payment_id: PaymentId,
        tx_hash: TxHash,
        network: Network,
        amount: Amount,
        required_confirmations: u64,
        fee: Option<NetworkFee>,
        at: DateTime<Utc>,
    },
    StatusChanged {
        payment_id: PaymentId,
        tx_hash: TxHash,
        from: PaymentStatus,
        to: PaymentStatus,
        trigger: Trigger,
        confirmations: u64,
        required_confirmations: u64,
        block_number: Option<u64>,
        at: DateTime<Utc>,
    },
}

impl PaymentEvent {
    pub fn detected(payment: &Payment) -> Self {
        PaymentEvent::Detected {
            payment_id: payment.id(),
            tx_hash: payment.tx_hash().clone(),
            network: payment.network().clone(),
            amount: payment.amount(),
            required_confirmations: payment.required_confirmations(),
            fee: payment.network_fee().cloned(),
            at: payment.detected_at(),
        }
    }

    pub fn status_changed(payment: &Payment, transition: &Transition) -> Self {
        PaymentEvent::StatusChanged {
            payment_id: payment.id(),
            tx_hash: payment.tx_hash().clone(),
            from: transition.from,
            to: transition.to,
            trigger: transition.trigger,
            confirmations: payment.confirmations().value(),
            required_confirmations: payment.required_confirmations(),
            block_number: payment.block_info().map(|b| b.number()),
            at: transition.at,
        }
    }

    pub fn tx_hash(&self) -> &TxHash {
        match self {
            PaymentEvent::Detected { tx_hash, .. } | PaymentEvent::StatusChanged { tx_hash, .. } => {
                tx_hash
            }
        }
    }
}
