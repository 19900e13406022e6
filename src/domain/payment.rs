use super::block::{BlockInfo, NetworkFee};
use super::confirmation::ConfirmationCount;
use super::policy::ConfirmationPolicy;
use super::status::{PaymentStatus, Trigger};
use super::transition::{self, GuardContext, Transition};
use super::values::{Address, Amount, Network, PaymentId, TxHash};
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// What the upstream watcher knows when it first sees a payment transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub tx_hash: TxHash,
    pub network: Network,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub fee: Option<NetworkFee>,
}

/// Flat, persistable form of a [`Payment`].
///
/// Converting back with [`Payment::from_record`] re-checks the cross-field
/// invariants, so a corrupted record is rejected instead of producing an
/// aggregate in an impossible state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub tx_hash: TxHash,
    pub network: Network,
    pub from_address: Address,
    pub to_address: Address,
    pub amount: Amount,
    pub status: PaymentStatus,
    pub confirmations: ConfirmationCount,
    pub required_confirmations: u64,
    pub block_info: Option<BlockInfo>,
    pub network_fee: Option<NetworkFee>,
    pub detected_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A payment moving through blockchain confirmation stages.
///
/// All mutation goes through the operations below. Each call validates its
/// input first, applies at most one transition and leaves the payment untouched
/// when it returns an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PaymentRecord", into = "PaymentRecord")]
pub struct Payment {
    id: PaymentId,
    tx_hash: TxHash,
    network: Network,
    from: Address,
    to: Address,
    amount: Amount,
    status: PaymentStatus,
    confirmations: ConfirmationCount,
    required_confirmations: u64,
    block_info: Option<BlockInfo>,
    network_fee: Option<NetworkFee>,
    detected_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a freshly detected payment with zero confirmations.
    ///
    /// The confirmation threshold is taken from `policy` once, here; later
    /// policy changes do not move the goalposts for payments already in flight.
    pub fn new(new: NewPayment, policy: &ConfirmationPolicy) -> Self {
        let now = Utc::now();
        let required_confirmations = policy.required_confirmations(new.amount, &new.network);
        Self {
            id: PaymentId::new(),
            tx_hash: new.tx_hash,
            network: new.network,
            from: new.from,
            to: new.to,
            amount: new.amount,
            status: PaymentStatus::Detected,
            confirmations: ConfirmationCount::ZERO,
            required_confirmations,
            block_info: None,
            network_fee: new.fee,
            detected_at: now,
            confirmed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn from_record(record: PaymentRecord) -> Result<Self> {
        if record.required_confirmations == 0 {
            return Err(PaymentError::ValidationError(
                "Required confirmations must be at least 1".to_string(),
            ));
        }
        match (record.status, record.confirmed_at.is_some()) {
            (PaymentStatus::Confirmed, false) => {
                return Err(PaymentError::ValidationError(
                    "Confirmed payment is missing its confirmation time".to_string(),
                ));
            }
            (status, true) if status != PaymentStatus::Confirmed => {
                return Err(PaymentError::ValidationError(format!(
                    "A {status} payment cannot carry a confirmation time"
                )));
            }
            _ => {}
        }
        match (record.status, record.block_info.is_some()) {
            (PaymentStatus::Confirming | PaymentStatus::Confirmed, false) => {
                return Err(PaymentError::ValidationError(format!(
                    "A {} payment requires block info",
                    record.status
                )));
            }
            (PaymentStatus::Detected, true) => {
                return Err(PaymentError::ValidationError(
                    "A detected payment cannot carry block info".to_string(),
                ));
            }
            _ => {}
        }
        if record.status == PaymentStatus::Confirmed
            && !record.confirmations.meets(record.required_confirmations)
        {
            return Err(PaymentError::ValidationError(format!(
                "Confirmed payment has {} of {} required confirmations",
                record.confirmations, record.required_confirmations
            )));
        }

        Ok(Self {
            id: record.id,
            tx_hash: record.tx_hash,
            network: record.network,
            from: record.from_address,
            to: record.to_address,
            amount: record.amount,
            status: record.status,
            confirmations: record.confirmations,
            required_confirmations: record.required_confirmations,
            block_info: record.block_info,
            network_fee: record.network_fee,
            detected_at: record.detected_at,
            confirmed_at: record.confirmed_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    pub fn to_record(&self) -> PaymentRecord {
        self.clone().into()
    }

    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn tx_hash(&self) -> &TxHash {
        &self.tx_hash
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn from_address(&self) -> &Address {
        &self.from
    }

    pub fn to_address(&self) -> &Address {
        &self.to
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn confirmations(&self) -> ConfirmationCount {
        self.confirmations
    }

    pub fn required_confirmations(&self) -> u64 {
        self.required_confirmations
    }

    pub fn remaining_confirmations(&self) -> u64 {
        self.required_confirmations
            .saturating_sub(self.confirmations.value())
    }

    pub fn block_info(&self) -> Option<&BlockInfo> {
        self.block_info.as_ref()
    }

    pub fn network_fee(&self) -> Option<&NetworkFee> {
        self.network_fee.as_ref()
    }

    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == PaymentStatus::Confirmed
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn can_transition_to(&self, target: PaymentStatus) -> bool {
        self.status.can_transition_to(target)
    }

    /// Records a confirmation count reported by the chain watcher.
    ///
    /// The stored count only ever grows here; stale or duplicate deliveries are
    /// absorbed. A Confirming payment that reaches its threshold is promoted to
    /// Confirmed. Orphaned and terminal payments record the count without any
    /// status change.
    pub fn update_confirmations(&mut self, count: i64) -> Result<Option<Transition>> {
        let count = ConfirmationCount::new(count)?;
        if count > self.confirmations {
            self.confirmations = count;
            self.updated_at = Utc::now();
        } else if count < self.confirmations {
            trace!(
                tx_hash = %self.tx_hash,
                stored = %self.confirmations,
                received = %count,
                "Ignoring stale confirmation count"
            );
        }

        if self.status == PaymentStatus::Confirming
            && self.confirmations.meets(self.required_confirmations)
        {
            return self.fire(Trigger::Confirmed).map(Some);
        }
        Ok(None)
    }

    /// Records the block that includes the transaction. A Detected payment
    /// becomes Confirming; other active states just store the (possibly new)
    /// block. Block info of a terminal payment is frozen.
    pub fn update_block_info(&mut self, number: i64, hash: &str) -> Result<Option<Transition>> {
        let block = BlockInfo::new(number, hash)?;
        if self.status.is_terminal() {
            debug!(
                tx_hash = %self.tx_hash,
                status = %self.status,
                block = block.number(),
                "Ignoring block info for settled payment"
            );
            return Ok(None);
        }

        if self.block_info.as_ref() != Some(&block) {
            self.block_info = Some(block);
            self.updated_at = Utc::now();
        }

        if self.status == PaymentStatus::Detected {
            return self.fire(Trigger::Included).map(Some);
        }
        Ok(None)
    }

    pub fn set_network_fee(&mut self, fee: NetworkFee) {
        self.network_fee = Some(fee);
        self.updated_at = Utc::now();
    }

    pub fn transition_to_confirming(&mut self) -> Result<Transition> {
        self.fire(Trigger::Included)
    }

    pub fn transition_to_confirmed(&mut self) -> Result<Transition> {
        self.fire(Trigger::Confirmed)
    }

    pub fn transition_to_orphaned(&mut self) -> Result<Transition> {
        self.fire(Trigger::Orphaned)
    }

    pub fn transition_back_to_detected(&mut self) -> Result<Transition> {
        self.fire(Trigger::BackToMempool)
    }

    pub fn transition_to_dropped(&mut self) -> Result<Transition> {
        self.fire(Trigger::Dropped)
    }

    pub fn transition_to_failed(&mut self) -> Result<Transition> {
        self.fire(Trigger::Failed)
    }

    /// Fires `trigger` through the engine and applies its effects.
    pub fn fire(&mut self, trigger: Trigger) -> Result<Transition> {
        let ctx = GuardContext {
            has_block_info: self.block_info.is_some(),
            confirmations: self.confirmations,
            required_confirmations: self.required_confirmations,
        };
        let target = transition::evaluate(self.status, trigger, &ctx)?;

        let now = Utc::now();
        let from = self.status;
        if trigger == Trigger::BackToMempool {
            self.block_info = None;
            self.confirmations = ConfirmationCount::ZERO;
        }
        if target == PaymentStatus::Confirmed && self.confirmed_at.is_none() {
            self.confirmed_at = Some(now);
        }
        self.status = target;
        self.updated_at = now;

        debug!(
            tx_hash = %self.tx_hash,
            %from,
            to = %target,
            %trigger,
            "Payment transitioned"
        );
        Ok(Transition {
            from,
            to: target,
            trigger,
            at: now,
        })
    }
}

impl TryFrom<PaymentRecord> for Payment {
    type Error = PaymentError;

    fn try_from(record: PaymentRecord) -> Result<Self> {
        Self::from_record(record)
    }
}

impl From<Payment> for PaymentRecord {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            tx_hash: payment.tx_hash,
            network: payment.network,
            from_address: payment.from,
            to_address: payment.to,
            amount: payment.amount,
            status: payment.status,
            confirmations: payment.confirmations,
            required_confirmations: payment.required_confirmations,
            block_info: payment.block_info,
            network_fee: payment.network_fee,
            detected_at: payment.detected_at,
            confirmed_at: payment.confirmed_at,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }
}
