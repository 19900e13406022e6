use super::events::PaymentEvent;
use super::payment::Payment;
use super::status::PaymentStatus;
use super::values::{Address, PaymentId, TxHash};
use crate::error::Result;
use async_trait::async_trait;

/// Durable storage for payments.
///
/// `save` refuses a payment whose id or transaction hash is already known with
/// `AlreadyExists`; `update` and `delete` of an unknown id fail with `NotFound`.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn save(&self, payment: &Payment) -> Result<()>;
    async fn update(&self, payment: &Payment) -> Result<()>;
    async fn delete(&self, id: PaymentId) -> Result<()>;
    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>>;
    async fn find_by_transaction_hash(&self, tx_hash: &TxHash) -> Result<Option<Payment>>;
    /// Payments where `address` is either the sender or the recipient.
    async fn find_by_address(&self, address: &Address) -> Result<Vec<Payment>>;
    async fn find_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>>;
    async fn exists(&self, tx_hash: &TxHash) -> Result<bool>;
    async fn count_by_status(&self, status: PaymentStatus) -> Result<usize>;

    /// Payments still waiting for inclusion or confirmations.
    async fn find_pending(&self) -> Result<Vec<Payment>> {
        let mut pending = self.find_by_status(PaymentStatus::Detected).await?;
        pending.extend(self.find_by_status(PaymentStatus::Confirming).await?);
        Ok(pending)
    }

    async fn find_confirmed(&self) -> Result<Vec<Payment>> {
        self.find_by_status(PaymentStatus::Confirmed).await
    }

    async fn find_failed(&self) -> Result<Vec<Payment>> {
        self.find_by_status(PaymentStatus::Failed).await
    }

    async fn find_orphaned(&self) -> Result<Vec<Payment>> {
        self.find_by_status(PaymentStatus::Orphaned).await
    }
}

/// Best-effort sink for payment notifications.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: PaymentEvent) -> Result<()>;
}

pub type PaymentRepositoryBox = Box<dyn PaymentRepository>;
pub type EventPublisherBox = Box<dyn EventPublisher>;
