use crate::domain::events::PaymentEvent;
use crate::domain::payment::Payment;
use crate::domain::ports::{EventPublisher, PaymentRepository};
use crate::domain::status::PaymentStatus;
use crate::domain::values::{Address, PaymentId, TxHash};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    payments: HashMap<PaymentId, Payment>,
    by_tx_hash: HashMap<TxHash, PaymentId>,
}

/// A thread-safe in-memory payment repository.
///
/// Payments and the transaction-hash index live behind one lock so they can
/// never disagree. Ideal for testing or for replaying a feed without persistence.
#[derive(Default, Clone)]
pub struct InMemoryPaymentRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryPaymentRepository {
    /// Creates a new, empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn save(&self, payment: &Payment) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.payments.contains_key(&payment.id())
            || tables.by_tx_hash.contains_key(payment.tx_hash())
        {
            return Err(PaymentError::AlreadyExists(payment.tx_hash().to_string()));
        }
        tables
            .by_tx_hash
            .insert(payment.tx_hash().clone(), payment.id());
        tables.payments.insert(payment.id(), payment.clone());
        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.payments.get_mut(&payment.id()) {
            Some(stored) => {
                *stored = payment.clone();
                Ok(())
            }
            None => Err(PaymentError::NotFound(payment.id().to_string())),
        }
    }

    async fn delete(&self, id: PaymentId) -> Result<()> {
        let mut tables = self.tables.write().await;
        let removed = tables
            .payments
            .remove(&id)
            .ok_or_else(|| PaymentError::NotFound(id.to_string()))?;
        tables.by_tx_hash.remove(removed.tx_hash());
        Ok(())
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables.payments.get(&id).cloned())
    }

    async fn find_by_transaction_hash(&self, tx_hash: &TxHash) -> Result<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_tx_hash
            .get(tx_hash)
            .and_then(|id| tables.payments.get(id))
            .cloned())
    }

    async fn find_by_address(&self, address: &Address) -> Result<Vec<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .values()
            .filter(|p| p.from_address() == address || p.to_address() == address)
            .cloned()
            .collect())
    }

    async fn find_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .values()
            .filter(|p| p.status() == status)
            .cloned()
            .collect())
    }

    async fn exists(&self, tx_hash: &TxHash) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.by_tx_hash.contains_key(tx_hash))
    }

    async fn count_by_status(&self, status: PaymentStatus) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .values()
            .filter(|p| p.status() == status)
            .count())
    }
}

/// Event publisher that keeps every event in memory, in publication order.
#[derive(Default, Clone)]
pub struct InMemoryEventBus {
    events: Arc<RwLock<Vec<PaymentEvent>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events published so far.
    pub async fn events(&self) -> Vec<PaymentEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: PaymentEvent) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}
