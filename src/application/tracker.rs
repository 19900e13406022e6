use super::update::ChainUpdate;
use crate::domain::events::PaymentEvent;
use crate::domain::payment::{NewPayment, Payment};
use crate::domain::policy::ConfirmationPolicy;
use crate::domain::ports::{EventPublisherBox, PaymentRepositoryBox};
use crate::domain::status::{PaymentStatus, Trigger};
use crate::domain::transition::Transition;
use crate::domain::values::TxHash;
use crate::error::{PaymentError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as TableMutex, PoisonError};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Caller-side service around the [`Payment`] aggregate.
///
/// `PaymentTracker` owns the repository and the event publisher. Updates for the
/// same transaction hash are serialized through a per-hash lock, so each
/// load-mutate-save cycle sees the previous one; different payments proceed
/// concurrently.
pub struct PaymentTracker {
    repository: PaymentRepositoryBox,
    publisher: EventPublisherBox,
    policy: ConfirmationPolicy,
    locks: TableMutex<HashMap<TxHash, Arc<Mutex<()>>>>,
}

/// A caller's handle on the per-hash lock. Dropping it, including when the
/// owning future is cancelled, removes the table entry once nobody else holds it.
struct LockEntry<'a> {
    table: &'a TableMutex<HashMap<TxHash, Arc<Mutex<()>>>>,
    tx_hash: TxHash,
    lock: Arc<Mutex<()>>,
}

impl Drop for LockEntry<'_> {
    fn drop(&mut self) {
        let mut locks = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the table and this handle hold it: nobody is waiting.
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.tx_hash);
        }
    }
}

impl PaymentTracker {
    /// Creates a new `PaymentTracker`.
    ///
    /// # Arguments
    ///
    /// * `repository` - Where payments are persisted.
    /// * `publisher` - Best-effort sink for payment events.
    /// * `policy` - Confirmation thresholds applied to newly detected payments.
    pub fn new(
        repository: PaymentRepositoryBox,
        publisher: EventPublisherBox,
        policy: ConfirmationPolicy,
    ) -> Self {
        Self {
            repository,
            publisher,
            policy,
            locks: TableMutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    /// Routes one feed observation to the matching operation.
    ///
    /// Returns the last transition it caused, if any.
    pub async fn process(&self, update: ChainUpdate) -> Result<Option<Transition>> {
        match update {
            ChainUpdate::Detected(new) => self.register(new).await.map(|_| None),
            ChainUpdate::Block {
                tx_hash,
                number,
                hash,
            } => {
                let included = self
                    .mutate(&tx_hash, |p| p.update_block_info(number, &hash))
                    .await?;
                if included.is_none() {
                    return Ok(None);
                }
                // Counts delivered ahead of the block may already meet the threshold.
                let confirmed = self
                    .mutate(&tx_hash, |p| {
                        let current = i64::try_from(p.confirmations().value()).map_err(|_| {
                            PaymentError::ValidationError("Confirmation count out of range".into())
                        })?;
                        p.update_confirmations(current)
                    })
                    .await?;
                Ok(confirmed.or(included))
            }
            ChainUpdate::Confirmations { tx_hash, count } => {
                self.mutate(&tx_hash, |p| p.update_confirmations(count))
                    .await
            }
            ChainUpdate::Trigger { tx_hash, trigger } => {
                self.mutate(&tx_hash, |p| fire_explicit(p, trigger)).await
            }
            ChainUpdate::Fee { tx_hash, fee } => {
                self.mutate(&tx_hash, |p| {
                    p.set_network_fee(fee);
                    Ok(None)
                })
                .await
            }
        }
    }

    /// Starts tracking a newly detected payment.
    ///
    /// A second detection of a known transaction hash fails with `AlreadyExists`.
    pub async fn register(&self, new: NewPayment) -> Result<Payment> {
        let entry = self.lock_for(&new.tx_hash);
        let _guard = entry.lock.lock().await;
        self.register_locked(new).await
    }

    async fn register_locked(&self, new: NewPayment) -> Result<Payment> {
        if self.repository.exists(&new.tx_hash).await? {
            return Err(PaymentError::AlreadyExists(new.tx_hash.to_string()));
        }

        let payment = Payment::new(new, &self.policy);
        self.repository.save(&payment).await?;
        info!(
            payment_id = %payment.id(),
            tx_hash = %payment.tx_hash(),
            amount = %payment.amount(),
            required_confirmations = payment.required_confirmations(),
            "Tracking new payment"
        );
        self.publish(PaymentEvent::detected(&payment)).await;
        Ok(payment)
    }

    async fn mutate<F>(&self, tx_hash: &TxHash, op: F) -> Result<Option<Transition>>
    where
        F: FnOnce(&mut Payment) -> Result<Option<Transition>> + Send,
    {
        let entry = self.lock_for(tx_hash);
        let _guard = entry.lock.lock().await;
        self.mutate_locked(tx_hash, op).await
    }

    async fn mutate_locked<F>(&self, tx_hash: &TxHash, op: F) -> Result<Option<Transition>>
    where
        F: FnOnce(&mut Payment) -> Result<Option<Transition>> + Send,
    {
        let mut payment = self
            .repository
            .find_by_transaction_hash(tx_hash)
            .await?
            .ok_or_else(|| PaymentError::NotFound(tx_hash.to_string()))?;
        let before = payment.clone();

        let transition = op(&mut payment)?;
        if payment == before {
            debug!(%tx_hash, "Update changed nothing");
            return Ok(None);
        }

        // The in-memory transition stands even if the write fails; the caller retries.
        self.repository.update(&payment).await?;

        if let Some(transition) = &transition {
            info!(
                payment_id = %payment.id(),
                %tx_hash,
                from = %transition.from,
                to = %transition.to,
                trigger = %transition.trigger,
                "Payment status changed"
            );
            self.publish(PaymentEvent::status_changed(&payment, transition))
                .await;
        }
        Ok(transition)
    }

    async fn publish(&self, event: PaymentEvent) {
        let tx_hash = event.tx_hash().clone();
        if let Err(e) = self.publisher.publish(event).await {
            warn!(%tx_hash, error = %e, "Failed to publish payment event");
        }
    }

    fn lock_for(&self, tx_hash: &TxHash) -> LockEntry<'_> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = locks.entry(tx_hash.clone()).or_default().clone();
        LockEntry {
            table: &self.locks,
            tx_hash: tx_hash.clone(),
            lock,
        }
    }

    pub async fn payment(&self, tx_hash: &TxHash) -> Result<Option<Payment>> {
        self.repository.find_by_transaction_hash(tx_hash).await
    }

    /// All tracked payments, ordered by transaction hash.
    pub async fn payments(&self) -> Result<Vec<Payment>> {
        let mut payments = Vec::new();
        for status in PaymentStatus::ALL {
            payments.extend(self.repository.find_by_status(status).await?);
        }
        payments.sort_by(|a, b| a.tx_hash().cmp(b.tx_hash()));
        Ok(payments)
    }

    /// Consumes the tracker and returns the final state of all payments.
    pub async fn into_results(self) -> Result<Vec<Payment>> {
        self.payments().await
    }
}

/// Fires an externally requested trigger. Redelivery of a trigger the payment
/// already went through is absorbed as a no-op.
fn fire_explicit(payment: &mut Payment, trigger: Trigger) -> Result<Option<Transition>> {
    let result = match trigger {
        Trigger::Included => payment.transition_to_confirming(),
        Trigger::Confirmed => payment.transition_to_confirmed(),
        Trigger::Orphaned => payment.transition_to_orphaned(),
        Trigger::BackToMempool => payment.transition_back_to_detected(),
        Trigger::Dropped => payment.transition_to_dropped(),
        Trigger::Failed => payment.transition_to_failed(),
    };
    match result {
        Ok(transition) => Ok(Some(transition)),
        Err(PaymentError::InvalidTransition { .. })
            if payment.status() == trigger.destination() =>
        {
            debug!(
                tx_hash = %payment.tx_hash(),
                %trigger,
                "Trigger already applied"
            );
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
