use crate::domain::events::PaymentEvent;
use crate::domain::ports::EventPublisher;
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;

/// Publishes events as structured log lines. Used by the CLI, where there is no
/// downstream consumer to notify.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventPublisher;

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(&self, event: PaymentEvent) -> Result<()> {
        match &event {
            PaymentEvent::Detected {
                payment_id,
                tx_hash,
                network,
                amount,
                required_confirmations,
                ..
            } => info!(
                %payment_id,
                %tx_hash,
                %network,
                %amount,
                required_confirmations,
                "Payment detected"
            ),
            PaymentEvent::StatusChanged {
                payment_id,
                tx_hash,
                from,
                to,
                trigger,
                confirmations,
                ..
            } => info!(
                %payment_id,
                %tx_hash,
                %from,
                %to,
                %trigger,
                confirmations,
                "Payment status changed"
            ),
        }
        Ok(())
    }
}
