use crate::domain::block::NetworkFee;
use crate::domain::payment::NewPayment;
use crate::domain::status::Trigger;
use crate::domain::values::TxHash;

/// One observation from the upstream chain watcher.
///
/// Raw numeric values stay signed: the feed is untrusted, and negative values
/// are rejected by the aggregate with a validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainUpdate {
    /// First sighting of a payment transaction.
    Detected(NewPayment),
    /// The transaction was seen in a block.
    Block {
        tx_hash: TxHash,
        number: i64,
        hash: String,
    },
    /// Current depth of the including block.
    Confirmations { tx_hash: TxHash, count: i64 },
    /// An explicit, externally decided transition (reorg handling, abandonment, ...).
    Trigger { tx_hash: TxHash, trigger: Trigger },
    /// Fee paid for the transaction, reported after detection.
    Fee { tx_hash: TxHash, fee: NetworkFee },
}

impl ChainUpdate {
    pub fn tx_hash(&self) -> &TxHash {
        match self {
            ChainUpdate::Detected(new) => &new.tx_hash,
            ChainUpdate::Block { tx_hash, .. }
            | ChainUpdate::Confirmations { tx_hash, .. }
            | ChainUpdate::Trigger { tx_hash, .. }
            | ChainUpdate::Fee { tx_hash, .. } => tx_hash,
        }
    }
}
