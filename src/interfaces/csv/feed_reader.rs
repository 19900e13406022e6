use crate::application::update::ChainUpdate;
use crate::domain::block::NetworkFee;
use crate::domain::payment::NewPayment;
use crate::domain::status::Trigger;
use crate::domain::values::{Address, Amount, Network, TxHash};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum FeedKind {
    Detected,
    Block,
    Confirmations,
    Confirm,
    Orphaned,
    BackToMempool,
    Dropped,
    Failed,
    Fee,
}

/// One row of a recorded chain-watcher feed. Columns unused by a kind stay empty.
#[derive(Debug, Deserialize)]
struct FeedRecord {
    kind: FeedKind,
    tx_hash: String,
    network: Option<String>,
    from: Option<String>,
    to: Option<String>,
    amount: Option<Decimal>,
    confirmations: Option<i64>,
    block_number: Option<i64>,
    block_hash: Option<String>,
    #[serde(default)]
    fee: Option<Decimal>,
    #[serde(default)]
    fee_currency: Option<String>,
}

fn required<T>(value: Option<T>, column: &str, kind: FeedKind) -> Result<T> {
    value.ok_or_else(|| {
        PaymentError::ValidationError(format!("{kind:?} row is missing the {column} column"))
    })
}

impl FeedRecord {
    fn into_update(self) -> Result<ChainUpdate> {
        let tx_hash = TxHash::new(self.tx_hash)?;
        let kind = self.kind;
        let fee = match (self.fee, self.fee_currency) {
            (Some(amount), Some(currency)) => Some(NetworkFee::new(amount, currency)?),
            (None, None) => None,
            _ => {
                return Err(PaymentError::ValidationError(
                    "fee and fee_currency must be given together".to_string(),
                ));
            }
        };
        let trigger = |trigger| ChainUpdate::Trigger {
            tx_hash: tx_hash.clone(),
            trigger,
        };

        let update = match kind {
            FeedKind::Detected => {
                let network = match self.network {
                    Some(network) => Network::new(network)?,
                    None => Network::default(),
                };
                ChainUpdate::Detected(NewPayment {
                    tx_hash: tx_hash.clone(),
                    network,
                    from: Address::new(required(self.from, "from", kind)?)?,
                    to: Address::new(required(self.to, "to", kind)?)?,
                    amount: Amount::new(required(self.amount, "amount", kind)?)?,
                    fee,
                })
            }
            FeedKind::Block => ChainUpdate::Block {
                tx_hash: tx_hash.clone(),
                number: required(self.block_number, "block_number", kind)?,
                hash: self.block_hash.unwrap_or_default(),
            },
            FeedKind::Confirmations => ChainUpdate::Confirmations {
                tx_hash: tx_hash.clone(),
                count: required(self.confirmations, "confirmations", kind)?,
            },
            FeedKind::Confirm => trigger(Trigger::Confirmed),
            FeedKind::Orphaned => trigger(Trigger::Orphaned),
            FeedKind::BackToMempool => trigger(Trigger::BackToMempool),
            FeedKind::Dropped => trigger(Trigger::Dropped),
            FeedKind::Failed => trigger(Trigger::Failed),
            FeedKind::Fee => ChainUpdate::Fee {
                tx_hash: tx_hash.clone(),
                fee: required(fee, "fee", kind)?,
            },
        };
        Ok(update)
    }
}

/// Reads chain updates from a CSV source.
///
/// Wraps `csv::Reader`, trimming whitespace and tolerating ragged rows.
pub struct FeedReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> FeedReader<R> {
    /// Creates a new `FeedReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and converts rows, one `Result` per row so a bad row does
    /// not stop the stream.
    pub fn updates(self) -> impl Iterator<Item = Result<ChainUpdate>> {
        self.reader
            .into_deserialize::<FeedRecord>()
            .map(|result| result.map_err(PaymentError::from).and_then(FeedRecord::into_update))
    }
}
