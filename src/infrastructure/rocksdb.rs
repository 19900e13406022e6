use crate::domain::payment::Payment;
use crate::domain::ports::PaymentRepository;
use crate::domain::status::PaymentStatus;
use crate::domain::values::{Address, PaymentId, TxHash};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for payment records, keyed by payment id.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family mapping transaction hashes to payment ids.
pub const CF_TX_INDEX: &str = "tx_index";

/// A persistent payment repository using RocksDB.
///
/// Records are stored as JSON in the `payments` column family; a secondary
/// `tx_index` column family enforces transaction-hash uniqueness. Both are
/// written in one `WriteBatch` so the index never points at a missing record.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBPaymentRepository {
    db: Arc<DB>,
    // Serializes check-then-write sequences (uniqueness on save, existence on update).
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBPaymentRepository {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let cf_tx_index = ColumnFamilyDescriptor::new(CF_TX_INDEX, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payments, cf_tx_index])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PaymentError::InternalError(Box::new(std::io::Error::other(format!(
                "Column family {name} not found"
            ))))
        })
    }

    fn decode(bytes: &[u8]) -> Result<Payment> {
        serde_json::from_slice(bytes).map_err(|e| {
            PaymentError::InternalError(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to deserialize payment: {}", e),
            )))
        })
    }

    fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        let cf = self.cf(CF_PAYMENTS)?;
        match self.db.get_pinned_cf(cf, id.as_uuid().as_bytes())? {
            Some(bytes) => Self::decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn scan<F>(&self, mut keep: F) -> Result<Vec<Payment>>
    where
        F: FnMut(&Payment) -> bool,
    {
        let cf = self.cf(CF_PAYMENTS)?;
        let mut payments = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let payment = Self::decode(&value)?;
            if keep(&payment) {
                payments.push(payment);
            }
        }
        Ok(payments)
    }
}

#[async_trait]
impl PaymentRepository for RocksDBPaymentRepository {
    async fn save(&self, payment: &Payment) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let payments = self.cf(CF_PAYMENTS)?;
        let index = self.cf(CF_TX_INDEX)?;

        let key = payment.id().as_uuid().as_bytes().to_vec();
        if self.db.get_pinned_cf(payments, &key)?.is_some()
            || self
                .db
                .get_pinned_cf(index, payment.tx_hash().as_str())?
                .is_some()
        {
            return Err(PaymentError::AlreadyExists(payment.tx_hash().to_string()));
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(payments, &key, serde_json::to_vec(payment)?);
        batch.put_cf(index, payment.tx_hash().as_str(), &key);
        self.db.write(batch)?;
        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let payments = self.cf(CF_PAYMENTS)?;
        let key = payment.id().as_uuid().as_bytes();
        if self.db.get_pinned_cf(payments, key)?.is_none() {
            return Err(PaymentError::NotFound(payment.id().to_string()));
        }
        self.db.put_cf(payments, key, serde_json::to_vec(payment)?)?;
        Ok(())
    }

    async fn delete(&self, id: PaymentId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let existing = self
            .get_payment(id)?
            .ok_or_else(|| PaymentError::NotFound(id.to_string()))?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf(CF_PAYMENTS)?, id.as_uuid().as_bytes());
        batch.delete_cf(self.cf(CF_TX_INDEX)?, existing.tx_hash().as_str());
        self.db.write(batch)?;
        Ok(())
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>> {
        self.get_payment(id)
    }

    async fn find_by_transaction_hash(&self, tx_hash: &TxHash) -> Result<Option<Payment>> {
        let index = self.cf(CF_TX_INDEX)?;
        let Some(id_bytes) = self.db.get_pinned_cf(index, tx_hash.as_str())? else {
            return Ok(None);
        };
        let id = uuid::Uuid::from_slice(&id_bytes)
            .map_err(|e| PaymentError::InternalError(Box::new(e)))?;
        self.get_payment(PaymentId::from(id))
    }

    async fn find_by_address(&self, address: &Address) -> Result<Vec<Payment>> {
        self.scan(|p| p.from_address() == address || p.to_address() == address)
    }

    async fn find_by_status(&self, status: PaymentStatus) -> Result<Vec<Payment>> {
        self.scan(|p| p.status() == status)
    }

    async fn exists(&self, tx_hash: &TxHash) -> Result<bool> {
        let index = self.cf(CF_TX_INDEX)?;
        // Just check if the key exists without retrieving the value
        Ok(self.db.get_pinned_cf(index, tx_hash.as_str())?.is_some())
    }

    async fn count_by_status(&self, status: PaymentStatus) -> Result<usize> {
        Ok(self.scan(|p| p.status() == status)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::NewPayment;
    use crate::domain::policy::ConfirmationPolicy;
    use crate::domain::values::{Amount, Network};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn payment(tx_hash: &str) -> Payment {
        let new = NewPayment {
            tx_hash: TxHash::new(tx_hash).unwrap(),
            network: Network::default(),
            from: Address::new("alice").unwrap(),
            to: Address::new("shop").unwrap(),
            amount: Amount::new(dec!(100.0)).unwrap(),
            fee: None,
        };
        Payment::new(new, &ConfirmationPolicy::default())
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let repo = RocksDBPaymentRepository::open(dir.path()).expect("Failed to open RocksDB");

        assert!(repo.db.cf_handle(CF_PAYMENTS).is_some());
        assert!(repo.db.cf_handle(CF_TX_INDEX).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_save_update_find() {
        let dir = tempdir().unwrap();
        let repo = RocksDBPaymentRepository::open(dir.path()).unwrap();

        let mut p = payment("0x1");
        repo.save(&p).await.unwrap();
        assert!(matches!(
            repo.save(&payment("0x1")).await,
            Err(PaymentError::AlreadyExists(_))
        ));

        p.update_block_info(5, "blk").unwrap();
        repo.update(&p).await.unwrap();

        let found = repo.find_by_transaction_hash(p.tx_hash()).await.unwrap().unwrap();
        assert_eq!(found, p);
        assert_eq!(
            repo.count_by_status(PaymentStatus::Confirming).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_rocksdb_delete_removes_index() {
        let dir = tempdir().unwrap();
        let repo = RocksDBPaymentRepository::open(dir.path()).unwrap();

        let p = payment("0x1");
        repo.save(&p).await.unwrap();
        repo.delete(p.id()).await.unwrap();

        assert!(!repo.exists(p.tx_hash()).await.unwrap());
        assert!(repo.find_by_id(p.id()).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(p.id()).await,
            Err(PaymentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rocksdb_reopen_keeps_payments() {
        let dir = tempdir().unwrap();
        let p = payment("0x1");
        {
            let repo = RocksDBPaymentRepository::open(dir.path()).unwrap();
            repo.save(&p).await.unwrap();
        }
        let repo = RocksDBPaymentRepository::open(dir.path()).unwrap();
        assert_eq!(repo.find_by_id(p.id()).await.unwrap().unwrap(), p);
    }
}
