use crate::domain::status::{PaymentStatus, Trigger};
use std::fmt;
use thiserror::Error;

/// Why the transition engine refused to fire a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRejection {
    /// The current state has no outgoing edge for the trigger.
    NoEdge,
    /// The current state is terminal and accepts no trigger at all.
    Terminal,
    /// `Included` fired without block metadata.
    MissingBlockInfo,
}

impl fmt::Display for TransitionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionRejection::NoEdge => write!(f, "no such edge"),
            TransitionRejection::Terminal => write!(f, "state is terminal"),
            TransitionRejection::MissingBlockInfo => write!(f, "block info is missing"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Invalid transition: cannot fire {trigger} from {from} ({reason})")]
    InvalidTransition {
        from: PaymentStatus,
        trigger: Trigger,
        reason: TransitionRejection,
    },
    #[error("Insufficient confirmations: have {current}, need {required}")]
    InsufficientConfirmations { current: u64, required: u64 },
    #[error("Payment not found: {0}")]
    NotFound(String),
    #[error("Payment already exists: {0}")]
    AlreadyExists(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, PaymentError>;
