use crate::domain::policy::ConfirmationPolicy;
use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Runtime configuration for the tracker.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub policy: ConfirmationPolicy,
}

impl TrackerConfig {
    /// Loads a JSON config file, e.g.
    ///
    /// ```json
    /// { "policy": { "tiers": [{"min_amount": "0", "confirmations": 1}],
    ///               "network_multipliers": {"polygon": 10} } }
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader)
            .map_err(|e| PaymentError::ConfigError(format!("Invalid config: {e}")))
    }
}
