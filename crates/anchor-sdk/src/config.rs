use std::path::{Path, PathBuf};
use std::time::Duration;

use anchor_ledger::endpoint::{ledger_url_for, DEFAULT_API_VERSION, DEFAULT_IDENTITY_URL};
use anchor_ledger::PollOptions;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Settings for one anchoring run.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Logical ledger name, used for identity lookup and URL derivation.
    pub ledger_name: String,
    /// Identity discovery service base URL.
    pub identity_url: String,
    /// Ledger endpoint. Derived from `ledger_name` when unset.
    pub ledger_url: Option<String>,
    /// Data-plane API version.
    pub api_version: String,
    /// Sub-ledger collection to write into. The service default when unset.
    pub collection_id: Option<String>,
    /// Where the ledger's network certificate is written.
    pub certificate_path: PathBuf,
    /// Where the receipt is written.
    pub receipt_path: PathBuf,
    /// Delay between status checks while waiting on the service.
    pub poll_interval_ms: u64,
    /// Upper bound on each wait. Unbounded when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            ledger_name: "savillledger".into(),
            identity_url: DEFAULT_IDENTITY_URL.into(),
            ledger_url: None,
            api_version: DEFAULT_API_VERSION.into(),
            collection_id: None,
            certificate_path: PathBuf::from("network_certificate.pem"),
            receipt_path: PathBuf::from("receipt.json"),
            poll_interval_ms: 500,
            timeout_secs: None,
        }
    }
}

impl AnchorConfig {
    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// The ledger endpoint actually used.
    pub fn effective_ledger_url(&self) -> String {
        self.ledger_url
            .clone()
            .unwrap_or_else(|| ledger_url_for(&self.ledger_name))
    }

    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}
