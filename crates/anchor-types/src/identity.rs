use serde::{Deserialize, Serialize};

/// TLS identity material the identity service publishes for a ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkIdentity {
    /// Logical ledger name the identity belongs to.
    pub ledger_id: String,
    /// PEM-encoded certificate; persisted verbatim.
    pub ledger_tls_certificate: String,
}

impl NetworkIdentity {
    pub fn new(ledger_id: impl Into<String>, certificate_pem: impl Into<String>) -> Self {
        Self {
            ledger_id: ledger_id.into(),
            ledger_tls_certificate: certificate_pem.into(),
        }
    }

    pub fn certificate_pem(&self) -> &str {
        &self.ledger_tls_certificate
    }
}
