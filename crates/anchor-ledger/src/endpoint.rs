/// Default identity discovery service.
pub const DEFAULT_IDENTITY_URL: &str = "https://identity.confidential-ledger.core.azure.com";

/// Data-plane API version sent on every request.
pub const DEFAULT_API_VERSION: &str = "2022-05-13";

/// Token audience for ledger data-plane calls.
pub const LEDGER_RESOURCE: &str = "https://confidential-ledger.azure.com";

/// Response header carrying the id of a newly written transaction.
pub const TRANSACTION_ID_HEADER: &str = "x-ms-ccf-transaction-id";

/// HTTP paths relative to the identity or ledger base URL.
pub mod paths {
    pub fn ledger_identity(ledger_name: &str) -> String {
        format!("/ledgerIdentity/{ledger_name}")
    }

    pub const TRANSACTIONS: &str = "/app/transactions";

    pub fn transaction_status(transaction_id: &str) -> String {
        format!("/app/transactions/{transaction_id}/status")
    }

    pub fn transaction_receipt(transaction_id: &str) -> String {
        format!("/app/transactions/{transaction_id}/receipt")
    }
}

/// Ledger endpoint derived from its logical name.
pub fn ledger_url_for(ledger_name: &str) -> String {
    format!("https://{ledger_name}.confidential-ledger.azure.com")
}

/// Join a base URL and a path without doubling the slash.
pub fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
