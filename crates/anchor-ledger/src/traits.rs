use async_trait::async_trait;
use anchor_types::{EntryPayload, NetworkIdentity, Receipt, TransactionId};

use crate::credential::AccessToken;
use crate::error::LedgerResult;
use crate::poll::PollOptions;

/// Looks up a ledger's network identity by its logical name.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn fetch_identity(&self, ledger_name: &str) -> LedgerResult<NetworkIdentity>;
}

/// Write and receipt operations against one ledger.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Append an entry and wait until the ledger reports it committed.
    async fn submit_entry(
        &self,
        payload: &EntryPayload,
        poll: &PollOptions,
    ) -> LedgerResult<TransactionId>;

    /// Wait for the consensus receipt of a committed transaction.
    async fn fetch_receipt(
        &self,
        transaction: &TransactionId,
        poll: &PollOptions,
    ) -> LedgerResult<Receipt>;
}

/// Builds a [`LedgerClient`] once the ledger's identity and a token are known.
pub trait LedgerConnector: Send + Sync {
    fn connect(
        &self,
        identity: &NetworkIdentity,
        token: AccessToken,
    ) -> LedgerResult<Box<dyn LedgerClient>>;
}
