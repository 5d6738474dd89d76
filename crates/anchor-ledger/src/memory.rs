use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use anchor_types::{EntryPayload, NetworkIdentity, Receipt, TransactionId};
use serde_json::json;

use crate::credential::AccessToken;
use crate::error::{LedgerError, LedgerResult};
use crate::poll::{poll_until, PollOptions, PollStatus};
use crate::traits::{IdentityProvider, LedgerClient, LedgerConnector};

/// In-memory stand-in for the identity service and one ledger.
///
/// Clones share state, so the handle given to an orchestrator can be
/// inspected afterwards.
#[derive(Clone)]
pub struct InMemoryLedger {
    ledger_id: String,
    certificate_pem: String,
    inner: Arc<Mutex<LedgerState>>,
}

#[derive(Default)]
struct LedgerState {
    entries: Vec<(TransactionId, String)>,
    pending_polls: u32,
    commit_polls: HashMap<TransactionId, u32>,
    receipt_polls: HashMap<TransactionId, u32>,
    identity_calls: u64,
    connections: Vec<(String, AccessToken)>,
    unavailable: bool,
}

impl InMemoryLedger {
    pub const NODE_ID: &'static str = "in-memory-node-0";

    pub fn new(ledger_id: impl Into<String>, certificate_pem: impl Into<String>) -> Self {
        Self {
            ledger_id: ledger_id.into(),
            certificate_pem: certificate_pem.into(),
            inner: Arc::new(Mutex::new(LedgerState::default())),
        }
    }

    /// Report commits and receipts as pending for `polls` checks first.
    pub fn with_pending_polls(self, polls: u32) -> Self {
        if let Ok(mut state) = self.inner.lock() {
            state.pending_polls = polls;
        }
        self
    }

    /// Make every call fail as if the service were down.
    pub fn unavailable(self) -> Self {
        if let Ok(mut state) = self.inner.lock() {
            state.unavailable = true;
        }
        self
    }

    pub fn identity_calls(&self) -> u64 {
        self.inner.lock().map(|s| s.identity_calls).unwrap_or_default()
    }

    pub fn submissions(&self) -> usize {
        self.inner.lock().map(|s| s.entries.len()).unwrap_or_default()
    }

    /// Raw `contents` strings in submission order.
    pub fn submitted_contents(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|s| s.entries.iter().map(|(_, c)| c.clone()).collect())
            .unwrap_or_default()
    }

    /// Submitted entries decoded back into payloads.
    pub fn entries(&self) -> Vec<EntryPayload> {
        self.submitted_contents()
            .iter()
            .filter_map(|c| serde_json::from_str(c).ok())
            .collect()
    }

    /// Ledger ids and tokens the connector was asked to connect with.
    pub fn connections(&self) -> Vec<(String, AccessToken)> {
        self.inner.lock().map(|s| s.connections.clone()).unwrap_or_default()
    }

    fn state(&self) -> LedgerResult<MutexGuard<'_, LedgerState>> {
        self.inner
            .lock()
            .map_err(|_| LedgerError::Protocol("in-memory ledger lock poisoned".into()))
    }

    fn unavailable_error() -> LedgerError {
        LedgerError::Service {
            status: 503,
            body: "service unavailable".into(),
        }
    }

    fn commit_step(&self, transaction: &TransactionId) -> LedgerResult<PollStatus<()>> {
        let mut state = self.state()?;
        let pending = state.pending_polls;
        let seen = state.commit_polls.entry(transaction.clone()).or_default();
        *seen += 1;
        Ok(if *seen > pending {
            PollStatus::Complete(())
        } else {
            PollStatus::Pending
        })
    }

    fn receipt_step(&self, transaction: &TransactionId) -> LedgerResult<PollStatus<Receipt>> {
        let mut state = self.state()?;
        if state.unavailable {
            return Err(Self::unavailable_error());
        }
        let contents = state
            .entries
            .iter()
            .find(|(id, _)| id == transaction)
            .map(|(_, c)| c.clone())
            .ok_or_else(|| LedgerError::Service {
                status: 404,
                body: format!("unknown transaction {transaction}"),
            })?;
        let pending = state.pending_polls;
        let seen = state.receipt_polls.entry(transaction.clone()).or_default();
        *seen += 1;
        if *seen <= pending {
            return Ok(PollStatus::Pending);
        }
        Ok(PollStatus::Complete(self.synthetic_receipt(transaction, &contents)))
    }

    fn synthetic_receipt(&self, transaction: &TransactionId, contents: &str) -> Receipt {
        let write_set = serde_json::from_str::<EntryPayload>(contents)
            .map(|p| p.digest.to_hex())
            .unwrap_or_default();
        Receipt::new(json!({
            "transactionId": transaction.as_str(),
            "state": "Ready",
            "receipt": {
                "nodeId": Self::NODE_ID,
                "cert": self.certificate_pem,
                "signature": "in-memory",
                "proof": [],
                "leafComponents": {
                    "commitEvidence": format!("ce:{transaction}"),
                    "writeSetDigest": write_set,
                    "claimsDigest": "0".repeat(64),
                },
            },
        }))
    }
}

#[async_trait]
impl IdentityProvider for InMemoryLedger {
    async fn fetch_identity(&self, ledger_name: &str) -> LedgerResult<NetworkIdentity> {
        let mut state = self.state()?;
        state.identity_calls += 1;
        if state.unavailable {
            return Err(Self::unavailable_error());
        }
        if ledger_name != self.ledger_id {
            return Err(LedgerError::Service {
                status: 404,
                body: format!("ledger {ledger_name} not found"),
            });
        }
        Ok(NetworkIdentity::new(self.ledger_id.clone(), self.certificate_pem.clone()))
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn submit_entry(
        &self,
        payload: &EntryPayload,
        poll: &PollOptions,
    ) -> LedgerResult<TransactionId> {
        let contents = payload.to_contents()?;
        let transaction = {
            let mut state = self.state()?;
            if state.unavailable {
                return Err(Self::unavailable_error());
            }
            let transaction = TransactionId::new(format!("2.{}", state.entries.len() + 1))?;
            state.entries.push((transaction.clone(), contents));
            transaction
        };
        let tx = &transaction;
        poll_until(poll, "transaction commit", move || async move { self.commit_step(tx) }).await?;
        Ok(transaction)
    }

    async fn fetch_receipt(
        &self,
        transaction: &TransactionId,
        poll: &PollOptions,
    ) -> LedgerResult<Receipt> {
        poll_until(poll, "receipt", move || async move { self.receipt_step(transaction) }).await
    }
}

impl LedgerConnector for InMemoryLedger {
    fn connect(
        &self,
        identity: &NetworkIdentity,
        token: AccessToken,
    ) -> LedgerResult<Box<dyn LedgerClient>> {
        self.state()?.connections.push((identity.ledger_id.clone(), token));
        Ok(Box::new(self.clone()))
    }
}
