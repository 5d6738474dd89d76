use std::path::PathBuf;
use std::sync::Arc;

use anchor_crypto::StreamingHasher;
use anchor_ledger::endpoint::LEDGER_RESOURCE;
use anchor_ledger::{IdentityProvider, LedgerConnector, TokenCredential};
use anchor_types::{Digest, EntryPayload, FileReference, Receipt, TransactionId};

use crate::config::AnchorConfig;
use crate::error::SdkResult;
use crate::hooks::{AnchorHook, NoOpHook};
use crate::persist;

/// Everything a successful run produced.
#[derive(Clone, Debug)]
pub struct AnchorOutcome {
    pub digest: Digest,
    pub payload: EntryPayload,
    pub transaction_id: TransactionId,
    pub receipt: Receipt,
    pub certificate_path: PathBuf,
    pub receipt_path: PathBuf,
}

/// Anchors files into one ledger.
pub struct Anchor {
    config: AnchorConfig,
    credential: Arc<dyn TokenCredential>,
    identity: Arc<dyn IdentityProvider>,
    connector: Arc<dyn LedgerConnector>,
    hasher: StreamingHasher,
    hook: Arc<dyn AnchorHook>,
}

impl Anchor {
    pub fn new(
        config: AnchorConfig,
        credential: Arc<dyn TokenCredential>,
        identity: Arc<dyn IdentityProvider>,
        connector: Arc<dyn LedgerConnector>,
    ) -> Self {
        Self {
            config,
            credential,
            identity,
            connector,
            hasher: StreamingHasher::new(),
            hook: Arc::new(NoOpHook),
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn AnchorHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn with_hasher(mut self, hasher: StreamingHasher) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.config
    }

    /// Run the pipeline for one file. Stops at the first error; nothing is
    /// retried.
    pub async fn run(&self, file: &FileReference) -> SdkResult<AnchorOutcome> {
        let poll = self.config.poll_options();

        let token = self.credential.get_token(LEDGER_RESOURCE).await?;

        let identity = self.identity.fetch_identity(&self.config.ledger_name).await?;
        persist::write_certificate(&self.config.certificate_path, &identity)?;
        tracing::info!(
            ledger = %identity.ledger_id,
            path = %self.config.certificate_path.display(),
            "network certificate saved"
        );

        let digest = self.hasher.digest_file(file)?;
        self.hook.on_digest(file, &digest);

        let ledger = self.connector.connect(&identity, token)?;

        let payload = EntryPayload::for_file(file, digest);
        let transaction_id = ledger.submit_entry(&payload, &poll).await?;
        tracing::info!(transaction = %transaction_id, file = %payload.file_name, "entry committed");
        self.hook.on_committed(&transaction_id);

        let receipt = ledger.fetch_receipt(&transaction_id, &poll).await?;
        self.hook.on_receipt(&transaction_id, &receipt);
        persist::write_receipt(&self.config.receipt_path, &receipt)?;
        tracing::info!(path = %self.config.receipt_path.display(), "receipt saved");

        Ok(AnchorOutcome {
            digest,
            payload,
            transaction_id,
            receipt,
            certificate_path: self.config.certificate_path.clone(),
            receipt_path: self.config.receipt_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use anchor_ledger::{CredentialChain, InMemoryLedger, LedgerError, StaticCredential, TokenVariableCredential};
    use serde_json::Value;
    use tempfile::TempDir;

    use crate::error::SdkError;

    const PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIBtest\n-----END CERTIFICATE-----\n";

    struct Fixture {
        dir: TempDir,
        ledger: InMemoryLedger,
        config: AnchorConfig,
    }

    impl Fixture {
        fn new(ledger: InMemoryLedger) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = AnchorConfig {
                ledger_name: "demo".into(),
                certificate_path: dir.path().join("network_certificate.pem"),
                receipt_path: dir.path().join("receipt.json"),
                poll_interval_ms: 1,
                ..Default::default()
            };
            Self { dir, ledger, config }
        }

        fn anchor(&self) -> Anchor {
            Anchor::new(
                self.config.clone(),
                Arc::new(StaticCredential::new("token")),
                Arc::new(self.ledger.clone()),
                Arc::new(self.ledger.clone()),
            )
        }

        fn file(&self, relative: &str, contents: &[u8]) -> FileReference {
            let path = self.dir.path().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, contents).unwrap();
            FileReference::open(&path).unwrap()
        }

        fn outputs_exist(&self) -> (bool, bool) {
            (self.config.certificate_path.exists(), self.config.receipt_path.exists())
        }
    }

    #[derive(Default)]
    struct RecordingHook {
        events: Mutex<Vec<String>>,
        submissions_at_digest: Mutex<Option<usize>>,
        ledger: Option<InMemoryLedger>,
    }

    impl AnchorHook for RecordingHook {
        fn on_digest(&self, _file: &FileReference, digest: &Digest) {
            self.events.lock().unwrap().push(format!("digest:{digest}"));
            if let Some(ledger) = &self.ledger {
                *self.submissions_at_digest.lock().unwrap() = Some(ledger.submissions());
            }
        }

        fn on_committed(&self, transaction: &TransactionId) {
            self.events.lock().unwrap().push(format!("committed:{transaction}"));
        }

        fn on_receipt(&self, transaction: &TransactionId, _receipt: &Receipt) {
            self.events.lock().unwrap().push(format!("receipt:{transaction}"));
        }
    }

    #[tokio::test]
    async fn full_run_writes_both_outputs() {
        let fx = Fixture::new(InMemoryLedger::new("demo", PEM).with_pending_polls(2));
        let file = fx.file("docs/contract.pdf", b"signed contract bytes");

        let outcome = fx.anchor().run(&file).await.unwrap();

        assert_eq!(outcome.digest, StreamingHasher::digest_bytes(b"signed contract bytes"));
        assert_eq!(outcome.transaction_id.as_str(), "2.1");
        assert_eq!(std::fs::read_to_string(&fx.config.certificate_path).unwrap(), PEM);

        let text = std::fs::read_to_string(&fx.config.receipt_path).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        let keys: Vec<&String> = parsed.as_object().unwrap().keys().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(parsed["transactionId"], "2.1");
    }

    #[tokio::test]
    async fn payload_carries_only_base_name() {
        let fx = Fixture::new(InMemoryLedger::new("demo", PEM));
        let file = fx.file("nested/deeper/data.csv", b"a,b");

        fx.anchor().run(&file).await.unwrap();

        let entries = fx.ledger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "data.csv");
        let contents = &fx.ledger.submitted_contents()[0];
        assert!(!contents.contains("nested"));
        assert!(contents.starts_with(r#"{"file_name": "data.csv", "digest": ""#));
    }

    #[tokio::test]
    async fn digest_is_reported_before_submission() {
        let fx = Fixture::new(InMemoryLedger::new("demo", PEM));
        let file = fx.file("a.txt", b"");
        let hook = Arc::new(RecordingHook {
            ledger: Some(fx.ledger.clone()),
            ..Default::default()
        });

        fx.anchor().with_hook(hook.clone()).run(&file).await.unwrap();

        assert_eq!(*hook.submissions_at_digest.lock().unwrap(), Some(0));
        let events = hook.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "digest:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855".to_string(),
                "committed:2.1".to_string(),
                "receipt:2.1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn connector_receives_identity_and_token() {
        let fx = Fixture::new(InMemoryLedger::new("demo", PEM));
        let file = fx.file("a.txt", b"x");
        fx.anchor().run(&file).await.unwrap();

        let connections = fx.ledger.connections();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].0, "demo");
        assert_eq!(connections[0].1.secret(), "token");
    }

    #[tokio::test]
    async fn credential_failure_stops_before_network() {
        let fx = Fixture::new(InMemoryLedger::new("demo", PEM));
        let file = fx.file("a.txt", b"x");
        let failing = CredentialChain::new(vec![Box::new(TokenVariableCredential::from_var(
            "ANCHOR_SDK_TEST_TOKEN_UNSET",
        ))]);

        let anchor = Anchor::new(
            fx.config.clone(),
            Arc::new(failing),
            Arc::new(fx.ledger.clone()),
            Arc::new(fx.ledger.clone()),
        );
        let err = anchor.run(&file).await.unwrap_err();

        assert!(matches!(err, SdkError::Ledger(LedgerError::Authentication(_))));
        assert_eq!(fx.ledger.identity_calls(), 0);
        assert_eq!(fx.outputs_exist(), (false, false));
    }

    #[tokio::test]
    async fn identity_failure_writes_nothing() {
        let fx = Fixture::new(InMemoryLedger::new("demo", PEM).unavailable());
        let file = fx.file("a.txt", b"x");

        let err = fx.anchor().run(&file).await.unwrap_err();

        assert!(matches!(err, SdkError::Ledger(LedgerError::Service { status: 503, .. })));
        assert_eq!(fx.ledger.submissions(), 0);
        assert_eq!(fx.outputs_exist(), (false, false));
    }

    #[tokio::test]
    async fn wrong_ledger_name_fails() {
        let mut fx = Fixture::new(InMemoryLedger::new("demo", PEM));
        fx.config.ledger_name = "elsewhere".into();
        let file = fx.file("a.txt", b"x");

        assert!(fx.anchor().run(&file).await.is_err());
        assert_eq!(fx.ledger.submissions(), 0);
    }

    #[tokio::test]
    async fn commit_timeout_leaves_no_receipt() {
        let mut fx = Fixture::new(InMemoryLedger::new("demo", PEM).with_pending_polls(u32::MAX));
        fx.config.timeout_secs = Some(0);
        let file = fx.file("a.txt", b"x");

        let err = fx.anchor().run(&file).await.unwrap_err();

        assert!(matches!(err, SdkError::Ledger(LedgerError::Timeout { .. })));
        assert_eq!(fx.outputs_exist(), (true, false));
    }

    #[tokio::test]
    async fn second_run_overwrites_outputs() {
        let fx = Fixture::new(InMemoryLedger::new("demo", PEM));
        let first = fx.file("a.txt", b"first");
        let second = fx.file("b.txt", b"second");

        fx.anchor().run(&first).await.unwrap();
        fx.anchor().run(&second).await.unwrap();

        let text = std::fs::read_to_string(&fx.config.receipt_path).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["transactionId"], "2.2");
    }

    #[tokio::test]
    async fn chunk_size_does_not_change_anchored_digest() {
        let fx = Fixture::new(InMemoryLedger::new("demo", PEM));
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 256) as u8).collect();
        let file = fx.file("blob.bin", &data);

        let small = fx
            .anchor()
            .with_hasher(StreamingHasher::with_chunk_size(7))
            .run(&file)
            .await
            .unwrap();
        let default = fx.anchor().run(&file).await.unwrap();
        assert_eq!(small.digest, default.digest);
    }
}
