use async_trait::async_trait;
use anchor_types::{EntryPayload, NetworkIdentity, Receipt, TransactionId};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::credential::AccessToken;
use crate::endpoint::{self, paths, TRANSACTION_ID_HEADER};
use crate::error::{LedgerError, LedgerResult};
use crate::poll::{poll_until, PollOptions, PollStatus};
use crate::traits::{IdentityProvider, LedgerClient, LedgerConnector};

/// Client for the identity discovery service.
#[derive(Clone, Debug)]
pub struct HttpIdentityClient {
    base_url: String,
    api_version: String,
    client: Client,
}

impl HttpIdentityClient {
    pub fn new(base_url: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_version: api_version.into(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityClient {
    async fn fetch_identity(&self, ledger_name: &str) -> LedgerResult<NetworkIdentity> {
        let url = endpoint::join(&self.base_url, &paths::ledger_identity(ledger_name));
        tracing::debug!(%url, "fetching ledger identity");
        let response = self
            .client
            .get(&url)
            .query(&[("api-version", self.api_version.as_str())])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        response
            .json()
            .await
            .map_err(|e| LedgerError::Protocol(format!("identity response: {e}")))
    }
}

#[derive(Serialize)]
struct EntryContents {
    contents: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    transaction_id: Option<String>,
}

#[derive(Deserialize)]
struct StatusResponse {
    state: String,
}

/// Client for one ledger's data-plane endpoint.
///
/// When built with the ledger's own certificate, that certificate is trusted
/// as a root for every call.
#[derive(Clone, Debug)]
pub struct HttpLedgerClient {
    ledger_url: String,
    api_version: String,
    collection_id: Option<String>,
    token: AccessToken,
    client: Client,
}

impl HttpLedgerClient {
    pub const COMMITTED: &'static str = "Committed";
    pub const READY: &'static str = "Ready";

    pub fn new(
        ledger_url: impl Into<String>,
        api_version: impl Into<String>,
        collection_id: Option<String>,
        token: AccessToken,
        certificate_pem: Option<&str>,
    ) -> LedgerResult<Self> {
        let mut builder = Client::builder();
        if let Some(pem) = certificate_pem {
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(pem.as_bytes())?);
        }
        Ok(Self {
            ledger_url: ledger_url.into(),
            api_version: api_version.into(),
            collection_id,
            token,
            client: builder.build()?,
        })
    }

    pub fn ledger_url(&self) -> &str {
        &self.ledger_url
    }

    fn url(&self, path: &str) -> String {
        endpoint::join(&self.ledger_url, path)
    }

    async fn get(&self, path: &str) -> LedgerResult<Response> {
        Ok(self
            .client
            .get(self.url(path))
            .query(&[("api-version", self.api_version.as_str())])
            .bearer_auth(self.token.secret())
            .send()
            .await?)
    }

    async fn post_entry(&self, payload: &EntryPayload) -> LedgerResult<TransactionId> {
        let mut query = vec![("api-version", self.api_version.clone())];
        if let Some(collection) = &self.collection_id {
            query.push(("collectionId", collection.clone()));
        }
        let body = EntryContents {
            contents: payload.to_contents()?,
        };
        let response = self
            .client
            .post(self.url(paths::TRANSACTIONS))
            .query(&query)
            .bearer_auth(self.token.secret())
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let from_header = response
            .headers()
            .get(TRANSACTION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let id = match from_header {
            Some(id) => id,
            None => {
                let parsed: SubmitResponse = response
                    .json()
                    .await
                    .map_err(|e| LedgerError::Protocol(format!("submit response: {e}")))?;
                parsed.transaction_id.ok_or_else(|| {
                    LedgerError::Protocol("submit response carried no transaction id".into())
                })?
            }
        };
        Ok(TransactionId::new(id)?)
    }

    async fn commit_status(&self, transaction: &TransactionId) -> LedgerResult<PollStatus<()>> {
        let response = self.get(&paths::transaction_status(transaction.as_str())).await?;
        let status: StatusResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| LedgerError::Protocol(format!("status response: {e}")))?;
        tracing::trace!(transaction = %transaction, state = %status.state, "commit status");
        Ok(if status.state == Self::COMMITTED {
            PollStatus::Complete(())
        } else {
            PollStatus::Pending
        })
    }

    async fn receipt_status(&self, transaction: &TransactionId) -> LedgerResult<PollStatus<Receipt>> {
        let response = self.get(&paths::transaction_receipt(transaction.as_str())).await?;
        // The transaction may not be known to the serving node yet.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(PollStatus::Pending);
        }
        let document: Value = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| LedgerError::Protocol(format!("receipt response: {e}")))?;
        let ready = document.get("state").and_then(Value::as_str) == Some(Self::READY);
        Ok(if ready {
            PollStatus::Complete(Receipt::new(document))
        } else {
            PollStatus::Pending
        })
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn submit_entry(
        &self,
        payload: &EntryPayload,
        poll: &PollOptions,
    ) -> LedgerResult<TransactionId> {
        let transaction = self.post_entry(payload).await?;
        tracing::info!(transaction = %transaction, "entry submitted, awaiting commit");
        poll_until(poll, "transaction commit", || self.commit_status(&transaction)).await?;
        Ok(transaction)
    }

    async fn fetch_receipt(
        &self,
        transaction: &TransactionId,
        poll: &PollOptions,
    ) -> LedgerResult<Receipt> {
        tracing::info!(transaction = %transaction, "awaiting receipt");
        poll_until(poll, "receipt", || self.receipt_status(transaction)).await
    }
}

/// Connects [`HttpLedgerClient`]s to a fixed ledger endpoint.
#[derive(Clone, Debug)]
pub struct HttpLedgerConnector {
    ledger_url: String,
    api_version: String,
    collection_id: Option<String>,
}

impl HttpLedgerConnector {
    pub fn new(
        ledger_url: impl Into<String>,
        api_version: impl Into<String>,
        collection_id: Option<String>,
    ) -> Self {
        Self {
            ledger_url: ledger_url.into(),
            api_version: api_version.into(),
            collection_id,
        }
    }
}

impl LedgerConnector for HttpLedgerConnector {
    fn connect(
        &self,
        identity: &NetworkIdentity,
        token: AccessToken,
    ) -> LedgerResult<Box<dyn LedgerClient>> {
        let client = HttpLedgerClient::new(
            self.ledger_url.clone(),
            self.api_version.clone(),
            self.collection_id.clone(),
            token,
            Some(identity.certificate_pem()),
        )?;
        Ok(Box::new(client))
    }
}

async fn ensure_success(response: Response) -> LedgerResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LedgerError::Service {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    use crate::endpoint::DEFAULT_API_VERSION;
    use anchor_types::Digest;

    const TOKEN: &str = "test-token";

    #[derive(Default)]
    struct FakeService {
        status_polls: AtomicU32,
        receipt_polls: AtomicU32,
        pending_rounds: u32,
        omit_header: bool,
        submitted: Mutex<Vec<(HashMap<String, String>, Value)>>,
    }

    fn authorized(headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {TOKEN}");
        headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(expected.as_str())
    }

    async fn identity(
        Path(name): Path<String>,
        Query(query): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        if name != "savillledger" {
            return (AxumStatus::NOT_FOUND, "unknown ledger").into_response();
        }
        assert_eq!(query.get("api-version").map(String::as_str), Some(DEFAULT_API_VERSION));
        Json(json!({
            "ledgerId": name,
            "ledgerTlsCertificate": "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n",
        }))
        .into_response()
    }

    async fn submit(
        State(svc): State<Arc<FakeService>>,
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        if !authorized(&headers) {
            return AxumStatus::UNAUTHORIZED.into_response();
        }
        svc.submitted.lock().unwrap().push((query, body));
        if svc.omit_header {
            Json(json!({"collectionId": "subledger:0", "transactionId": "2.16"})).into_response()
        } else {
            ([(TRANSACTION_ID_HEADER, "2.15")], Json(json!({"collectionId": "subledger:0"})))
                .into_response()
        }
    }

    async fn status(
        State(svc): State<Arc<FakeService>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> impl IntoResponse {
        if !authorized(&headers) {
            return AxumStatus::UNAUTHORIZED.into_response();
        }
        let n = svc.status_polls.fetch_add(1, Ordering::SeqCst);
        let state = if n < svc.pending_rounds { "Pending" } else { "Committed" };
        Json(json!({"state": state, "transactionId": id})).into_response()
    }

    async fn receipt(
        State(svc): State<Arc<FakeService>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> impl IntoResponse {
        if !authorized(&headers) {
            return AxumStatus::UNAUTHORIZED.into_response();
        }
        let n = svc.receipt_polls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            return (AxumStatus::NOT_FOUND, "not yet").into_response();
        }
        if n <= svc.pending_rounds {
            return Json(json!({"state": "Loading", "transactionId": id})).into_response();
        }
        Json(json!({
            "transactionId": id,
            "state": "Ready",
            "receipt": {"signature": "sig", "proof": [], "nodeId": "n0"},
        }))
        .into_response()
    }

    async fn spawn(service: FakeService) -> (String, Arc<FakeService>) {
        let svc = Arc::new(service);
        let app = Router::new()
            .route("/ledgerIdentity/:name", get(identity))
            .route("/app/transactions", post(submit))
            .route("/app/transactions/:id/status", get(status))
            .route("/app/transactions/:id/receipt", get(receipt))
            .with_state(svc.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), svc)
    }

    fn client(base: &str, token: &str, collection: Option<&str>) -> HttpLedgerClient {
        HttpLedgerClient::new(
            base,
            DEFAULT_API_VERSION,
            collection.map(str::to_owned),
            AccessToken::new(token),
            None,
        )
        .unwrap()
    }

    fn payload() -> EntryPayload {
        EntryPayload {
            file_name: "a.txt".into(),
            digest: Digest::from_hash([7; 32]),
        }
    }

    fn fast() -> PollOptions {
        PollOptions::default().with_interval(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn fetches_identity() {
        let (base, _svc) = spawn(FakeService::default()).await;
        let identity = HttpIdentityClient::new(&base, DEFAULT_API_VERSION)
            .fetch_identity("savillledger")
            .await
            .unwrap();
        assert_eq!(identity.ledger_id, "savillledger");
        assert!(identity.certificate_pem().contains("BEGIN CERTIFICATE"));
    }

    #[tokio::test]
    async fn unknown_ledger_is_service_error() {
        let (base, _svc) = spawn(FakeService::default()).await;
        let err = HttpIdentityClient::new(&base, DEFAULT_API_VERSION)
            .fetch_identity("other")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Service { status: 404, .. }));
    }

    #[tokio::test]
    async fn submit_polls_until_committed() {
        let (base, svc) = spawn(FakeService {
            pending_rounds: 2,
            ..Default::default()
        })
        .await;
        let tx = client(&base, TOKEN, Some("files"))
            .submit_entry(&payload(), &fast())
            .await
            .unwrap();
        assert_eq!(tx.as_str(), "2.15");
        assert_eq!(svc.status_polls.load(Ordering::SeqCst), 3);

        let submitted = svc.submitted.lock().unwrap();
        let (query, body) = &submitted[0];
        assert_eq!(query.get("collectionId").map(String::as_str), Some("files"));
        assert_eq!(body["contents"], payload().to_contents().unwrap());
    }

    #[tokio::test]
    async fn transaction_id_falls_back_to_body() {
        let (base, _svc) = spawn(FakeService {
            omit_header: true,
            ..Default::default()
        })
        .await;
        let tx = client(&base, TOKEN, None)
            .submit_entry(&payload(), &fast())
            .await
            .unwrap();
        assert_eq!(tx.as_str(), "2.16");
    }

    #[tokio::test]
    async fn receipt_waits_through_not_found_and_loading() {
        let (base, svc) = spawn(FakeService {
            pending_rounds: 1,
            ..Default::default()
        })
        .await;
        let tx = TransactionId::new("2.15").unwrap();
        let receipt = client(&base, TOKEN, None).fetch_receipt(&tx, &fast()).await.unwrap();
        assert_eq!(receipt.document()["state"], "Ready");
        assert_eq!(receipt.document()["transactionId"], "2.15");
        assert_eq!(svc.receipt_polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn bad_token_is_service_error() {
        let (base, _svc) = spawn(FakeService::default()).await;
        let err = client(&base, "wrong", None)
            .submit_entry(&payload(), &fast())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Service { status: 401, .. }));
    }

    #[tokio::test]
    async fn commit_wait_honours_timeout() {
        let (base, _svc) = spawn(FakeService {
            pending_rounds: u32::MAX,
            ..Default::default()
        })
        .await;
        let options = fast().with_timeout(Duration::from_millis(50));
        let err = client(&base, TOKEN, None)
            .submit_entry(&payload(), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Timeout { .. }));
    }
}
