use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{LedgerError, LedgerResult};

/// Bearer token for ledger data-plane calls.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(****)")
    }
}

/// A source of access tokens for a resource audience.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Short name used in logs and error reports.
    fn name(&self) -> &'static str;

    async fn get_token(&self, resource: &str) -> LedgerResult<AccessToken>;
}

/// Always hands out the same token.
#[derive(Clone, Debug)]
pub struct StaticCredential {
    token: AccessToken,
}

impl StaticCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { token: AccessToken::new(secret) }
    }
}

#[async_trait]
impl TokenCredential for StaticCredential {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn get_token(&self, _resource: &str) -> LedgerResult<AccessToken> {
        Ok(self.token.clone())
    }
}

/// Pre-issued bearer token taken from an environment variable.
#[derive(Clone, Debug)]
pub struct TokenVariableCredential {
    var: String,
}

impl TokenVariableCredential {
    pub const DEFAULT_VAR: &'static str = "ANCHOR_ACCESS_TOKEN";

    pub fn new() -> Self {
        Self::from_var(Self::DEFAULT_VAR)
    }

    pub fn from_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for TokenVariableCredential {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenCredential for TokenVariableCredential {
    fn name(&self) -> &'static str {
        "token-variable"
    }

    async fn get_token(&self, _resource: &str) -> LedgerResult<AccessToken> {
        match std::env::var(&self.var) {
            Ok(value) if !value.trim().is_empty() => Ok(AccessToken::new(value.trim())),
            _ => Err(LedgerError::Authentication(format!("{} is not set", self.var))),
        }
    }
}

#[derive(Deserialize)]
struct OAuthToken {
    access_token: String,
}

fn authentication(context: &str) -> impl FnOnce(reqwest::Error) -> LedgerError + '_ {
    move |e| LedgerError::Authentication(format!("{context}: {e}"))
}

async fn read_token(response: reqwest::Response, context: &str) -> LedgerResult<AccessToken> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LedgerError::Authentication(format!(
            "{context} returned {status}: {}",
            body.trim()
        )));
    }
    let token: OAuthToken = response
        .json()
        .await
        .map_err(authentication(context))?;
    Ok(AccessToken::new(token.access_token))
}

/// Service principal login with a client secret.
#[derive(Clone)]
pub struct ClientSecretCredential {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    authority_host: String,
    client: reqwest::Client,
}

impl ClientSecretCredential {
    pub const DEFAULT_AUTHORITY_HOST: &'static str = "https://login.microsoftonline.com";

    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> LedgerResult<Self> {
        Ok(Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authority_host: Self::DEFAULT_AUTHORITY_HOST.into(),
            client: reqwest::Client::builder().build()?,
        })
    }

    pub fn with_authority_host(mut self, host: impl Into<String>) -> Self {
        self.authority_host = host.into();
        self
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

impl fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("authority_host", &self.authority_host)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    fn name(&self) -> &'static str {
        "client-secret"
    }

    async fn get_token(&self, resource: &str) -> LedgerResult<AccessToken> {
        let scope = format!("{}/.default", resource.trim_end_matches('/'));
        let response = self
            .client
            .post(self.token_url())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", scope.as_str()),
            ])
            .send()
            .await
            .map_err(authentication("token endpoint unreachable"))?;
        read_token(response, "token endpoint").await
    }
}

/// Service principal settings from the standard `AZURE_*` variables.
///
/// The variables are read on every request, so the credential can sit in a
/// chain on hosts that do not set them.
#[derive(Clone, Debug)]
pub struct EnvironmentCredential {
    tenant_var: String,
    client_id_var: String,
    client_secret_var: String,
}

impl EnvironmentCredential {
    pub const TENANT_ID_VAR: &'static str = "AZURE_TENANT_ID";
    pub const CLIENT_ID_VAR: &'static str = "AZURE_CLIENT_ID";
    pub const CLIENT_SECRET_VAR: &'static str = "AZURE_CLIENT_SECRET";
    pub const AUTHORITY_HOST_VAR: &'static str = "AZURE_AUTHORITY_HOST";

    pub fn new() -> Self {
        Self::with_vars(Self::TENANT_ID_VAR, Self::CLIENT_ID_VAR, Self::CLIENT_SECRET_VAR)
    }

    pub fn with_vars(
        tenant_var: impl Into<String>,
        client_id_var: impl Into<String>,
        client_secret_var: impl Into<String>,
    ) -> Self {
        Self {
            tenant_var: tenant_var.into(),
            client_id_var: client_id_var.into(),
            client_secret_var: client_secret_var.into(),
        }
    }

    fn resolve(&self) -> LedgerResult<ClientSecretCredential> {
        let read = |var: &str| std::env::var(var).ok().filter(|v| !v.trim().is_empty());
        let (tenant, client_id, secret) = (
            read(&self.tenant_var),
            read(&self.client_id_var),
            read(&self.client_secret_var),
        );
        let (Some(tenant), Some(client_id), Some(secret)) = (tenant, client_id, secret) else {
            return Err(LedgerError::Authentication(format!(
                "{}, {} and {} must all be set",
                self.tenant_var, self.client_id_var, self.client_secret_var
            )));
        };
        let credential = ClientSecretCredential::new(tenant, client_id, secret)?;
        Ok(match read(Self::AUTHORITY_HOST_VAR) {
            Some(host) => credential.with_authority_host(host),
            None => credential,
        })
    }
}

impl Default for EnvironmentCredential {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenCredential for EnvironmentCredential {
    fn name(&self) -> &'static str {
        "environment"
    }

    async fn get_token(&self, resource: &str) -> LedgerResult<AccessToken> {
        self.resolve()?.get_token(resource).await
    }
}

/// Where a managed identity token comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManagedIdentitySource {
    /// The instance metadata service of a virtual machine or scale set.
    Imds { endpoint: String },
    /// The local identity endpoint of App Service, Functions or Container Apps.
    AppService { endpoint: String, header: String },
}

impl ManagedIdentitySource {
    pub const IMDS_ENDPOINT: &'static str = "http://169.254.169.254/metadata/identity/oauth2/token";
    pub const IMDS_API_VERSION: &'static str = "2018-02-01";
    pub const APP_SERVICE_API_VERSION: &'static str = "2019-08-01";

    /// Pick the source advertised by the process environment.
    pub fn detect() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// App Service when both `IDENTITY_ENDPOINT` and `IDENTITY_HEADER` are
    /// present, IMDS otherwise.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match (lookup("IDENTITY_ENDPOINT"), lookup("IDENTITY_HEADER")) {
            (Some(endpoint), Some(header)) => Self::AppService { endpoint, header },
            _ => Self::Imds {
                endpoint: Self::IMDS_ENDPOINT.into(),
            },
        }
    }
}

/// Token from the host's managed identity.
#[derive(Clone, Debug)]
pub struct ManagedIdentityCredential {
    source: ManagedIdentitySource,
    client_id: Option<String>,
    client: reqwest::Client,
}

impl ManagedIdentityCredential {
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

    pub fn new() -> LedgerResult<Self> {
        Self::from_source(ManagedIdentitySource::detect())
    }

    pub fn from_source(source: ManagedIdentitySource) -> LedgerResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Self::CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            source,
            client_id: None,
            client,
        })
    }

    /// Select a user-assigned identity.
    pub fn with_client_id(mut self, client_id: Option<String>) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn source(&self) -> &ManagedIdentitySource {
        &self.source
    }
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    fn name(&self) -> &'static str {
        "managed-identity"
    }

    async fn get_token(&self, resource: &str) -> LedgerResult<AccessToken> {
        let mut query = vec![("resource", resource.to_string())];
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.clone()));
        }
        let request = match &self.source {
            ManagedIdentitySource::Imds { endpoint } => self
                .client
                .get(endpoint)
                .query(&[("api-version", ManagedIdentitySource::IMDS_API_VERSION)])
                .header("Metadata", "true"),
            ManagedIdentitySource::AppService { endpoint, header } => self
                .client
                .get(endpoint)
                .query(&[("api-version", ManagedIdentitySource::APP_SERVICE_API_VERSION)])
                .header("X-IDENTITY-HEADER", header),
        };
        let response = request
            .query(&query)
            .send()
            .await
            .map_err(authentication("managed identity unreachable"))?;
        read_token(response, "managed identity").await
    }
}

/// Token from the local command-line login state.
#[derive(Clone, Debug)]
pub struct CliCredential {
    program: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
}

impl CliCredential {
    pub fn new() -> Self {
        Self::with_program("az")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

impl Default for CliCredential {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenCredential for CliCredential {
    fn name(&self) -> &'static str {
        "cli"
    }

    async fn get_token(&self, resource: &str) -> LedgerResult<AccessToken> {
        let output = tokio::process::Command::new(&self.program)
            .args(["account", "get-access-token", "--resource", resource, "--output", "json"])
            .output()
            .await
            .map_err(|e| LedgerError::Authentication(format!("cannot run {}: {e}", self.program)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LedgerError::Authentication(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        let token: CliToken = serde_json::from_slice(&output.stdout)
            .map_err(|e| LedgerError::Authentication(format!("malformed token output: {e}")))?;
        Ok(AccessToken::new(token.access_token))
    }
}

/// Tries each credential in order and returns the first token obtained.
pub struct CredentialChain {
    sources: Vec<Box<dyn TokenCredential>>,
}

impl CredentialChain {
    pub fn new(sources: Vec<Box<dyn TokenCredential>>) -> Self {
        Self { sources }
    }

    /// Pre-issued token, service principal variables, managed identity, then
    /// CLI login.
    pub fn ambient() -> LedgerResult<Self> {
        let managed = ManagedIdentityCredential::new()?
            .with_client_id(std::env::var(EnvironmentCredential::CLIENT_ID_VAR).ok());
        Ok(Self::new(vec![
            Box::new(TokenVariableCredential::new()),
            Box::new(EnvironmentCredential::new()),
            Box::new(managed),
            Box::new(CliCredential::new()),
        ]))
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

#[async_trait]
impl TokenCredential for CredentialChain {
    fn name(&self) -> &'static str {
        "chain"
    }

    async fn get_token(&self, resource: &str) -> LedgerResult<AccessToken> {
        let mut failures = Vec::new();
        for source in &self.sources {
            match source.get_token(resource).await {
                Ok(token) => {
                    tracing::info!(credential = source.name(), "credential resolved");
                    return Ok(token);
                }
                Err(e) => {
                    tracing::debug!(credential = source.name(), error = %e, "credential unavailable");
                    failures.push(format!("{}: {e}", source.name()));
                }
            }
        }
        Err(LedgerError::Authentication(format!(
            "no credential produced a token ({})",
            failures.join("; ")
        )))
    }
}
