//! Service boundary for anchoring files in a remote confidential ledger.
//!
//! The ledger and its identity service are external collaborators. This
//! crate reduces them to three narrow capabilities:
//! - [`IdentityProvider`] fetches the ledger's network certificate
//! - [`LedgerConnector`] builds a [`LedgerClient`] that trusts that certificate
//! - [`LedgerClient`] submits an entry and fetches its receipt, each waiting
//!   for the service to finish
//!
//! HTTP implementations talk to the real service; [`InMemoryLedger`] stands
//! in for it in tests. Waiting is modelled by [`poll_until`] with an optional
//! timeout.

pub mod credential;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod memory;
pub mod poll;
pub mod traits;

pub use credential::{
    AccessToken, CliCredential, ClientSecretCredential, CredentialChain, EnvironmentCredential,
    ManagedIdentityCredential, ManagedIdentitySource, StaticCredential, TokenCredential,
    TokenVariableCredential,
};
pub use error::{LedgerError, LedgerResult};
pub use http::{HttpIdentityClient, HttpLedgerClient, HttpLedgerConnector};
pub use memory::InMemoryLedger;
pub use poll::{poll_until, PollOptions, PollStatus};
pub use traits::{IdentityProvider, LedgerClient, LedgerConnector};
