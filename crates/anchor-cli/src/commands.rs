use std::sync::Arc;

use anchor_ledger::{CredentialChain, HttpIdentityClient, HttpLedgerConnector};
use anchor_sdk::{Anchor, AnchorConfig, AnchorHook, AnchorOutcome, Digest, FileReference};
use colored::Colorize;

use crate::cli::Cli;

/// Prints the digest as soon as it is known.
struct ConsoleHook;

impl AnchorHook for ConsoleHook {
    fn on_digest(&self, _file: &FileReference, digest: &Digest) {
        println!("Digest for file is: {}", digest.to_hex());
    }
}

/// Config file values, then flag overrides.
pub fn load_config(cli: &Cli) -> anyhow::Result<AnchorConfig> {
    let mut config = match &cli.config {
        Some(path) => AnchorConfig::from_toml_file(path)?,
        None => AnchorConfig::default(),
    };
    if let Some(ledger) = &cli.ledger {
        config.ledger_name = ledger.clone();
    }
    if let Some(url) = &cli.identity_url {
        config.identity_url = url.clone();
    }
    if let Some(url) = &cli.ledger_url {
        config.ledger_url = Some(url.clone());
    }
    if let Some(collection) = &cli.collection {
        config.collection_id = Some(collection.clone());
    }
    if let Some(path) = &cli.cert_out {
        config.certificate_path = path.clone();
    }
    if let Some(path) = &cli.receipt_out {
        config.receipt_path = path.clone();
    }
    if let Some(ms) = cli.poll_interval_ms {
        config.poll_interval_ms = ms;
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout_secs = Some(secs);
    }
    Ok(config)
}

pub async fn run_anchor(config: AnchorConfig, file: FileReference) -> anyhow::Result<()> {
    let credential = CredentialChain::ambient()?;
    tracing::debug!(sources = ?credential.source_names(), "credential chain");

    let identity = HttpIdentityClient::new(config.identity_url.clone(), config.api_version.clone());
    let connector = HttpLedgerConnector::new(
        config.effective_ledger_url(),
        config.api_version.clone(),
        config.collection_id.clone(),
    );

    let anchor = Anchor::new(config, Arc::new(credential), Arc::new(identity), Arc::new(connector))
        .with_hook(Arc::new(ConsoleHook));
    let outcome = anchor.run(&file).await?;
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &AnchorOutcome) {
    println!("{} Entry committed", "✓".green().bold());
    println!("  File: {}", outcome.payload.file_name.bold());
    println!("  Transaction: {}", outcome.transaction_id.as_str().yellow());
    println!("  Certificate: {}", outcome.certificate_path.display().to_string().cyan());
    println!("  Receipt: {}", outcome.receipt_path.display().to_string().cyan());
}
