use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "anchor",
    about = "Anchor a file's SHA-256 digest in a confidential ledger and save the receipt",
    version,
)]
pub struct Cli {
    /// File to hash and anchor
    pub file_path: PathBuf,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Ledger name
    #[arg(long)]
    pub ledger: Option<String>,

    /// Identity service base URL
    #[arg(long)]
    pub identity_url: Option<String>,

    /// Ledger endpoint, instead of the one derived from the ledger name
    #[arg(long)]
    pub ledger_url: Option<String>,

    /// Collection to write the entry into
    #[arg(long)]
    pub collection: Option<String>,

    /// Where to write the network certificate
    #[arg(long)]
    pub cert_out: Option<PathBuf>,

    /// Where to write the receipt
    #[arg(long)]
    pub receipt_out: Option<PathBuf>,

    /// Delay between status checks
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Give up waiting on the ledger after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(short, long)]
    pub verbose: bool,
}
