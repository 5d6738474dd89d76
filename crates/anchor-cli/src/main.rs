use clap::Parser;
use tracing::Level;

use anchor_types::FileReference;

mod cli;
mod commands;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    // Nothing touches the network or the filesystem until the input exists.
    let file = match FileReference::open(&cli.file_path) {
        Ok(file) => file,
        Err(e) => {
            println!("{e}");
            std::process::exit(1);
        }
    };

    let config = commands::load_config(&cli)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(commands::run_anchor(config, file))
}
