use clap::Parser;

use analyzer::cli::Cli;
use analyzer::runtime::{boot, run};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();
    let cli = Cli::parse();
    let (store, config) = boot::boot()?;
    run::run(cli, store, config).await
}
