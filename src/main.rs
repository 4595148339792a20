use anyhow::Result;
use clap::Parser;

use decomp_rename::commands::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    decomp_rename::init_tracing();

    let cli = Cli::parse();
    execute(cli).await
}
