use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = armgrab_cli::Cli::parse();
    armgrab_cli::run_main(cli).await
}
