use scmdl_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible.
    let log_sink = logging::init();

    // Parse CLI and dispatch.
    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("scmdl error: {:#}", err);
        eprintln!("details logged to {}", log_sink);
        std::process::exit(1);
    }
}
