use watchdl_core::logging;

mod cli;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible.
    logging::init();

    // Parse CLI and dispatch.
    if let Err(err) = cli::run_from_args().await {
        eprintln!("watchdl error: {:#}", err);
        std::process::exit(1);
    }
}
