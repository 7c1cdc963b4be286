//! Search Porter
//!
//! Moves documents between JSON array files and Azure AI Search indexes.
//!
//! # Usage
//!
//! ```bash
//! # Export an index
//! search-porter export --service contoso --index hotels --key $KEY --output hotels.json
//!
//! # Import it again, merging into existing documents
//! search-porter import --service contoso --index hotels --key $KEY --input hotels.json --merge
//! ```

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use search_porter::cli::{CliInterface, EXIT_INTERRUPTED, error_exit_status};
use search_porter::error::Result;

/// Application entry point
#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            error_exit_status(&e)
        }
    };
    std::process::exit(code);
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Install the Ctrl+C handler (a second Ctrl+C exits at once)
/// 4. Run the subcommand
///
/// # Returns
/// * `Result<i32>` - Exit status or error
async fn run() -> Result<i32> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    let cancel_token = CancellationToken::new();
    let cancel_token_clone = cancel_token.clone();
    let ctrl_c_handle = tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            eprintln!("Failed to listen for Ctrl+C: {}", err);
            return;
        }
        eprintln!("Interrupted, stopping... (press Ctrl+C again to quit immediately)");
        cancel_token_clone.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(EXIT_INTERRUPTED);
        }
    });

    let result = cli.run(cancel_token).await;
    ctrl_c_handle.abort();
    result
}

/// Initialize logging system based on verbosity level
///
/// `RUST_LOG`, when set, takes precedence over flags and configuration.
///
/// # Arguments
/// * `cli` - CLI interface with the effective logging configuration
fn initialize_logging(cli: &CliInterface) {
    let level = cli.config().logging.level.to_tracing_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
