//! Probe both upstreams once and print what they return.
//!
//! Run with: cargo run --bin verify_upstreams
//!
//! Exits non-zero when any upstream fails outright, so it can gate a deploy.

use std::process::ExitCode;

use ferrylight_service::config::Config;
use ferrylight_service::logging;
use ferrylight_service::upstream::UpstreamClient;
use ferrylight_service::verify::{print_summary, run_full_verification};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logger(config.log_level);

    let client = match UpstreamClient::new(&config.upstream, config.retry.clone()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to build upstream client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("🔍 Verifying upstream endpoints...");
    let report = run_full_verification(&client).await;
    print_summary(&report);

    if report.summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
