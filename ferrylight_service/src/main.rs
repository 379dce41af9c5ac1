use std::process::ExitCode;

use ferrylight_service::config::Config;
use ferrylight_service::logging::{self, DataSource};
use ferrylight_service::server;

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

    match server::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::error(DataSource::System, None, &format!("Server error: {}", e));
            ExitCode::FAILURE
        }
    }
}
