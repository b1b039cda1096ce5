use std::process::ExitCode;

use google_maps_platform_mcp::{logging, server, ServerKind};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_logging();

    match server::run(ServerKind::CodeAssist).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "server failed");
            ExitCode::FAILURE
        }
    }
}
