use std::process::ExitCode;

use tracing::error;

mod bootstrap;
mod loop_runner;
mod scenario;
mod transport;

pub(crate) fn run() -> ExitCode {
    let wiring = match bootstrap::build_app() {
        Ok(wiring) => wiring,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };
    loop_runner::run(wiring)
}
