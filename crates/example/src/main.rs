//! Audit demo CLI.
//!
//! Weaves the logging, validation and audit aspects into `Account`, runs a
//! short scripted session and prints the resulting audit trail as JSON.
//!
//! # Usage
//!
//! ```bash
//! audit [config.json]
//! ```

use std::process::ExitCode;

use example::{AuditConfig, AuditTrail, session};
use weft_tracing::{TracingConfig, TracingFormat};

#[expect(clippy::print_stderr, reason = "usage errors before tracing is up")]
#[expect(clippy::print_stdout, reason = "the audit trail is the program output")]
fn main() -> ExitCode {
    let config = match std::env::args().nth(1) {
        Some(path) => match AuditConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => AuditConfig::default(),
    };

    if let Err(e) = TracingConfig::new()
        .with_format(TracingFormat::Compact)
        .with_env_filter(config.log_filter.clone())
        .init()
    {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let trail = AuditTrail::new();
    if let Err(e) = session::run(&config, &trail) {
        tracing::error!(error = %e, "session aborted");
        return ExitCode::FAILURE;
    }

    match trail.to_json() {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "cannot serialize the audit trail");
            ExitCode::FAILURE
        }
    }
}
