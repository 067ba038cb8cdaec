//! Main application entry point (CLI binary).
//!
//! A thin wrapper around the `mail_posture` library: parses arguments,
//! initializes logging, runs one assessment and prints the report as JSON.

use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use mail_posture::initialization::{init_logger_with, init_resolver};
use mail_posture::{Assessor, Config, HickoryResolver};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    let options = config.scan_options();
    let resolver = HickoryResolver::new(init_resolver(options.dns_timeout));
    let assessor = Assessor::new(resolver, options);

    let report = match assessor
        .assess(&config.domain, Some(&config.score_version))
        .await
    {
        Ok(report) => report,
        Err(e) => {
            eprintln!("mail_posture error: {e}");
            process::exit(1);
        }
    };

    let json = if config.compact {
        serde_json::to_string(&report)
    } else {
        serde_json::to_string_pretty(&report)
    }
    .context("Failed to serialize report")?;
    println!("{json}");

    if let Some(threshold) = config.fail_below {
        if report.score < threshold {
            eprintln!(
                "Score {} is below the --fail-below threshold of {threshold}",
                report.score
            );
            process::exit(2);
        }
    }

    Ok(())
}
