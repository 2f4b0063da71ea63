//! hashstamp - content-addressed staleness tracking
//!
//! Walks a directory tree, digests every candidate file and compares the
//! result with the digest stored in an extended attribute on the file
//! itself. Stale files are handed to a regenerator and, once that succeeds,
//! their attribute is updated so that the next run skips them.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod regen;
pub mod scanner;
pub mod signal;
pub mod stamp;
pub mod store;

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, Commands, OutputFormat};
use crate::config::Config;
use crate::error::ExitCode;
use crate::regen::{NoopRegenerator, Regenerator};
use crate::stamp::{RunMode, RunReport, Stamper};
use crate::store::{AttributeStore, XattrStore};

/// Run the application with parsed arguments against real extended attributes.
///
/// # Errors
///
/// Returns an error for invalid configuration, an unusable root, or an
/// attribute namespace the filesystem does not support.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    run_with_store(cli, Arc::new(XattrStore::new()))
}

/// Run the application with parsed arguments against `store`.
///
/// # Errors
///
/// Same as [`run_app`].
pub fn run_with_store(cli: Cli, store: Arc<dyn AttributeStore>) -> anyhow::Result<ExitCode> {
    let handler = signal::install_handler()?;

    let mut config = Config::load(cli.config.as_deref())?;
    let mode = match &cli.command {
        Commands::Stamp(args) => {
            config.merge_stamp_args(args);
            RunMode::Stamp
        }
        Commands::Verify(args) => {
            config.merge_selection(&args.selection);
            RunMode::Verify
        }
    };
    let run = config.to_run_config(cli.verbose)?;
    log::debug!("Run configuration: {:?}", run);

    let regenerator: Arc<dyn Regenerator> = match mode {
        RunMode::Stamp => run.regenerator(),
        RunMode::Verify => Arc::new(NoopRegenerator),
    };
    let stamper = Stamper::new(run.stamper_config(handler.get_flag()), store, regenerator);

    let report = match mode {
        RunMode::Stamp => stamper.run(&run.root),
        RunMode::Verify => stamper.verify(&run.root),
    }
    .with_context(|| format!("Failed to process {}", run.root.display()))?;

    let code = exit_code_for(&report, run.strict);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    output::write_report(&mut out, &report, run.output, run.verbose, code)?;
    out.flush()?;

    Ok(code)
}

/// Whether a fatal error should be rendered as JSON.
///
/// `--output` wins; otherwise the configured format decides, so an
/// `output = "json"` config file gets JSON errors too. A configuration that
/// fails to load falls back to text.
#[must_use]
pub fn wants_json_errors(cli: &Cli) -> bool {
    let format = cli.output_flag().or_else(|| {
        Config::load(cli.config.as_deref())
            .ok()
            .map(|config| config.output)
    });
    format == Some(OutputFormat::Json)
}

/// Map a finished run to the process exit code.
#[must_use]
pub fn exit_code_for(report: &RunReport, strict: bool) -> ExitCode {
    let summary = &report.summary;
    if summary.interrupted {
        ExitCode::Interrupted
    } else if report.mode == RunMode::Verify && summary.transitions() > 0 {
        ExitCode::StaleFound
    } else if strict && summary.skipped + summary.walk_errors > 0 {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    }
}
