//! hashstamp - content-addressed staleness tracking
//!
//! Entry point for the hashstamp CLI application.

use clap::Parser;
use hashstamp::{
    cli::Cli,
    error::{ExitCode, StructuredError},
    logging::init_logging,
};

fn main() {
    let cli = Cli::parse();
    // Decided before logging starts so config warnings are not printed twice.
    let json_errors = hashstamp::wants_json_errors(&cli);

    init_logging(cli.verbose, cli.quiet);

    match hashstamp::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::GeneralError;

            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                match serde_json::to_string_pretty(&structured) {
                    Ok(json) => eprintln!("{json}"),
                    Err(_) => eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err),
                }
            } else {
                eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}
