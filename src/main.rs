//! `scopecfg` - microscope hardware configuration loader and validator

use clap::Parser;

use scopecfg::cli::args::Cli;
use scopecfg::cli::commands;
use scopecfg::error::ExitCode;
use scopecfg::observability::{LogFormat, init_logging};

fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(LogFormat::Human, cli.verbose, cli.color);
    }

    match commands::dispatch(cli) {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
