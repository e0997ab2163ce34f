use dirsort::cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run_cli(cli::parse())
}
