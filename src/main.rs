use clap::Parser;
use newsdesk::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    newsdesk::logging::init();
    run(Cli::parse())
}
