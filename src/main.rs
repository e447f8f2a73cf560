use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use duskswitch::cli::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    match try_main(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main(args: Args) -> anyhow::Result<()> {
    let command = args.command.name();
    duskswitch::run(args).with_context(|| format!("`{command}` failed"))
}
