mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    match Cli::parse().command {
        Commands::Compile {
            path,
            data,
            defaults,
            no_input,
            output,
            json,
            verbose,
        } => commands::compile::run(path, data, defaults, no_input, output, json, verbose),
        Commands::Check { path } => commands::check::run(path),
        Commands::Watch { path, data, output } => commands::watch::run(path, data, output),
    }
}
