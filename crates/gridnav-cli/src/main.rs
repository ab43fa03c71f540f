//! gridnav CLI: the `gridnav` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    support::setup_tracing(cli.verbose);

    let input = commands::Input {
        jobs: cli.jobs,
        workspace: cli.workspace,
        config: cli.config,
    };

    match cli.command {
        Commands::CalcId { parameters } => commands::calc_id::run(parameters),

        Commands::Schema { json } => commands::schema::run(input, json),

        Commands::Shadow { ignore, json } => commands::shadow::run(input, ignore, json),

        Commands::Neighbors {
            id,
            ignore,
            max_chars,
            json,
        } => commands::neighbors::run(commands::neighbors::Args {
            input,
            id,
            ignore,
            max_chars,
            json,
        }),
    }
}
