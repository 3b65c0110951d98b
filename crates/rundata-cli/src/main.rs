//! Rundata CLI: the `addrundata` command.

mod cli;
mod commands;
mod config;
mod support;

use clap::Parser;
use cli::Cli;
use support::{Status, init_logging, load_config_or_exit};

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = load_config_or_exit(cli.config.as_deref());
    // Plan JSON on stdout must not interleave with status lines.
    let status = Status::new(cli.format.is_some() && cli.output.is_none());

    let suite = if cli.fix {
        commands::rundata::fix(&cli.root, &config, &status)
    } else {
        commands::rundata::check(&cli.root, &config, cli.json, &status)
    };

    if let Some(format) = cli.format {
        commands::plan::run(commands::plan::Args {
            suite: &suite,
            config: &config,
            format: format.into(),
            merge: cli.merge.as_deref(),
            output: cli.output.as_deref(),
        });
    }
}
