//! Strata CLI - apply ordered SQL scripts to a hosted PostgreSQL project.

use clap::Parser;

use strata_cli::cli::{Cli, Command, HelperSubcommand};
use strata_cli::commands::{self, Session};
use strata_cli::error::CliResult;
use strata_cli::{logging, output};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.global.verbose);

    if let Err(e) = run(cli).await {
        output::newline();
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    if let Command::Version = cli.command {
        return commands::version::run().await;
    }

    let session = Session::new(cli.global)?;

    match cli.command {
        Command::Apply(args) => commands::apply::run(&session, args).await,
        Command::Run(args) => commands::run::run(&session, args).await,
        Command::List(args) => commands::list::run(&session, args).await,
        Command::Probe => commands::probe::run(&session).await,
        Command::Resolve => commands::resolve::run(&session).await,
        Command::Helper(args) => match args.command {
            HelperSubcommand::Install => commands::helper::install(&session).await,
            HelperSubcommand::Show => commands::helper::show(&session).await,
        },
        Command::Version => commands::version::run().await,
    }
}
