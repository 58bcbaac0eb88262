use clap::Parser;
use command::{Cli, Command};
use osubot::context::Error;
use osubot::logs;

mod command;
mod commands;
mod context;

#[tokio::main]
async fn main() -> Result<(), Error> {
	logs::init();

	let cli = Cli::parse();
	match cli.command {
		Command::Metrics(args) => {
			commands::metrics::run(args)?;
		}
		Command::Score(args) => {
			commands::score::run(args).await?;
		}
		Command::Recent(args) => {
			commands::recent::run(args).await?;
		}
	}

	Ok(())
}
