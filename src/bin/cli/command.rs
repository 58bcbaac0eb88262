#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Command,
}

#[derive(clap::Subcommand)]
pub enum Command {
	/// Compute the metrics of a play described by hand
	Metrics(crate::commands::metrics::Args),
	/// Fetch a score from the osu! api and compute its metrics
	Score(crate::commands::score::Args),
	/// Run the `recent` bot command, printing replies to stdout
	Recent(crate::commands::recent::Args),
}
