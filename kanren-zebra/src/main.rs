use anyhow::Context;
use clap::Parser;

mod puzzle;

#[derive(Parser, Clone)]
pub struct Config {
	/// The log configuration.
	#[command(flatten)]
	pub log: kanren_native::Log,

	/// Query limits.
	#[command(flatten)]
	pub limits: kanren_native::Limits,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	let config = Config::parse();
	config.log.init();

	tracing::info!("three houses, three nations, three pets; who owns the fish?");

	let query = config.limits.apply(puzzle::query());
	let mut rows = query.subscribe();

	let mut found = false;
	while let Some(row) = rows.next().await? {
		found = true;
		println!("the fish owner is: {}", row.get("owner").context("owner is selected")?);
		tracing::debug!(%row, "full solution");
	}

	if !found {
		anyhow::bail!("puzzle has no solution");
	}
	Ok(())
}
