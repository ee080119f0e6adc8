use tracing_subscriber::EnvFilter;

/// Logging configuration, meant to be flattened into a binary's clap config.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct Log {
	/// Enable debug logging.
	#[arg(long, short, action)]
	pub verbose: bool,

	/// Disable all logging except errors.
	#[arg(long, conflicts_with = "verbose")]
	pub quiet: bool,
}

impl Log {
	/// Install the global tracing subscriber.
	///
	/// `RUST_LOG` wins over the flags when set.
	pub fn init(&self) {
		let default = if self.verbose {
			"debug"
		} else if self.quiet {
			"error"
		} else {
			"info"
		};

		let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

		tracing_subscriber::fmt()
			.with_env_filter(filter)
			.with_target(false)
			.init();
	}
}
