//! Stdio tool server for the HQU academic portal.
//!
//! Logs go to stderr so stdout stays a clean JSON-RPC channel; set `RUST_LOG` to adjust the
//! filter (defaults to `info`).

// std
use std::{io, sync::Arc};
// crates.io
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
// self
use hqu_academic::{config::Config, portal::AcademicClient, server};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	tracing_subscriber::registry()
		.with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let config = Config::from_env()?;
	let client = AcademicClient::new(config.identity, config.descriptor)?;

	tracing::info!(
		student_id = %client.student_id(),
		portal = %client.descriptor().portal_base,
		"Starting the academic tool server."
	);

	server::serve_stdio(Arc::new(client)).await?;

	Ok(())
}
