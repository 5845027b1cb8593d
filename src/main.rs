//! zoom-gateway binary entry point.

// crates.io
use color_eyre::Result;
// self
use zoom_gateway::{config::Config, obs, server};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = Config::load();

	obs::init_subscriber();
	tracing::info!(?config, "starting zoom-gateway");
	server::run(config).await?;

	Ok(())
}
