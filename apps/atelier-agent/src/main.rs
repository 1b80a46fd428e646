use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = atelier_agent::Args::parse();

	atelier_agent::run(args).await
}
