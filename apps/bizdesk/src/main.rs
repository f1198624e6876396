use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = bizdesk::Args::parse();

	bizdesk::run(args).await
}
