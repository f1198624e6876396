pub mod browse;
pub mod render;

use std::{io::Write, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde_json::Value;
use time::Date;
use tracing_subscriber::EnvFilter;

use bizdesk_backend::{BackendClient, FileTokenStore, TokenStore};
use bizdesk_query::{DateRange, Filters, KeyValue};
use bizdesk_search::{BackendSearch, BackendSource, HeaderContext, PageSource, SearchOptions};

#[derive(Debug, Parser)]
#[command(
	version = bizdesk_cli::VERSION,
	rename_all = "kebab",
	styles = bizdesk_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Fetch one page from a list endpoint and print it.
	List(ListArgs),
	/// Search an endpoint interactively; one command per line on stdin.
	Browse(BrowseArgs),
	/// Store the bearer token used for backend requests.
	Login {
		#[arg(long)]
		token: String,
	},
	/// Forget the stored bearer token.
	Logout,
}

#[derive(Debug, clap::Args)]
pub struct ListArgs {
	/// Endpoint path below the configured API base, e.g. /production/opening.
	#[arg(long)]
	pub endpoint: String,
	#[arg(long, default_value = "")]
	pub search: String,
	#[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date_arg)]
	pub from: Option<Date>,
	#[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date_arg)]
	pub to: Option<Date>,
	#[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_key_value)]
	pub filters: Vec<KeyValue>,
	#[arg(long, default_value_t = 1)]
	pub page: u32,
	#[arg(long)]
	pub page_size: Option<u32>,
	#[arg(long)]
	pub title: Option<String>,
}
impl ListArgs {
	fn filters(&self) -> Filters {
		Filters { date_range: DateRange::new(self.from, self.to), key_values: self.filters.clone() }
	}
}

#[derive(Debug, clap::Args)]
pub struct BrowseArgs {
	#[arg(long)]
	pub endpoint: String,
	#[arg(long)]
	pub page_size: Option<u32>,
	#[arg(long)]
	pub title: Option<String>,
}

/// Everything a page needs for one application session.
pub struct Console {
	client: BackendClient,
	tokens: Arc<FileTokenStore>,
	header: HeaderContext,
	options: SearchOptions,
}
impl Console {
	pub fn new(config: &bizdesk_config::Config) -> color_eyre::Result<Self> {
		Ok(Self {
			client: BackendClient::new(&config.backend)?,
			tokens: Arc::new(FileTokenStore::from_config(&config.session)),
			header: HeaderContext::new(),
			options: SearchOptions::from_config(&config.search),
		})
	}

	pub fn header(&self) -> &HeaderContext {
		&self.header
	}

	/// Mounts a list page: registers its header and starts a search session on `endpoint`.
	pub fn open(
		&self,
		endpoint: &str,
		title: Option<&str>,
		page_size: Option<u32>,
	) -> color_eyre::Result<BackendSearch<Value>> {
		let url = self.client.endpoint_url(endpoint)?;
		let tokens: Arc<dyn TokenStore> = self.tokens.clone();
		let source: Arc<dyn PageSource<Value>> =
			Arc::new(BackendSource::new(self.client.clone(), tokens));
		let mut options = self.options;

		if let Some(page_size) = page_size {
			if page_size == 0 {
				return Err(eyre::eyre!("--page-size must be greater than zero."));
			}

			options.page_size = page_size;
		}

		self.header.set_header_info(title.unwrap_or(endpoint), Some(url.path().to_string()));

		Ok(BackendSearch::spawn(source, url, options))
	}

	pub async fn list(&self, args: ListArgs, out: &mut impl Write) -> color_eyre::Result<()> {
		let search = self.open(&args.endpoint, args.title.as_deref(), args.page_size)?;

		// Commands apply in order. The setters only arm the debounce timer, and `refresh` drops it
		// and sends the final params, so exactly one request goes out.
		search.set_search_query(args.search.clone());
		search.apply_filters(args.filters());
		search.set_current_page(args.page);
		search.refresh();

		let state = search.settled(1).await;

		render::render_page(out, self.header.header_info().as_ref(), &state)?;

		Ok(())
	}

	pub async fn browse(&self, args: BrowseArgs) -> color_eyre::Result<()> {
		let search = self.open(&args.endpoint, args.title.as_deref(), args.page_size)?;

		browse::run(&search, &self.header).await
	}

	pub fn login(&self, token: &str) -> color_eyre::Result<()> {
		if token.trim().is_empty() {
			return Err(eyre::eyre!("Token must be non-empty."));
		}

		self.tokens.store(token.trim())?;

		tracing::info!(path = ?self.tokens.path(), "Session token stored.");

		Ok(())
	}

	pub fn logout(&self) -> color_eyre::Result<()> {
		self.tokens.clear()?;
		self.header.reset();

		tracing::info!(path = ?self.tokens.path(), "Session token cleared.");

		Ok(())
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = bizdesk_config::load(&args.config)?;

	init_tracing(&config)?;

	let console = Console::new(&config)?;

	match args.command {
		Command::List(list) => console.list(list, &mut std::io::stdout().lock()).await,
		Command::Browse(browse) => console.browse(browse).await,
		Command::Login { token } => console.login(&token),
		Command::Logout => console.logout(),
	}
}

pub fn parse_date_arg(raw: &str) -> Result<Date, String> {
	bizdesk_query::parse_date(raw).map_err(|err| format!("Expected YYYY-MM-DD: {err}."))
}

pub fn parse_key_value(raw: &str) -> Result<KeyValue, String> {
	let Some((key, value)) = raw.split_once('=') else {
		return Err("Expected KEY=VALUE.".to_string());
	};

	Ok(KeyValue::new(key.trim(), value.trim()))
}

fn init_tracing(config: &bizdesk_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.try_init()
		.map_err(|err| eyre::eyre!(err))?;

	Ok(())
}
