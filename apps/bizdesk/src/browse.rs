use color_eyre::eyre;
use serde_json::Value;
use time::Date;
use tokio::io::{self, AsyncBufReadExt, BufReader};

use bizdesk_query::{Filters, KeyValue};
use bizdesk_search::{BackendSearch, HeaderContext};

use crate::render;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
	Search(String),
	Next,
	Previous,
	Page(u32),
	Size(u32),
	From(Option<Date>),
	To(Option<Date>),
	Filter(KeyValue),
	Clear,
	Refresh,
	Quit,
}

/// Lines starting with `/` are commands; anything else replaces the search text.
pub fn parse_command(line: &str) -> eyre::Result<BrowseCommand> {
	let line = line.trim();
	let Some(command) = line.strip_prefix('/') else {
		return Ok(BrowseCommand::Search(line.to_string()));
	};
	let (name, arg) = match command.split_once(char::is_whitespace) {
		Some((name, arg)) => (name, arg.trim()),
		None => (command, ""),
	};

	match name {
		"next" | "n" => Ok(BrowseCommand::Next),
		"prev" | "p" => Ok(BrowseCommand::Previous),
		"page" => Ok(BrowseCommand::Page(parse_number(name, arg)?)),
		"size" => Ok(BrowseCommand::Size(parse_number(name, arg)?)),
		"from" => Ok(BrowseCommand::From(parse_optional_date(arg)?)),
		"to" => Ok(BrowseCommand::To(parse_optional_date(arg)?)),
		"filter" => crate::parse_key_value(arg)
			.map(BrowseCommand::Filter)
			.map_err(|message| eyre::eyre!("/filter: {message}")),
		"clear" => Ok(BrowseCommand::Clear),
		"refresh" | "r" => Ok(BrowseCommand::Refresh),
		"quit" | "q" => Ok(BrowseCommand::Quit),
		_ => Err(eyre::eyre!("Unknown command /{name}.")),
	}
}

/// Applies a command to the session, keeping the local copy of the filters in sync.
pub fn apply(search: &BackendSearch<Value>, filters: &mut Filters, command: BrowseCommand) {
	match command {
		BrowseCommand::Search(text) => search.set_search_query(text),
		BrowseCommand::Next => search.next_page(),
		BrowseCommand::Previous => search.previous_page(),
		BrowseCommand::Page(page) => search.set_current_page(page),
		BrowseCommand::Size(page_size) => search.set_page_size(page_size),
		BrowseCommand::From(from) => {
			filters.date_range.from = from;

			search.apply_filters(filters.clone());
		},
		BrowseCommand::To(to) => {
			filters.date_range.to = to;

			search.apply_filters(filters.clone());
		},
		BrowseCommand::Filter(entry) => {
			filters.key_values.retain(|existing| existing.key != entry.key);

			if !entry.value.is_empty() {
				filters.key_values.push(entry);
			}

			search.apply_filters(filters.clone());
		},
		BrowseCommand::Clear => {
			*filters = Filters::default();

			search.clear_filters();
		},
		BrowseCommand::Refresh => search.refresh(),
		BrowseCommand::Quit => {},
	}
}

pub async fn run(search: &BackendSearch<Value>, header: &HeaderContext) -> eyre::Result<()> {
	let mut lines = BufReader::new(io::stdin()).lines();
	let mut updates = search.subscribe();
	let mut filters = Filters::default();
	let mut rendered = 0;

	loop {
		tokio::select! {
			line = lines.next_line() => {
				let Some(line) = line? else {
					break;
				};

				match parse_command(&line) {
					Ok(BrowseCommand::Quit) => break,
					Ok(command) => apply(search, &mut filters, command),
					Err(err) => eprintln!("{err}"),
				}
			},
			changed = updates.changed() => {
				if changed.is_err() {
					break;
				}

				let state = updates.borrow_and_update().clone();

				if state.revision > rendered && !state.is_loading {
					rendered = state.revision;

					render::render_page(
						&mut std::io::stdout().lock(),
						header.header_info().as_ref(),
						&state,
					)?;
				}
			},
		}
	}

	Ok(())
}

fn parse_number(name: &str, raw: &str) -> eyre::Result<u32> {
	raw.parse().map_err(|_| eyre::eyre!("/{name} expects a positive number."))
}

fn parse_optional_date(raw: &str) -> eyre::Result<Option<Date>> {
	if raw.is_empty() {
		return Ok(None);
	}

	crate::parse_date_arg(raw).map(Some).map_err(|message| eyre::eyre!(message))
}
