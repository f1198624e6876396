use std::{future, sync::Arc, time::Duration};

use serde_json::Value;
use tokio::{
	sync::{mpsc, watch},
	task::{self, JoinHandle, JoinSet},
	time::{self, Instant},
};

use bizdesk_backend::{ListPage, Url, build_url};
use bizdesk_config::{DEFAULT_DEBOUNCE_MS, DEFAULT_PAGE_SIZE};
use bizdesk_query::{DateRange, Filters, KeyValue, Pagination, SearchParams};

use crate::PageSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
	pub debounce: Duration,
	pub page_size: u32,
}
impl SearchOptions {
	pub fn from_config(cfg: &bizdesk_config::Search) -> Self {
		Self { debounce: Duration::from_millis(cfg.debounce_ms), page_size: cfg.page_size }
	}
}
impl Default for SearchOptions {
	fn default() -> Self {
		Self { debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS), page_size: DEFAULT_PAGE_SIZE }
	}
}

/// Snapshot published after every change to the query or the fetched result.
#[derive(Debug, Clone)]
pub struct SearchState<T> {
	pub params: SearchParams,
	pub data: Vec<T>,
	pub summary: Option<Value>,
	pub pagination: Pagination,
	pub is_loading: bool,
	/// Number of responses applied so far, failures included.
	pub revision: u64,
}
impl<T> SearchState<T> {
	fn new(params: SearchParams) -> Self {
		Self {
			params,
			data: Vec::new(),
			summary: None,
			pagination: Pagination::default(),
			is_loading: false,
			revision: 0,
		}
	}

	pub fn search_query(&self) -> &str {
		&self.params.search
	}

	pub fn date_range(&self) -> DateRange {
		self.params.date_range
	}

	pub fn key_values(&self) -> &[KeyValue] {
		&self.params.key_values
	}

	pub fn has_active_filters(&self) -> bool {
		self.params.has_active_filters()
	}

	pub fn current_page(&self) -> u32 {
		self.params.page
	}

	pub fn page_size(&self) -> u32 {
		self.params.page_size
	}

	pub fn has_next_page(&self) -> bool {
		self.pagination.has_next(self.params.page)
	}

	pub fn has_previous_page(&self) -> bool {
		self.pagination.has_previous(self.params.page)
	}

	pub fn row_range(&self) -> Option<(u64, u64)> {
		self.pagination.row_range(self.params.page, self.params.page_size)
	}
}

#[derive(Debug)]
enum Command {
	SetSearch(String),
	ApplyFilters(Filters),
	ClearFilters,
	SetPage(u32),
	SetPageSize(u32),
	NextPage,
	PreviousPage,
	Refresh,
}

/// Handle to a search session over one endpoint.
///
/// Setters only enqueue work; the session task applies them in order, debounces fetches and
/// publishes [`SearchState`] snapshots. Dropping the handle stops the task together with any
/// pending timer or in-flight request, so no state is written after teardown.
pub struct BackendSearch<T> {
	commands: mpsc::UnboundedSender<Command>,
	state: watch::Receiver<SearchState<T>>,
	endpoint: Url,
	task: JoinHandle<()>,
}
impl<T> BackendSearch<T>
where
	T: Clone + Send + Sync + 'static,
{
	/// Starts the session. The first fetch goes out once the debounce window elapses.
	pub fn spawn(source: Arc<dyn PageSource<T>>, endpoint: Url, options: SearchOptions) -> Self {
		let params = SearchParams::new(options.page_size);
		let (state_tx, state_rx) = watch::channel(SearchState::new(params.clone()));
		let (command_tx, command_rx) = mpsc::unbounded_channel();
		let session = Session {
			source,
			endpoint: endpoint.clone(),
			debounce: options.debounce,
			params,
			pagination: Pagination::default(),
			state: state_tx,
			deadline: Some(Instant::now() + options.debounce),
			sequence: 0,
			pending: None,
			in_flight: JoinSet::new(),
		};
		let task = tokio::spawn(session.run(command_rx));

		Self { commands: command_tx, state: state_rx, endpoint, task }
	}

	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	pub fn set_search_query(&self, text: impl Into<String>) {
		self.send(Command::SetSearch(text.into()));
	}

	pub fn apply_filters(&self, filters: Filters) {
		self.send(Command::ApplyFilters(filters));
	}

	pub fn clear_filters(&self) {
		self.send(Command::ClearFilters);
	}

	pub fn set_current_page(&self, page: u32) {
		self.send(Command::SetPage(page));
	}

	pub fn set_page_size(&self, page_size: u32) {
		self.send(Command::SetPageSize(page_size));
	}

	pub fn next_page(&self) {
		self.send(Command::NextPage);
	}

	pub fn previous_page(&self) {
		self.send(Command::PreviousPage);
	}

	/// Fetches the current params right away, skipping the debounce window.
	pub fn refresh(&self) {
		self.send(Command::Refresh);
	}

	pub fn state(&self) -> SearchState<T> {
		self.state.borrow().clone()
	}

	pub fn subscribe(&self) -> watch::Receiver<SearchState<T>> {
		self.state.clone()
	}

	/// Waits until at least `revision` responses have been applied and nothing is loading.
	pub async fn settled(&self, revision: u64) -> SearchState<T> {
		let mut state = self.state.clone();

		if state.wait_for(|state| state.revision >= revision && !state.is_loading).await.is_err() {
			tracing::warn!(revision, "Search session stopped before settling.");
		}

		state.borrow().clone()
	}

	fn send(&self, command: Command) {
		if let Err(err) = self.commands.send(command) {
			tracing::warn!(command = ?err.0, "Search session has stopped; command dropped.");
		}
	}
}
impl<T> Drop for BackendSearch<T> {
	fn drop(&mut self) {
		self.task.abort();
	}
}

struct Dispatch {
	sequence: u64,
	task: task::Id,
	params: SearchParams,
}

type Completion<T> = (u64, bizdesk_backend::Result<ListPage<T>>);

struct Session<T> {
	source: Arc<dyn PageSource<T>>,
	endpoint: Url,
	debounce: Duration,
	params: SearchParams,
	pagination: Pagination,
	state: watch::Sender<SearchState<T>>,
	deadline: Option<Instant>,
	sequence: u64,
	/// Newest dispatch whose response has not arrived yet.
	pending: Option<Dispatch>,
	in_flight: JoinSet<Completion<T>>,
}
impl<T> Session<T>
where
	T: Send + Sync + 'static,
{
	async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
		loop {
			tokio::select! {
				command = commands.recv() => match command {
					Some(command) => self.handle(command),
					None => break,
				},
				_ = sleep_until(self.deadline) => {
					self.deadline = None;
					self.dispatch(false);
				},
				Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
					match joined {
						Ok((sequence, result)) => self.complete(sequence, result),
						Err(err) => self.abandon(err),
					}
				},
			}
		}

		tracing::debug!(endpoint = %self.endpoint, "Search session closed.");
	}

	fn handle(&mut self, command: Command) {
		match command {
			Command::SetSearch(text) => self.update(self.params.with_search(text)),
			Command::ApplyFilters(filters) => self.update(self.params.with_filters(filters)),
			Command::ClearFilters => self.update(self.params.cleared()),
			Command::SetPage(page) => self.update(self.params.with_page(page)),
			Command::SetPageSize(page_size) => {
				if page_size == 0 {
					tracing::warn!("Ignoring page size of zero.");

					return;
				}
				if page_size == self.params.page_size {
					return;
				}

				self.pagination = self.pagination.resized(page_size);

				self.update(self.params.with_page_size(page_size));
			},
			Command::NextPage =>
				if self.pagination.has_next(self.params.page) {
					self.update(self.params.with_page(self.params.page + 1));
				},
			Command::PreviousPage =>
				if self.pagination.has_previous(self.params.page) {
					self.update(self.params.with_page(self.params.page - 1));
				},
			Command::Refresh => {
				self.deadline = None;

				self.dispatch(true);
			},
		}
	}

	fn update(&mut self, params: SearchParams) {
		if params == self.params {
			return;
		}

		self.params = params;
		self.deadline = Some(Instant::now() + self.debounce);

		let params = self.params.clone();
		let pagination = self.pagination;

		self.state.send_modify(|state| {
			state.params = params;
			state.pagination = pagination;
		});
	}

	/// Sends the current params. Unless forced, params identical to the pending request are
	/// not sent twice.
	fn dispatch(&mut self, forced: bool) {
		if !forced
			&& let Some(pending) = self.pending.as_ref()
			&& pending.params == self.params
		{
			tracing::debug!(sequence = pending.sequence, "Identical request already in flight.");

			return;
		}

		let url = match build_url(&self.endpoint, &self.params) {
			Ok(url) => url,
			Err(err) => {
				tracing::warn!(error = %err, "Failed to build search URL.");

				self.pending = None;
				self.clear_data();

				return;
			},
		};

		self.sequence += 1;

		let sequence = self.sequence;
		let source = Arc::clone(&self.source);

		tracing::debug!(sequence, %url, "Dispatching search request.");

		let handle = self.in_flight.spawn(async move {
			let result = source.fetch_page(url).await;

			(sequence, result)
		});

		self.pending = Some(Dispatch { sequence, task: handle.id(), params: self.params.clone() });
		self.state.send_modify(|state| state.is_loading = true);
	}

	fn complete(&mut self, sequence: u64, result: bizdesk_backend::Result<ListPage<T>>) {
		let Some(dispatch) = self.pending.take_if(|pending| pending.sequence == sequence) else {
			tracing::debug!(sequence, latest = self.sequence, "Discarding stale search response.");

			return;
		};

		match result {
			Ok(page) => self.apply(dispatch.params, page),
			Err(err) => {
				tracing::warn!(error = %err, sequence, "Search request failed.");

				self.clear_data();
			},
		}
	}

	fn apply(&mut self, requested: SearchParams, page: ListPage<T>) {
		let total_records =
			page.totals.map(|totals| totals.total).unwrap_or(page.data.len() as u64);

		self.pagination = if requested.page_size == self.params.page_size {
			Pagination::from_totals(
				total_records,
				page.totals.and_then(|totals| totals.total_pages),
				requested.page_size,
			)
		} else {
			Pagination::from_records(total_records, self.params.page_size)
		};

		let params = self.params.clone();
		let pagination = self.pagination;
		let ListPage { data, summary, .. } = page;

		if pagination.total_pages > 0 && params.page > pagination.total_pages {
			let clamped = pagination.clamp_page(params.page);

			tracing::debug!(page = params.page, clamped, "Clamping page past the end.");

			self.params = params.with_page(clamped);

			let params = self.params.clone();

			// Rows past the end are not published; the snapshot stays loading until the clamped
			// page arrives.
			self.state.send_modify(|state| {
				state.params = params;

				if let Some(summary) = summary {
					state.summary = Some(summary);
				}

				state.pagination = pagination;
			});
			self.deadline = None;
			self.dispatch(true);

			return;
		}

		self.state.send_modify(|state| {
			state.params = params;
			state.data = data;

			if let Some(summary) = summary {
				state.summary = Some(summary);
			}

			state.pagination = pagination;
			state.is_loading = false;
			state.revision += 1;
		});
	}

	/// Failures leave an empty page behind; pagination and summary keep their last values.
	fn clear_data(&mut self) {
		self.state.send_modify(|state| {
			state.data.clear();
			state.is_loading = false;
			state.revision += 1;
		});
	}

	fn abandon(&mut self, err: task::JoinError) {
		let task = err.id();

		tracing::error!(error = %err, %task, "Search request task failed.");

		if self.pending.take_if(|pending| pending.task == task).is_some() {
			self.clear_data();
		}
	}
}

async fn sleep_until(deadline: Option<Instant>) {
	match deadline {
		Some(deadline) => time::sleep_until(deadline).await,
		None => future::pending().await,
	}
}
