//! Scripted stand-in for the REST backend used by integration tests.

mod error;

pub use error::{Error, Result};

use std::{
	collections::VecDeque,
	net::SocketAddr,
	sync::{Arc, Mutex},
	time::Duration,
};

use axum::{
	Router,
	extract::{Query, State},
	http::{HeaderMap, StatusCode, Uri, header},
	response::{IntoResponse, Response},
};
use serde_json::Value;
use tokio::{net::TcpListener, task::JoinHandle, time};

const POLL_INTERVAL_MS: u64 = 5;

#[derive(Debug, Clone)]
pub struct MockResponse {
	pub status: u16,
	pub body: String,
}
impl MockResponse {
	pub fn json(body: Value) -> Self {
		Self::with_status(200, body)
	}

	pub fn with_status(status: u16, body: Value) -> Self {
		Self { status, body: body.to_string() }
	}

	/// Body sent verbatim, e.g. to simulate a malformed payload.
	pub fn raw(status: u16, body: impl Into<String>) -> Self {
		Self { status, body: body.into() }
	}
}
impl Default for MockResponse {
	fn default() -> Self {
		Self::json(serde_json::json!({ "data": [] }))
	}
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
	pub path: String,
	pub query: Vec<(String, String)>,
	pub authorization: Option<String>,
}
impl RecordedRequest {
	pub fn param(&self, name: &str) -> Option<&str> {
		self.query.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
	}

	pub fn param_names(&self) -> Vec<&str> {
		self.query.iter().map(|(key, _)| key.as_str()).collect()
	}
}

#[derive(Default)]
struct MockState {
	script: Mutex<VecDeque<MockResponse>>,
	fallback: Mutex<MockResponse>,
	requests: Mutex<Vec<RecordedRequest>>,
}

/// HTTP server on an ephemeral loopback port. Scripted responses are served in order, then the
/// fallback response repeats.
pub struct MockBackend {
	addr: SocketAddr,
	state: Arc<MockState>,
	server: JoinHandle<()>,
}
impl MockBackend {
	pub async fn start() -> Result<Self> {
		let state = Arc::new(MockState::default());
		let app = Router::new().fallback(respond).with_state(state.clone());
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let server = tokio::spawn(async move {
			if let Err(err) = axum::serve(listener, app).await {
				eprintln!("Mock backend stopped: {err}.");
			}
		});

		Ok(Self { addr, state, server })
	}

	pub fn base_url(&self) -> String {
		format!("http://{}", self.addr)
	}

	pub fn enqueue(&self, response: MockResponse) {
		self.state.script.lock().unwrap_or_else(|err| err.into_inner()).push_back(response);
	}

	pub fn set_fallback(&self, response: MockResponse) {
		*self.state.fallback.lock().unwrap_or_else(|err| err.into_inner()) = response;
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.state.requests.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub async fn wait_for_requests(
		&self,
		count: usize,
		timeout: Duration,
	) -> Result<Vec<RecordedRequest>> {
		let poll = async {
			loop {
				let requests = self.requests();

				if requests.len() >= count {
					return requests;
				}

				time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
			}
		};

		time::timeout(timeout, poll).await.map_err(|_| {
			Error::Message(format!(
				"Timed out waiting for {count} request(s); saw {}.",
				self.requests().len()
			))
		})
	}
}
impl Drop for MockBackend {
	fn drop(&mut self) {
		self.server.abort();
	}
}

async fn respond(
	State(state): State<Arc<MockState>>,
	uri: Uri,
	headers: HeaderMap,
	Query(query): Query<Vec<(String, String)>>,
) -> Response {
	let authorization = headers
		.get(header::AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.map(ToOwned::to_owned);

	state.requests.lock().unwrap_or_else(|err| err.into_inner()).push(RecordedRequest {
		path: uri.path().to_string(),
		query,
		authorization,
	});

	let scripted = state.script.lock().unwrap_or_else(|err| err.into_inner()).pop_front();
	let response = match scripted {
		Some(response) => response,
		None => state.fallback.lock().unwrap_or_else(|err| err.into_inner()).clone(),
	};
	let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

	(status, [(header::CONTENT_TYPE, "application/json")], response.body).into_response()
}
