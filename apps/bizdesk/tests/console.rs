use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
};

use clap::Parser;
use serde_json::{Map, Value, json};
use time::macros::date;

use bizdesk::{Args, Command, Console, ListArgs, render};
use bizdesk_backend::{FileTokenStore, TokenStore};
use bizdesk_config::{Backend, Config, Search, Service, Session};
use bizdesk_query::{Filters, KeyValue, Pagination, SearchParams};
use bizdesk_search::SearchState;
use bizdesk_testkit::{MockBackend, MockResponse};

fn temp_token_path() -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);

	env::temp_dir()
		.join(format!("bizdesk_console_test_{}_{ordinal}", std::process::id()))
		.join("session.json")
}

fn test_config(api_base: String, token_path: PathBuf) -> Config {
	Config {
		service: Service { log_level: "info".to_string() },
		backend: Backend { api_base, timeout_ms: 2_000, default_headers: Map::new() },
		session: Session { token_path, token_key: "auth_token".to_string() },
		search: Search { debounce_ms: 20, page_size: 10 },
	}
}

fn list_args(endpoint: &str) -> ListArgs {
	ListArgs {
		endpoint: endpoint.to_string(),
		search: String::new(),
		from: None,
		to: None,
		filters: Vec::new(),
		page: 1,
		page_size: None,
		title: None,
	}
}

fn state(total_records: u64, page: u32, data: Vec<Value>) -> SearchState<Value> {
	SearchState {
		params: SearchParams::new(10).with_page(page),
		data,
		summary: None,
		pagination: Pagination::from_records(total_records, 10),
		is_loading: false,
		revision: 1,
	}
}

#[test]
fn parses_list_arguments() {
	let args = Args::try_parse_from([
		"bizdesk",
		"-c",
		"bizdesk.toml",
		"list",
		"--endpoint",
		"/production/opening",
		"--from",
		"2024-04-01",
		"--filter",
		"status=open",
		"--filter",
		"karigar=ravi",
		"--page-size",
		"25",
	])
	.expect("Failed to parse args.");
	let Command::List(list) = args.command else {
		panic!("Expected list command.");
	};

	assert_eq!(list.endpoint, "/production/opening");
	assert_eq!(list.from, Some(date!(2024 - 04 - 01)));
	assert_eq!(list.to, None);
	assert_eq!(
		list.filters,
		vec![KeyValue::new("status", "open"), KeyValue::new("karigar", "ravi")]
	);
	assert_eq!(list.page_size, Some(25));
}

#[test]
fn rejects_malformed_filter_and_date() {
	let base = ["bizdesk", "-c", "x.toml", "list", "--endpoint", "/a"];

	assert!(Args::try_parse_from(base.iter().chain(&["--filter", "open"])).is_err());
	assert!(Args::try_parse_from(base.iter().chain(&["--to", "31/03/2024"])).is_err());
}

#[test]
fn footer_describes_visible_rows() {
	assert_eq!(render::footer(&state(34, 4, Vec::new())), "Showing 31-34 of 34 · page 4/4");
	assert_eq!(render::footer(&state(0, 1, Vec::new())), "Showing 0 of 0 · page 1/0");

	let mut filtered = state(3, 1, Vec::new());

	filtered.params = filtered.params.with_filters(Filters {
		key_values: vec![KeyValue::new("status", "open")],
		..Filters::default()
	});

	assert_eq!(render::footer(&filtered), "Showing 1-3 of 3 · page 1/1 · filtered");
}

#[test]
fn empty_page_says_no_records() {
	let mut out = Vec::new();

	render::render_page(&mut out, None, &state(0, 1, Vec::new())).expect("render");

	let text = String::from_utf8(out).expect("utf8");

	assert!(text.starts_with("No records.\n"), "Unexpected output: {text}");
}

#[tokio::test]
async fn list_fetches_and_prints_one_page() {
	let backend = MockBackend::start().await.expect("Failed to start mock backend.");

	backend.enqueue(MockResponse::json(json!({
		"data": [{ "id": 1, "item": "Silk" }, { "id": 2, "item": "Zari" }],
		"info": { "total_weight": 12 },
		"pagination": { "total": 12, "totalPages": 6 }
	})));

	let token_path = temp_token_path();
	let config = test_config(backend.base_url(), token_path.clone());
	let console = Console::new(&config).expect("Failed to build console.");

	console.login("secret").expect("Failed to log in.");

	let mut args = list_args("/production/opening");

	args.search = "silk".to_string();
	args.filters = vec![KeyValue::new("status", "open")];
	args.page = 2;
	args.page_size = Some(2);
	args.title = Some("Opening Stock".to_string());

	let mut out = Vec::new();

	console.list(args, &mut out).await.expect("List failed.");

	let text = String::from_utf8(out).expect("utf8");
	let requests = backend.requests();

	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].param("search"), Some("silk"));
	assert_eq!(requests[0].param("status"), Some("open"));
	assert_eq!(requests[0].param("page"), Some("2"));
	assert_eq!(requests[0].param("page_size"), Some("2"));
	assert_eq!(requests[0].authorization.as_deref(), Some("Bearer secret"));
	assert!(text.starts_with("# Opening Stock (/production/opening)\n"), "Unexpected output: {text}");
	assert!(text.contains(r#"{"id":1,"item":"Silk"}"#), "Unexpected output: {text}");
	assert!(text.contains("Showing 3-4 of 12 · page 2/6 · filtered"), "Unexpected output: {text}");
	assert!(text.contains(r#"Summary: {"total_weight":12}"#), "Unexpected output: {text}");

	console.logout().expect("Failed to log out.");

	assert_eq!(FileTokenStore::new(&token_path, "auth_token").token(), None);
	assert_eq!(console.header().header_info(), None);

	if let Some(parent) = token_path.parent() {
		let _ = fs::remove_dir_all(parent);
	}
}

#[tokio::test]
async fn list_past_the_end_prints_last_page() {
	let backend = MockBackend::start().await.expect("Failed to start mock backend.");

	backend.enqueue(MockResponse::json(json!({
		"data": [],
		"pagination": { "total": 12, "totalPages": 2 }
	})));
	backend.enqueue(MockResponse::json(json!({
		"data": [{ "id": 11 }, { "id": 12 }],
		"pagination": { "total": 12, "totalPages": 2 }
	})));

	let config = test_config(backend.base_url(), temp_token_path());
	let console = Console::new(&config).expect("Failed to build console.");
	let mut args = list_args("/production/opening");

	args.page = 9;

	let mut out = Vec::new();

	console.list(args, &mut out).await.expect("List failed.");

	let text = String::from_utf8(out).expect("utf8");
	let requests = backend.requests();

	assert_eq!(requests.len(), 2);
	assert_eq!(requests[0].param("page"), Some("9"));
	assert_eq!(requests[1].param("page"), Some("2"));
	assert!(!text.contains("No records."), "Unexpected output: {text}");
	assert!(text.contains(r#"{"id":11}"#), "Unexpected output: {text}");
	assert!(text.contains("Showing 11-12 of 12 · page 2/2"), "Unexpected output: {text}");
}
