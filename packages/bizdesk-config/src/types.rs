use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_TOKEN_KEY: &str = "auth_token";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub backend: Backend,
	pub session: Session,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Backend {
	/// Base URL every endpoint path is appended to, e.g. "https://erp.example.com/api".
	pub api_base: String,
	pub timeout_ms: u64,
	/// Extra headers sent with every request. Values must be strings.
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
	/// JSON file holding the bearer token written by `login`.
	pub token_path: PathBuf,
	#[serde(default = "default_token_key")]
	pub token_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	#[serde(default = "default_debounce_ms")]
	pub debounce_ms: u64,
	#[serde(default = "default_page_size")]
	pub page_size: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self { debounce_ms: DEFAULT_DEBOUNCE_MS, page_size: DEFAULT_PAGE_SIZE }
	}
}

fn default_token_key() -> String {
	DEFAULT_TOKEN_KEY.to_string()
}

fn default_debounce_ms() -> u64 {
	DEFAULT_DEBOUNCE_MS
}

fn default_page_size() -> u32 {
	DEFAULT_PAGE_SIZE
}
