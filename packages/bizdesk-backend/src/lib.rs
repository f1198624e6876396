//! HTTP access to the business backend's list endpoints.

pub mod response;
pub mod session;
pub mod url;

mod error;

pub use error::{Error, Result};
pub use reqwest::Url;
pub use response::{ListPage, PageTotals, parse_list_response};
pub use session::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use url::build_url;

use std::time::Duration;

use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Builds the request headers. Without a token no `Authorization` header is sent and the backend
/// decides what to do with the request.
pub fn auth_headers(
	token: Option<&str>,
	default_headers: &Map<String, Value>,
) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	if let Some(token) = token.filter(|token| !token.is_empty()) {
		headers.insert(AUTHORIZATION, format!("Bearer {token}").parse()?);
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

#[derive(Debug, Clone)]
pub struct BackendClient {
	http: Client,
	api_base: String,
	default_headers: Map<String, Value>,
}
impl BackendClient {
	pub fn new(cfg: &bizdesk_config::Backend) -> Result<Self> {
		let http = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self {
			http,
			api_base: cfg.api_base.trim_end_matches('/').to_string(),
			default_headers: cfg.default_headers.clone(),
		})
	}

	/// Joins the configured base with a page endpoint such as `/production/opening`.
	pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
		let endpoint = endpoint.trim();
		let raw = if endpoint.starts_with('/') {
			format!("{}{endpoint}", self.api_base)
		} else {
			format!("{}/{endpoint}", self.api_base)
		};

		Url::parse(&raw)
			.map_err(|err| Error::InvalidUrl { url: raw.clone(), message: err.to_string() })
	}

	pub async fn fetch_page<T>(&self, url: Url, token: Option<&str>) -> Result<ListPage<T>>
	where
		T: DeserializeOwned,
	{
		let res = self
			.http
			.get(url)
			.headers(auth_headers(token, &self.default_headers)?)
			.send()
			.await?;
		let body = res.error_for_status()?.bytes().await?;

		parse_list_response(&body)
	}
}
