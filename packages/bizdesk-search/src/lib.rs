//! Debounced, paginated search over a backend list endpoint.

pub mod engine;
pub mod header;

pub use engine::{BackendSearch, SearchOptions, SearchState};
pub use header::{HeaderContext, HeaderInfo};

use std::{future::Future, pin::Pin, sync::Arc};

use serde::de::DeserializeOwned;

use bizdesk_backend::{BackendClient, ListPage, TokenStore, Url};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Where result pages come from. The production source is [`BackendSource`].
pub trait PageSource<T>
where
	Self: Send + Sync,
{
	fn fetch_page<'a>(&'a self, url: Url) -> BoxFuture<'a, bizdesk_backend::Result<ListPage<T>>>;
}

/// Authenticated HTTP source. The token is looked up when each request starts.
pub struct BackendSource {
	client: BackendClient,
	tokens: Arc<dyn TokenStore>,
}
impl BackendSource {
	pub fn new(client: BackendClient, tokens: Arc<dyn TokenStore>) -> Self {
		Self { client, tokens }
	}
}
impl<T> PageSource<T> for BackendSource
where
	T: DeserializeOwned + Send + 'static,
{
	fn fetch_page<'a>(&'a self, url: Url) -> BoxFuture<'a, bizdesk_backend::Result<ListPage<T>>> {
		Box::pin(async move {
			let token = self.tokens.token();

			self.client.fetch_page(url, token.as_deref()).await
		})
	}
}
