pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error(transparent)]
	DateFormat(#[from] time::error::Format),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("Invalid URL {url:?}: {message}")]
	InvalidUrl { url: String, message: String },
	#[error("Backend rejected the request: {message}")]
	Rejected { message: String },
	#[error("Failed to access session file at {path:?}.")]
	Session { path: std::path::PathBuf, source: std::io::Error },
}
