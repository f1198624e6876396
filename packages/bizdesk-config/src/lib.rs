mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Backend, Config, DEFAULT_DEBOUNCE_MS, DEFAULT_PAGE_SIZE, DEFAULT_TOKEN_KEY, Search, Service,
	Session,
};

use std::{
	env, fs,
	path::{Path, PathBuf},
};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(path, &raw)
}

pub fn parse(path: &Path, raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	let api_base = cfg.backend.api_base.as_str();

	if api_base.is_empty() {
		return Err(Error::Validation {
			message: "backend.api_base must be non-empty.".to_string(),
		});
	}
	if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
		return Err(Error::Validation {
			message: "backend.api_base must start with http:// or https://.".to_string(),
		});
	}
	if cfg.backend.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "backend.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (key, value) in &cfg.backend.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("backend.default_headers.{key} must be a string."),
			});
		}
	}

	if cfg.session.token_path.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "session.token_path must be non-empty.".to_string(),
		});
	}
	if cfg.session.token_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "session.token_key must be non-empty.".to_string(),
		});
	}
	if cfg.search.page_size == 0 {
		return Err(Error::Validation {
			message: "search.page_size must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let trimmed = cfg.backend.api_base.trim().trim_end_matches('/');

	cfg.backend.api_base = trimmed.to_string();

	if let Ok(rest) = cfg.session.token_path.strip_prefix("~")
		&& let Some(home) = env::var_os("HOME")
	{
		cfg.session.token_path = PathBuf::from(home).join(rest);
	}
}
