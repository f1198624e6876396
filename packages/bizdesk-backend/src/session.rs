use std::{
	fs, io,
	path::{Path, PathBuf},
	sync::RwLock,
};

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Synchronous read access to the bearer token of the current session.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the token as stored right now. A missing token is not an error.
	fn token(&self) -> Option<String>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
	token: RwLock<Option<String>>,
}
impl MemoryTokenStore {
	pub fn new(token: Option<String>) -> Self {
		Self { token: RwLock::new(token) }
	}

	pub fn set(&self, token: impl Into<String>) {
		*self.token.write().unwrap_or_else(|err| err.into_inner()) = Some(token.into());
	}

	pub fn clear(&self) {
		*self.token.write().unwrap_or_else(|err| err.into_inner()) = None;
	}
}
impl TokenStore for MemoryTokenStore {
	fn token(&self) -> Option<String> {
		self.token.read().unwrap_or_else(|err| err.into_inner()).clone()
	}
}

/// JSON object on disk, e.g. `{"auth_token": "..."}`, re-read on every lookup.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
	path: PathBuf,
	key: String,
}
impl FileTokenStore {
	pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
		Self { path: path.into(), key: key.into() }
	}

	pub fn from_config(cfg: &bizdesk_config::Session) -> Self {
		Self::new(cfg.token_path.clone(), cfg.token_key.clone())
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn store(&self, token: &str) -> Result<()> {
		let mut entries = self.read_entries()?;

		entries.insert(self.key.clone(), Value::String(token.to_string()));

		self.write_entries(&entries)
	}

	/// Removes the token; other keys in the file are left alone.
	pub fn clear(&self) -> Result<()> {
		let mut entries = self.read_entries()?;

		if entries.remove(&self.key).is_none() {
			return Ok(());
		}

		self.write_entries(&entries)
	}

	fn read_entries(&self) -> Result<Map<String, Value>> {
		let raw = match fs::read(&self.path) {
			Ok(raw) => raw,
			Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
			Err(err) => return Err(Error::Session { path: self.path.clone(), source: err }),
		};

		if raw.iter().all(u8::is_ascii_whitespace) {
			return Ok(Map::new());
		}

		Ok(serde_json::from_slice(&raw)?)
	}

	fn write_entries(&self, entries: &Map<String, Value>) -> Result<()> {
		if let Some(parent) = self.path.parent()
			&& !parent.as_os_str().is_empty()
		{
			fs::create_dir_all(parent)
				.map_err(|err| Error::Session { path: self.path.clone(), source: err })?;
		}

		let payload = serde_json::to_vec_pretty(entries)?;

		fs::write(&self.path, payload)
			.map_err(|err| Error::Session { path: self.path.clone(), source: err })
	}
}
impl TokenStore for FileTokenStore {
	fn token(&self) -> Option<String> {
		match self.read_entries() {
			Ok(entries) => entries
				.get(&self.key)
				.and_then(Value::as_str)
				.filter(|token| !token.is_empty())
				.map(ToOwned::to_owned),
			Err(err) => {
				tracing::warn!(error = %err, path = ?self.path, "Failed to read session token.");

				None
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use std::{
		env,
		sync::atomic::{AtomicU64, Ordering},
	};

	use super::*;

	fn temp_session_path() -> PathBuf {
		static COUNTER: AtomicU64 = AtomicU64::new(0);

		let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);

		env::temp_dir()
			.join(format!("bizdesk_session_test_{}_{ordinal}", std::process::id()))
			.join("session.json")
	}

	#[test]
	fn memory_store_round_trip() {
		let store = MemoryTokenStore::default();

		assert_eq!(store.token(), None);

		store.set("abc");

		assert_eq!(store.token().as_deref(), Some("abc"));

		store.clear();

		assert_eq!(store.token(), None);
	}

	#[test]
	fn file_store_reads_at_call_time() {
		let path = temp_session_path();
		let store = FileTokenStore::new(&path, "auth_token");

		assert_eq!(store.token(), None);

		store.store("first").expect("Failed to store token.");

		assert_eq!(store.token().as_deref(), Some("first"));

		fs::write(&path, r#"{"auth_token":"rotated","theme":"dark"}"#).expect("write");

		assert_eq!(store.token().as_deref(), Some("rotated"));

		store.clear().expect("Failed to clear token.");

		assert_eq!(store.token(), None);

		let remaining = fs::read_to_string(&path).expect("read");

		assert!(remaining.contains("theme"));

		if let Some(parent) = path.parent() {
			let _ = fs::remove_dir_all(parent);
		}
	}

	#[test]
	fn unreadable_file_means_no_token() {
		let path = temp_session_path();

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).expect("mkdir");
		}

		fs::write(&path, "not json").expect("write");

		assert_eq!(FileTokenStore::new(&path, "auth_token").token(), None);

		if let Some(parent) = path.parent() {
			let _ = fs::remove_dir_all(parent);
		}
	}
}
