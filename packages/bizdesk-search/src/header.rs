use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
	pub title: String,
	pub subtitle: Option<String>,
}

/// Page title and subtitle for the current session.
///
/// Cloning shares the same slot, so the handle is passed to every page explicitly instead of
/// living in a global.
#[derive(Debug, Clone, Default)]
pub struct HeaderContext {
	slot: Arc<RwLock<Option<HeaderInfo>>>,
}
impl HeaderContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_header_info(&self, title: impl Into<String>, subtitle: Option<String>) {
		let info = HeaderInfo { title: title.into(), subtitle };

		tracing::debug!(title = %info.title, "Page header registered.");

		*self.slot.write().unwrap_or_else(|err| err.into_inner()) = Some(info);
	}

	pub fn header_info(&self) -> Option<HeaderInfo> {
		self.slot.read().unwrap_or_else(|err| err.into_inner()).clone()
	}

	/// Called on logout.
	pub fn reset(&self) {
		*self.slot.write().unwrap_or_else(|err| err.into_inner()) = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clones_share_the_header() {
		let context = HeaderContext::new();
		let page = context.clone();

		page.set_header_info("Opening Stock", Some("Production".to_string()));

		assert_eq!(
			context.header_info(),
			Some(HeaderInfo {
				title: "Opening Stock".to_string(),
				subtitle: Some("Production".to_string()),
			})
		);

		context.reset();

		assert_eq!(page.header_info(), None);
	}
}
