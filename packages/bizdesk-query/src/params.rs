use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::FIRST_PAGE;

/// Wire format of `from_date` / `to_date`.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_date(raw: &str) -> Result<Date, time::error::Parse> {
	Date::parse(raw.trim(), DATE_FORMAT)
}

pub fn format_date(date: Date) -> Result<String, time::error::Format> {
	date.format(DATE_FORMAT)
}

/// Inclusive date bounds. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
	pub from: Option<Date>,
	pub to: Option<Date>,
}
impl DateRange {
	pub fn new(from: Option<Date>, to: Option<Date>) -> Self {
		Self { from, to }
	}

	pub fn is_empty(&self) -> bool {
		self.from.is_none() && self.to.is_none()
	}
}

/// Extra equality filter forwarded to the backend as `key=value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
	pub key: String,
	pub value: String,
}
impl KeyValue {
	pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
		Self { key: key.into(), value: value.into() }
	}

	/// Entries with an empty key or value are never transmitted.
	pub fn is_valid(&self) -> bool {
		!self.key.is_empty() && !self.value.is_empty()
	}
}

/// Filter payload accepted by `apply_filters`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
	pub date_range: DateRange,
	pub key_values: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
	pub search: String,
	pub date_range: DateRange,
	pub key_values: Vec<KeyValue>,
	pub page: u32,
	pub page_size: u32,
}
impl SearchParams {
	pub fn new(page_size: u32) -> Self {
		Self {
			search: String::new(),
			date_range: DateRange::default(),
			key_values: Vec::new(),
			page: FIRST_PAGE,
			page_size: page_size.max(1),
		}
	}

	pub fn valid_key_values(&self) -> impl Iterator<Item = &KeyValue> {
		self.key_values.iter().filter(|entry| entry.is_valid())
	}

	pub fn has_active_filters(&self) -> bool {
		!self.search.is_empty()
			|| !self.date_range.is_empty()
			|| self.valid_key_values().next().is_some()
	}

	pub fn with_search(&self, search: impl Into<String>) -> Self {
		Self { search: search.into(), page: FIRST_PAGE, ..self.clone() }
	}

	pub fn with_filters(&self, filters: Filters) -> Self {
		Self {
			date_range: filters.date_range,
			key_values: filters.key_values,
			page: FIRST_PAGE,
			..self.clone()
		}
	}

	/// Drops the search text, the date range and every key/value filter.
	pub fn cleared(&self) -> Self {
		Self::new(self.page_size)
	}

	pub fn with_page(&self, page: u32) -> Self {
		Self { page: page.max(FIRST_PAGE), ..self.clone() }
	}

	pub fn with_page_size(&self, page_size: u32) -> Self {
		Self { page_size: page_size.max(1), page: FIRST_PAGE, ..self.clone() }
	}
}
