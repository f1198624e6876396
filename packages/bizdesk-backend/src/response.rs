use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{Error, Result};

/// One page of list results with the aggregate metadata normalized into `summary`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
	pub data: Vec<T>,
	pub summary: Option<Value>,
	pub totals: Option<PageTotals>,
}
impl<T> Default for ListPage<T> {
	fn default() -> Self {
		Self { data: Vec::new(), summary: None, totals: None }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageTotals {
	#[serde(alias = "totalRecords", alias = "total_records")]
	pub total: u64,
	#[serde(default, rename = "totalPages", alias = "total_pages")]
	pub total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawListResponse<T> {
	success: Option<bool>,
	message: Option<String>,
	data: Option<Vec<T>>,
	summary: Option<Value>,
	info: Option<Value>,
	pagination: Option<PageTotals>,
}

pub fn parse_list_response<T>(body: &[u8]) -> Result<ListPage<T>>
where
	T: DeserializeOwned,
{
	let raw: RawListResponse<T> = serde_json::from_slice(body)?;

	if raw.success == Some(false) {
		return Err(Error::Rejected {
			message: raw.message.unwrap_or_else(|| "success is false.".to_string()),
		});
	}

	Ok(ListPage {
		data: raw.data.unwrap_or_default(),
		summary: raw.info.or(raw.summary),
		totals: raw.pagination,
	})
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn parse(body: Value) -> Result<ListPage<Value>> {
		parse_list_response(body.to_string().as_bytes())
	}

	#[test]
	fn info_overrides_summary() {
		let page = parse(json!({
			"data": [{ "id": 1 }],
			"summary": { "total_weight": 10 },
			"info": { "total_weight": 12 }
		}))
		.expect("parse failed");

		assert_eq!(page.summary, Some(json!({ "total_weight": 12 })));
	}

	#[test]
	fn either_alias_populates_summary() {
		let summary = parse(json!({ "data": [], "summary": { "count": 2 } })).expect("summary");
		let info = parse(json!({ "data": [], "info": { "count": 3 } })).expect("info");

		assert_eq!(summary.summary, Some(json!({ "count": 2 })));
		assert_eq!(info.summary, Some(json!({ "count": 3 })));
	}

	#[test]
	fn missing_data_is_empty() {
		let page = parse(json!({ "pagination": { "total": 0, "totalPages": 0 } })).expect("parse");

		assert!(page.data.is_empty());
		assert_eq!(page.totals, Some(PageTotals { total: 0, total_pages: Some(0) }));
	}

	#[test]
	fn accepts_snake_case_totals() {
		let page = parse(json!({ "data": [], "pagination": { "total_records": 7, "total_pages": 1 } }))
			.expect("parse");

		assert_eq!(page.totals, Some(PageTotals { total: 7, total_pages: Some(1) }));
	}

	#[test]
	fn success_false_is_rejected() {
		let err = parse(json!({ "success": false, "message": "Token expired" }))
			.expect_err("Expected rejection.");

		assert!(matches!(err, Error::Rejected { ref message } if message == "Token expired"));
	}

	#[test]
	fn malformed_body_is_an_error() {
		let err = parse_list_response::<Value>(b"<html>bad gateway</html>")
			.expect_err("Expected decode error.");

		assert!(matches!(err, Error::SerdeJson(_)));
	}
}
