use reqwest::Url;

use bizdesk_query::{SearchParams, format_date};

use crate::Result;

pub const SEARCH_PARAM: &str = "search";
pub const FROM_DATE_PARAM: &str = "from_date";
pub const TO_DATE_PARAM: &str = "to_date";
pub const PAGE_PARAM: &str = "page";
pub const PAGE_SIZE_PARAM: &str = "page_size";

/// Appends the query string for `params` to `base`.
///
/// Pairs are written in a fixed order: `search`, `from_date`, `to_date`, the valid key/value
/// filters in insertion order, then `page` and `page_size`. Optional pairs are omitted when unset,
/// so the same params always render the same URL.
pub fn build_url(base: &Url, params: &SearchParams) -> Result<Url> {
	let mut url = base.clone();

	{
		let mut query = url.query_pairs_mut();

		if !params.search.is_empty() {
			query.append_pair(SEARCH_PARAM, &params.search);
		}
		if let Some(from) = params.date_range.from {
			query.append_pair(FROM_DATE_PARAM, &format_date(from)?);
		}
		if let Some(to) = params.date_range.to {
			query.append_pair(TO_DATE_PARAM, &format_date(to)?);
		}

		for entry in params.valid_key_values() {
			query.append_pair(&entry.key, &entry.value);
		}

		query.append_pair(PAGE_PARAM, &params.page.to_string());
		query.append_pair(PAGE_SIZE_PARAM, &params.page_size.to_string());
	}

	Ok(url)
}
