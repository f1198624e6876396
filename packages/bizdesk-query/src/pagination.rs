use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
	pub total_records: u64,
	pub total_pages: u32,
}
impl Pagination {
	pub fn from_records(total_records: u64, page_size: u32) -> Self {
		Self { total_records, total_pages: total_pages(total_records, page_size) }
	}

	/// Prefers the backend's page count when it reports one.
	pub fn from_totals(total_records: u64, reported_pages: Option<u32>, page_size: u32) -> Self {
		match reported_pages {
			Some(total_pages) => Self { total_records, total_pages },
			None => Self::from_records(total_records, page_size),
		}
	}

	/// Recomputes the page count for a new page size against the known record count.
	pub fn resized(&self, page_size: u32) -> Self {
		Self::from_records(self.total_records, page_size)
	}

	pub fn has_next(&self, page: u32) -> bool {
		page < self.total_pages
	}

	pub fn has_previous(&self, page: u32) -> bool {
		page > 1
	}

	/// Clamps `page` to `[1, total_pages]`; an empty result keeps page 1.
	pub fn clamp_page(&self, page: u32) -> u32 {
		page.min(self.total_pages).max(1)
	}

	/// 1-based inclusive range of rows shown on `page`, or `None` for an empty result.
	pub fn row_range(&self, page: u32, page_size: u32) -> Option<(u64, u64)> {
		if self.total_records == 0 || page_size == 0 {
			return None;
		}

		let page_size = u64::from(page_size);
		let start = u64::from(page.max(1) - 1) * page_size + 1;

		if start > self.total_records {
			return None;
		}

		let end = (start + page_size - 1).min(self.total_records);

		Some((start, end))
	}
}

pub fn total_pages(total_records: u64, page_size: u32) -> u32 {
	if total_records == 0 || page_size == 0 {
		return 0;
	}

	let pages = total_records.div_ceil(u64::from(page_size));

	u32::try_from(pages).unwrap_or(u32::MAX)
}
