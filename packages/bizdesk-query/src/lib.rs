//! Query state and pagination arithmetic shared by every backend-driven list page.

pub mod pagination;
pub mod params;

pub use pagination::{Pagination, total_pages};
pub use params::{
	DATE_FORMAT, DateRange, Filters, KeyValue, SearchParams, format_date, parse_date,
};

pub const FIRST_PAGE: u32 = 1;
