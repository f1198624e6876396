use std::io::{self, Write};

use serde_json::Value;

use bizdesk_search::{HeaderInfo, SearchState};

/// Prints the page header, one JSON object per row, then the pagination footer and summary.
pub fn render_page(
	out: &mut impl Write,
	header: Option<&HeaderInfo>,
	state: &SearchState<Value>,
) -> io::Result<()> {
	if let Some(header) = header {
		match header.subtitle.as_deref() {
			Some(subtitle) => writeln!(out, "# {} ({subtitle})", header.title)?,
			None => writeln!(out, "# {}", header.title)?,
		}
	}

	if state.data.is_empty() {
		writeln!(out, "No records.")?;
	}

	for row in &state.data {
		writeln!(out, "{row}")?;
	}

	writeln!(out, "{}", footer(state))?;

	if let Some(summary) = state.summary.as_ref() {
		writeln!(out, "Summary: {summary}")?;
	}

	out.flush()
}

pub fn footer<T>(state: &SearchState<T>) -> String {
	let page = format!("page {}/{}", state.current_page(), state.pagination.total_pages);
	let mut line = match state.row_range() {
		Some((start, end)) =>
			format!("Showing {start}-{end} of {} · {page}", state.pagination.total_records),
		None => format!("Showing 0 of {} · {page}", state.pagination.total_records),
	};

	if state.has_active_filters() {
		line.push_str(" · filtered");
	}

	line
}
