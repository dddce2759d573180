use std::collections::HashSet;

use chrono::{Days, NaiveDate};

/// Expands a date specification into request dates.
///
/// If the first two elements both parse under `input_format`, are in
/// ascending order and `days_add` is positive, the pair is treated as an
/// inclusive range stepped by `days_add` days. Any other input is treated
/// as an explicit list: elements that fail to parse are skipped and each
/// distinct input string is emitted once, in first-occurrence order.
///
/// Every emitted date is reformatted with `output_format`. An empty or
/// fully unparseable input yields an empty vector rather than an error.
pub fn expand(
    dates: &[String],
    input_format: &str,
    output_format: &str,
    days_add: i64,
) -> Vec<String> {
    if let Some(range) = expand_range(dates, input_format, output_format, days_add) {
        return range;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for date in dates {
        if !seen.insert(date.as_str()) {
            continue;
        }
        if let Ok(parsed) = NaiveDate::parse_from_str(date, input_format) {
            out.push(parsed.format(output_format).to_string());
        }
    }
    out
}

/// Range mode. `None` means the input does not describe an ascending range
/// and the caller should fall back to list semantics. A non-positive
/// `days_add` cannot step a range, so it diverts the same way.
fn expand_range(
    dates: &[String],
    input_format: &str,
    output_format: &str,
    days_add: i64,
) -> Option<Vec<String>> {
    if dates.len() < 2 || days_add < 1 {
        return None;
    }
    let start = NaiveDate::parse_from_str(&dates[0], input_format).ok()?;
    let end = NaiveDate::parse_from_str(&dates[1], input_format).ok()?;
    if end < start {
        return None;
    }

    let step = Days::new(days_add as u64);
    let mut out = Vec::new();
    let mut current = start;
    while current <= end {
        out.push(current.format(output_format).to_string());
        match current.checked_add_days(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    Some(out)
}
