/// Upper bound, in bytes, on a driver info log kept in a diagnostic.
pub const INFO_LOG_CAPACITY: usize = 1024;

const TRUNCATION_MARKER: char = '…';

/// Trims trailing whitespace and cuts `log` down to at most `capacity` bytes.
///
/// The cut lands on a char boundary, and a truncated log ends with `…`
/// (counted in the budget). A capacity too small to hold the marker yields an
/// empty string.
pub fn truncate(log: &str, capacity: usize) -> String {
    let log = log.trim_end();
    if log.len() <= capacity {
        return log.to_string();
    }
    if capacity < TRUNCATION_MARKER.len_utf8() {
        return String::new();
    }

    let budget = capacity - TRUNCATION_MARKER.len_utf8();
    let mut end = budget;
    while !log.is_char_boundary(end) {
        end -= 1;
    }

    let mut truncated = String::with_capacity(end + TRUNCATION_MARKER.len_utf8());
    truncated.push_str(&log[..end]);
    truncated.push(TRUNCATION_MARKER);
    truncated
}

/// [`truncate`] with [`INFO_LOG_CAPACITY`].
pub fn bounded(log: &str) -> String {
    truncate(log, INFO_LOG_CAPACITY)
}
