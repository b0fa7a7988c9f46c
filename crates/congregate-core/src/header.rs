/// Header line every input shard starts with, and every output shard is given.
pub const HEADER: &str = "author,points";

/// Drops `record` when it is exactly the header line and passes it through untouched otherwise.
///
/// The comparison is byte-for-byte: a header with stray whitespace or different casing is
/// treated as data. Safe to call concurrently and repeatedly on the same record.
pub fn strip_header(record: &str) -> Option<&str> {
    if record == HEADER {
        None
    } else {
        Some(record)
    }
}

/// True for records that only differ from the header in surrounding whitespace or ASCII case.
/// These still pass [`strip_header`]; callers use this to warn about them.
pub fn is_near_header(record: &str) -> bool {
    record != HEADER && record.trim().eq_ignore_ascii_case(HEADER)
}
