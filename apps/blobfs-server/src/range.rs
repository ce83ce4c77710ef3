//! Single `Range: bytes=...` header parsing.

/// A `Range` header that cannot be satisfied for the blob's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("requested range not satisfiable")]
pub struct UnsatisfiableRange;

/// Parse a single byte range into inclusive `(start, end)` offsets.
///
/// Supports `bytes=N-M`, `bytes=N-` and `bytes=-N`. An end past the blob is
/// clamped to its last byte. Multi-range requests are not supported.
pub fn parse_range_header(range: &str, content_length: u64) -> Result<(u64, u64), UnsatisfiableRange> {
    let range = range.trim().strip_prefix("bytes=").ok_or(UnsatisfiableRange)?;
    if content_length == 0 || range.contains(',') {
        return Err(UnsatisfiableRange);
    }

    let (first, last) = range.split_once('-').ok_or(UnsatisfiableRange)?;
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        // bytes=-N: the last N bytes.
        let n: u64 = last.parse().map_err(|_| UnsatisfiableRange)?;
        if n == 0 {
            return Err(UnsatisfiableRange);
        }
        return Ok((content_length.saturating_sub(n), content_length - 1));
    }

    let start: u64 = first.parse().map_err(|_| UnsatisfiableRange)?;
    if start >= content_length {
        return Err(UnsatisfiableRange);
    }
    if last.is_empty() {
        return Ok((start, content_length - 1));
    }

    let end: u64 = last.parse().map_err(|_| UnsatisfiableRange)?;
    if start > end {
        return Err(UnsatisfiableRange);
    }
    Ok((start, end.min(content_length - 1)))
}
