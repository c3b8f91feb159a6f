//! Numeric range patterns for enumerating storage prefixes.
//!
//! `expand_ranges("2023/[01-13]/")` yields one string per month. Several
//! ranges in one pattern expand to their Cartesian product, left range
//! outermost.

/// A `[start-end]` occurrence inside a pattern.
struct RangeMatch {
    /// Byte offset of `[`.
    open: usize,
    /// Byte offset one past `]`.
    close: usize,
    start: u64,
    end: u64,
    width: usize,
}

/// Expand the first `[start-end]` range of `pattern`, then recurse on each
/// substitution for any later ranges.
///
/// `end` is exclusive. Numbers are zero-padded to the shorter of the two
/// bound widths, so `[08-11]` gives `08`, `09`, `10` and `[8-11]` gives
/// `8`, `9`, `10`. A pattern without a range is returned unchanged; a range
/// with `end <= start` contributes nothing.
pub fn expand_ranges(pattern: &str) -> Vec<String> {
    let Some(found) = find_range(pattern) else {
        return vec![pattern.to_string()];
    };
    let mut out = Vec::new();
    for i in found.start..found.end {
        let substituted = format!(
            "{}{:0width$}{}",
            &pattern[..found.open],
            i,
            &pattern[found.close..],
            width = found.width
        );
        out.extend(expand_ranges(&substituted));
    }
    out
}

fn find_range(pattern: &str) -> Option<RangeMatch> {
    let bytes = pattern.as_bytes();
    let mut from = 0;
    while let Some(rel) = pattern[from..].find('[') {
        let open = from + rel;
        if let Some(found) = parse_range_at(pattern, bytes, open) {
            return Some(found);
        }
        from = open + 1;
    }
    None
}

fn parse_range_at(pattern: &str, bytes: &[u8], open: usize) -> Option<RangeMatch> {
    let start_begin = open + 1;
    let start_end = start_begin + count_digits(&bytes[start_begin..]);
    if start_end == start_begin || bytes.get(start_end) != Some(&b'-') {
        return None;
    }
    let end_begin = start_end + 1;
    let end_end = end_begin + count_digits(&bytes[end_begin..]);
    if end_end == end_begin || bytes.get(end_end) != Some(&b']') {
        return None;
    }
    // Bounds too large for u64 are left as literal text.
    let start = pattern[start_begin..start_end].parse::<u64>().ok()?;
    let end = pattern[end_begin..end_end].parse::<u64>().ok()?;
    Some(RangeMatch {
        open,
        close: end_end + 1,
        start,
        end,
        width: (start_end - start_begin).min(end_end - end_begin),
    })
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pattern_is_identity() {
        assert_eq!(expand_ranges("surveys/2023/"), vec!["surveys/2023/"]);
        assert_eq!(expand_ranges(""), vec![""]);
    }

    #[test]
    fn end_is_exclusive() {
        assert_eq!(expand_ranges("[8-11]"), vec!["8", "9", "10"]);
    }

    #[test]
    fn padding_uses_shorter_bound() {
        assert_eq!(expand_ranges("[08-11]"), vec!["08", "09", "10"]);
        assert_eq!(expand_ranges("[008-11]"), vec!["08", "09", "10"]);
        assert_eq!(expand_ranges("[1-003]"), vec!["1", "2"]);
    }

    #[test]
    fn multiple_ranges_form_product() {
        assert_eq!(
            expand_ranges("A:[1-3] B:[1-3]"),
            vec!["A:1 B:1", "A:1 B:2", "A:2 B:1", "A:2 B:2"]
        );
    }

    #[test]
    fn empty_or_reversed_range_yields_nothing() {
        assert!(expand_ranges("x[5-5]").is_empty());
        assert!(expand_ranges("x[9-2]").is_empty());
        assert!(expand_ranges("A:[1-3] B:[4-4]").is_empty());
    }

    #[test]
    fn surrounding_text_is_kept() {
        assert_eq!(
            expand_ranges("entries/2023-[11-13]/"),
            vec!["entries/2023-11/", "entries/2023-12/"]
        );
    }

    #[test]
    fn malformed_brackets_are_literal() {
        assert_eq!(expand_ranges("[a-3]"), vec!["[a-3]"]);
        assert_eq!(expand_ranges("[1-]"), vec!["[1-]"]);
        assert_eq!(expand_ranges("[1-3"), vec!["[1-3"]);
    }

    #[test]
    fn malformed_bracket_before_real_range() {
        assert_eq!(expand_ranges("[x] [1-3]"), vec!["[x] 1", "[x] 2"]);
    }

    #[test]
    fn expansion_is_restartable() {
        assert_eq!(expand_ranges("[0-2]"), expand_ranges("[0-2]"));
    }
}
