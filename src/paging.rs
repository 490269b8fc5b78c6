//! Default-page layout.
//!
//! The default display shows the source group in fixed-size pages. The last
//! page is filled up with blank placeholder entries so every page has exactly
//! `page_size` slots:
//!
//! ```text
//! 23 entries, page_size 20  →  20 + (3 + 17 blanks)  →  40 slots
//! ```
//!
//! An empty sequence stays empty; there is nothing to pad around.

use crate::catalog::Entry;

/// Number of placeholders needed to round `len` up to a multiple of `page_size`.
pub fn pad_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    match len % page_size {
        0 => 0,
        rem => page_size - rem,
    }
}

/// Append blank placeholder entries until `entries.len()` is a multiple of `page_size`.
///
/// Padding an already padded sequence with the same `page_size` is a no-op.
pub fn pad(mut entries: Vec<Entry>, page_size: usize) -> Vec<Entry> {
    let missing = pad_count(entries.len(), page_size);
    entries.extend(std::iter::repeat_with(Entry::placeholder).take(missing));
    entries
}

/// Number of pages needed to show `len` entries.
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Slice out page `index` (0-based). Out-of-range pages are empty.
pub fn page(entries: &[Entry], page_size: usize, index: usize) -> &[Entry] {
    if page_size == 0 {
        return &[];
    }
    let start = index.saturating_mul(page_size).min(entries.len());
    let end = start.saturating_add(page_size).min(entries.len());
    &entries[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<Entry> {
        (0..n)
            .map(|i| Entry::new(format!("[e{i}]"), format!("emoticons/source/e{i}")))
            .collect()
    }

    #[test]
    fn pad_count_matches_modulo() {
        assert_eq!(pad_count(0, 20), 0);
        assert_eq!(pad_count(1, 20), 19);
        assert_eq!(pad_count(20, 20), 0);
        assert_eq!(pad_count(23, 20), 17);
        assert_eq!(pad_count(40, 20), 0);
    }

    #[test]
    fn pad_count_zero_page_size() {
        assert_eq!(pad_count(7, 0), 0);
    }

    #[test]
    fn pad_single_entry_fills_page() {
        let padded = pad(entries(1), 20);
        assert_eq!(padded.len(), 20);
        assert_eq!(padded[0].text, "[e0]");
        assert!(padded[1..].iter().all(Entry::is_placeholder));
    }

    #[test]
    fn pad_empty_stays_empty() {
        assert!(pad(Vec::new(), 20).is_empty());
    }

    #[test]
    fn pad_is_idempotent() {
        for n in [0, 1, 7, 20, 21, 39, 40] {
            let once = pad(entries(n), 20);
            let twice = pad(once.clone(), 20);
            assert_eq!(once, twice, "n = {n}");
            assert_eq!(once.len() % 20, 0, "n = {n}");
        }
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 20), 0);
        assert_eq!(page_count(1, 20), 1);
        assert_eq!(page_count(40, 20), 2);
        assert_eq!(page_count(41, 20), 3);
    }

    #[test]
    fn page_slices() {
        let all = pad(entries(23), 20);
        assert_eq!(page(&all, 20, 0).len(), 20);
        assert_eq!(page(&all, 20, 1).len(), 20);
        assert_eq!(page(&all, 20, 1)[0].text, "[e20]");
        assert!(page(&all, 20, 2).is_empty());
        assert!(page(&all, 20, usize::MAX).is_empty());
    }
}
