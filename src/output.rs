//! CLI output formatting.
//!
//! Every entity leads with its identity (a tag, a page number) and shows
//! asset paths and decode results as indented context lines, so the output
//! reads as a catalog inventory first and a file listing second.
//!
//! # Output Format
//!
//! ## Pages
//!
//! ```text
//! Page 1 (3 of 20 slots)
//!     001 [smile]
//!         Source: emoticons/source/s1
//!     002 [wave]
//!         Source: emoticons/source/s2
//!     004-020 blank
//! ```
//!
//! ## Lookup
//!
//! ```text
//! [smile]
//!     Source: emoticons/source/s1
//!     Static: 24x24
//!     Animated: 8 frames, 800ms
//! ```
//!
//! ## Check
//!
//! ```text
//! Catalog: 42 tags, 40 default slots
//! Static: 41/42 resolved
//! Animated: 40/42 resolved
//! Failures
//!     [broken] static: Failed to decode emoticons/source/b1.gif: ...
//!         Source: emoticons/source/b1
//! Cache (static): 41 hits, 42 misses (83 lookups)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no decoding.

use crate::catalog::{Entry, EntryTable};
use crate::check::CheckReport;
use crate::imaging::{AnimatedImage, StaticImage};
use crate::tags::Segment;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `001` for a single slot, `004-020` for a run.
fn format_range(first: usize, last: usize) -> String {
    if first == last {
        format_index(first)
    } else {
        format!("{}-{}", format_index(first), format_index(last))
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Pages
// ============================================================================

/// Format the padded default pages.
///
/// Runs of placeholder slots collapse into a single `blank` line. Indices are
/// 1-based positions within the whole default sequence.
pub fn format_pages(table: &EntryTable) -> Vec<String> {
    let mut lines = Vec::new();
    let page_size = table.page_size();

    for page_index in 0..table.page_count() {
        let page = table.page(page_index);
        let offset = page_index * page_size;
        let filled = page.iter().filter(|e| !e.is_placeholder()).count();
        if page_index > 0 {
            lines.push(String::new());
        }
        lines.push(format!(
            "Page {} ({} of {} slots)",
            page_index + 1,
            filled,
            page.len()
        ));

        let mut blank_run: Option<usize> = None;
        for (i, entry) in page.iter().enumerate() {
            let pos = offset + i + 1;
            if entry.is_placeholder() {
                blank_run.get_or_insert(pos);
                continue;
            }
            if let Some(first) = blank_run.take() {
                lines.push(format!("{}{} blank", indent(1), format_range(first, pos - 1)));
            }
            lines.push(format!("{}{} {}", indent(1), format_index(pos), entry.text));
            lines.push(format!("{}Source: {}", indent(2), entry.path));
        }
        if let Some(first) = blank_run {
            lines.push(format!(
                "{}{} blank",
                indent(1),
                format_range(first, offset + page.len())
            ));
        }
    }

    if lines.is_empty() {
        lines.push("No default entries".to_string());
    }
    lines
}

pub fn print_pages(table: &EntryTable) {
    print_lines(format_pages(table));
}

// ============================================================================
// Lookup
// ============================================================================

/// Format a single tag lookup with whatever resolved for it.
pub fn format_lookup(
    tag: &str,
    entry: Option<&Entry>,
    still: Option<&StaticImage>,
    animated: Option<&AnimatedImage>,
) -> Vec<String> {
    let Some(entry) = entry else {
        return vec![format!("{} (unknown tag)", tag)];
    };

    let mut lines = vec![
        entry.text.clone(),
        format!("{}Source: {}", indent(1), entry.path),
    ];
    match still {
        Some(img) => {
            let (w, h) = img.dimensions();
            lines.push(format!("{}Static: {}x{}", indent(1), w, h));
        }
        None => lines.push(format!("{}Static: unavailable", indent(1))),
    }
    match animated {
        Some(anim) => lines.push(format!(
            "{}Animated: {} frames, {}ms",
            indent(1),
            anim.frame_count(),
            anim.duration().as_millis()
        )),
        None => lines.push(format!("{}Animated: unavailable", indent(1))),
    }
    lines
}

pub fn print_lookup(
    tag: &str,
    entry: Option<&Entry>,
    still: Option<&StaticImage>,
    animated: Option<&AnimatedImage>,
) {
    print_lines(format_lookup(tag, entry, still, animated));
}

// ============================================================================
// Split
// ============================================================================

/// Format split message segments, marking tags the catalog does not know.
///
/// ```text
/// text "hi "
/// tag  [smile] → emoticons/source/s1
/// tag  [nope] (unknown)
/// ```
pub fn format_segments(segments: &[Segment<'_>], table: &EntryTable) -> Vec<String> {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Text(text) => format!("text {:?}", text),
            Segment::Tag(tag) => match table.get(tag) {
                Some(entry) => format!("tag  {} \u{2192} {}", tag, entry.path),
                None => format!("tag  {} (unknown)", tag),
            },
        })
        .collect()
}

pub fn print_segments(segments: &[Segment<'_>], table: &EntryTable) {
    print_lines(format_segments(segments, table));
}

// ============================================================================
// Check
// ============================================================================

/// Format a catalog check report.
pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Catalog: {} tags, {} default slots",
            report.tags, report.default_slots
        ),
        format!("Static: {}/{} resolved", report.static_ok, report.tags),
        format!("Animated: {}/{} resolved", report.animated_ok, report.tags),
    ];

    if !report.failures.is_empty() {
        lines.push("Failures".to_string());
        for failure in &report.failures {
            lines.push(format!(
                "{}{} {}: {}",
                indent(1),
                failure.tag,
                failure.kind,
                failure.error
            ));
            lines.push(format!("{}Source: {}", indent(2), failure.path));
        }
    }

    lines.push(format!("Cache (static): {}", report.static_cache));
    lines.push(format!("Cache (animated): {}", report.animated_cache));
    lines
}

pub fn print_check_report(report: &CheckReport) {
    print_lines(format_check_report(report));
}

// ============================================================================
// Tests
// ============================================================================
