//! Tag recognition in free text.
//!
//! A tag is an opening bracket, one to ten characters that are not brackets,
//! and a closing bracket: `[smile]`, `[再见]`. Message bodies are split into
//! literal runs and tag runs so a renderer can swap tags for images. Whether
//! a tag actually names a catalog entry is the resolver's call; unknown tags
//! are still reported as tags here.

use regex::Regex;
use std::sync::LazyLock;

/// Source of the compiled [`tag_pattern`].
pub const TAG_PATTERN: &str = r"\[[^\[\]]{1,10}\]";

static PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TAG_PATTERN).expect("tag pattern must compile"));

/// The compiled tag pattern, shared process-wide.
pub fn tag_pattern() -> &'static Regex {
    &PATTERN
}

/// One piece of a split message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Tag(&'a str),
}

impl<'a> Segment<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Segment::Text(s) | Segment::Tag(s) => s,
        }
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Segment::Tag(_))
    }
}

/// Split `text` into alternating literal and tag segments, in order.
///
/// Empty literal runs are omitted, so concatenating every segment's text
/// reproduces the input exactly.
pub fn split_tags(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    for m in tag_pattern().find_iter(text) {
        if m.start() > last {
            segments.push(Segment::Text(&text[last..m.start()]));
        }
        segments.push(Segment::Tag(m.as_str()));
        last = m.end();
    }
    if last < text.len() {
        segments.push(Segment::Text(&text[last..]));
    }
    segments
}

/// All tags in `text`, in order of appearance.
pub fn find_tags(text: &str) -> Vec<&str> {
    tag_pattern().find_iter(text).map(|m| m.as_str()).collect()
}
