//! Catalog parsing and the tag → entry lookup table.
//!
//! The bundled catalog is an XML document of groups, each holding entries:
//!
//! ```xml
//! <Emoticons>
//!     <Catalog Title="source">
//!         <Emoticon Tag="[smile]" File="s1" />
//!         <Emoticon Tag="[wave]" File="s2" />
//!     </Catalog>
//!     <Catalog Title="extra">
//!         <Emoticon Tag="[party]" File="p1" />
//!     </Catalog>
//! </Emoticons>
//! ```
//!
//! Every entry resolves to `<dir>/<group title>/<file>`, without extension;
//! the resolver picks `.png` or `.gif` later. Entries in the configured source
//! group also feed the default pages, in document order.
//!
//! ## Structure rules
//!
//! - `Catalog` requires `Title`, and may not sit inside another `Catalog`.
//! - `Emoticon` requires `Tag` and `File`, and must sit directly inside a `Catalog`.
//! - Other elements are allowed only outside any `Catalog` (e.g. the root).
//!
//! Attribute names are matched exactly, case-sensitively. Any violation fails
//! the whole load: a half-built table would silently resolve the wrong set
//! of tags.

use crate::assets::{AssetError, AssetProvider};
use crate::config::CatalogConfig;
use crate::paging;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Serialize;
use std::collections::HashMap;
use std::io::BufRead;
use thiserror::Error;

const GROUP_ELEMENT: &[u8] = b"Catalog";
const ENTRY_ELEMENT: &[u8] = b"Emoticon";
const GROUP_TITLE: &[u8] = b"Title";
const ENTRY_TAG: &[u8] = b"Tag";
const ENTRY_FILE: &[u8] = b"File";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog unreadable: {0}")]
    Unreadable(#[from] AssetError),
    #[error("Malformed catalog XML at byte {position}: {message}")]
    Xml { position: u64, message: String },
    #[error("<{element}> is missing required attribute {attribute:?}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("Unexpected <{element}> {context}")]
    UnexpectedElement { element: String, context: String },
    #[error("Catalog ends before <{element}> is closed")]
    Truncated { element: String },
}

/// A tag and the catalog-relative path of its asset (no extension).
///
/// Placeholders used for page padding have both fields empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Entry {
    pub text: String,
    pub path: String,
}

impl Entry {
    pub fn new(text: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            path: path.into(),
        }
    }

    /// Blank slot used to fill the last default page.
    pub fn placeholder() -> Self {
        Self::new("", "")
    }

    pub fn is_placeholder(&self) -> bool {
        self.text.is_empty()
    }
}

/// Immutable result of a catalog load.
///
/// Holds the tag lookup table and the padded default-page sequence.
#[derive(Debug, Clone, Default)]
pub struct EntryTable {
    by_text: HashMap<String, Entry>,
    defaults: Vec<Entry>,
    page_size: usize,
}

impl EntryTable {
    /// Build a table from already collected parts, padding the default sequence.
    pub fn new(by_text: HashMap<String, Entry>, defaults: Vec<Entry>, page_size: usize) -> Self {
        Self {
            by_text,
            defaults: paging::pad(defaults, page_size),
            page_size,
        }
    }

    /// Entry for `text`, if the catalog defines it.
    pub fn get(&self, text: &str) -> Option<&Entry> {
        self.by_text.get(text)
    }

    /// Number of distinct tags.
    pub fn len(&self) -> usize {
        self.by_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_text.is_empty()
    }

    /// All entries, sorted by tag text.
    pub fn entries(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.by_text.values().collect();
        entries.sort_by(|a, b| a.text.cmp(&b.text));
        entries
    }

    /// Padded default-page sequence.
    pub fn defaults(&self) -> &[Entry] {
        &self.defaults
    }

    pub fn default_count(&self) -> usize {
        self.defaults.len()
    }

    pub fn default_entry(&self, index: usize) -> Option<&Entry> {
        self.defaults.get(index)
    }

    /// Tag text of the default entry at `index`. Placeholders yield `Some("")`.
    pub fn default_text(&self, index: usize) -> Option<&str> {
        self.defaults.get(index).map(|e| e.text.as_str())
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        paging::page_count(self.defaults.len(), self.page_size)
    }

    pub fn page(&self, index: usize) -> &[Entry] {
        paging::page(&self.defaults, self.page_size, index)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Read `<dir>/<config_name>` from the asset provider and parse it.
pub fn load_catalog(
    assets: &dyn AssetProvider,
    config: &CatalogConfig,
) -> Result<EntryTable, CatalogError> {
    let reader = assets.open(&config.document_path())?;
    parse_catalog(std::io::BufReader::new(reader), config)
}

/// Parse a catalog document into an [`EntryTable`].
pub fn parse_catalog<R: BufRead>(
    input: R,
    config: &CatalogConfig,
) -> Result<EntryTable, CatalogError> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut by_text: HashMap<String, Entry> = HashMap::new();
    let mut defaults: Vec<Entry> = Vec::new();
    // Open elements, innermost last.
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut group: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| CatalogError::Xml {
                position: reader.error_position(),
                message: e.to_string(),
            })?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let position = reader.buffer_position();
                let name = e.local_name().as_ref().to_vec();
                match name.as_slice() {
                    GROUP_ELEMENT => {
                        if group.is_some() || stack.iter().any(|n| n == ENTRY_ELEMENT) {
                            return Err(unexpected(&name, "inside another <Catalog>"));
                        }
                        let title =
                            required_attribute(e, position, GROUP_TITLE, "Catalog", "Title")?;
                        if !is_empty {
                            group = Some(title);
                        }
                    }
                    ENTRY_ELEMENT => {
                        let Some(title) = group.as_deref() else {
                            return Err(unexpected(&name, "outside any <Catalog>"));
                        };
                        if stack.last().map(Vec::as_slice) != Some(GROUP_ELEMENT) {
                            return Err(unexpected(&name, "not directly inside <Catalog>"));
                        }
                        let tag = required_attribute(e, position, ENTRY_TAG, "Emoticon", "Tag")?;
                        let file = required_attribute(e, position, ENTRY_FILE, "Emoticon", "File")?;
                        let entry = Entry::new(tag, format!("{}/{}/{}", config.dir, title, file));
                        if title == config.source_group {
                            defaults.push(entry.clone());
                        }
                        by_text.insert(entry.text.clone(), entry);
                    }
                    _ if group.is_some() => {
                        return Err(unexpected(&name, "inside <Catalog>"));
                    }
                    _ => {}
                }
                if !is_empty {
                    stack.push(name);
                }
            }
            Event::End(_) => {
                if stack.pop().as_deref() == Some(GROUP_ELEMENT) {
                    group = None;
                }
            }
            Event::Eof => {
                if let Some(open) = stack.last() {
                    return Err(CatalogError::Truncated {
                        element: String::from_utf8_lossy(open).into_owned(),
                    });
                }
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    log::debug!(
        "catalog loaded: {} tags, {} in source group {:?}",
        by_text.len(),
        defaults.len(),
        config.source_group
    );
    Ok(EntryTable::new(by_text, defaults, config.page_size))
}

fn unexpected(name: &[u8], context: &str) -> CatalogError {
    CatalogError::UnexpectedElement {
        element: String::from_utf8_lossy(name).into_owned(),
        context: context.to_string(),
    }
}

/// Exact-match attribute lookup; a missing or undecodable value is an error.
///
/// `position` is the reader offset just past the start tag.
fn required_attribute(
    start: &BytesStart<'_>,
    position: u64,
    key: &[u8],
    element: &'static str,
    attribute: &'static str,
) -> Result<String, CatalogError> {
    for attr in start.attributes() {
        let attr = attr.map_err(|e| CatalogError::Xml {
            position,
            message: e.to_string(),
        })?;
        if attr.key.as_ref() == key {
            return attr
                .unescape_value()
                .map(|v| v.into_owned())
                .map_err(|e| CatalogError::Xml {
                    position,
                    message: e.to_string(),
                });
        }
    }
    Err(CatalogError::MissingAttribute { element, attribute })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use crate::test_helpers::*;

    fn parse(xml: &str) -> Result<EntryTable, CatalogError> {
        parse_catalog(xml.as_bytes(), &catalog_config())
    }

    // =========================================================================
    // Well-formed catalogs
    // =========================================================================

    #[test]
    fn parse_builds_paths_from_group_and_file() {
        let table = parse(&catalog_xml(&[
            ("source", &[("[smile]", "s1")]),
            ("extra", &[("[party]", "p1")]),
        ]))
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("[smile]").unwrap().path, "emoticons/source/s1");
        assert_eq!(table.get("[party]").unwrap().path, "emoticons/extra/p1");
        assert!(table.get("[nope]").is_none());
    }

    #[test]
    fn single_source_entry_pads_to_one_page() {
        let table = parse(&catalog_xml(&[("source", &[("[smile]", "s1")])])).unwrap();

        assert_eq!(table.default_count(), 20);
        assert_eq!(table.default_text(0), Some("[smile]"));
        assert_eq!(table.default_text(1), Some(""));
        assert_eq!(table.default_text(20), None);
        assert_eq!(table.page_count(), 1);
    }

    #[test]
    fn only_source_group_feeds_defaults() {
        let table = parse(&catalog_xml(&[
            ("extra", &[("[party]", "p1")]),
            ("source", &[("[smile]", "s1"), ("[wave]", "s2")]),
        ]))
        .unwrap();

        let tags: Vec<&str> = table
            .defaults()
            .iter()
            .filter(|e| !e.is_placeholder())
            .map(|e| e.text.as_str())
            .collect();
        assert_eq!(tags, vec!["[smile]", "[wave]"]);
    }

    #[test]
    fn duplicate_tag_later_group_wins() {
        let table = parse(&catalog_xml(&[
            ("source", &[("[dup]", "first")]),
            ("extra", &[("[dup]", "second")]),
        ]))
        .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("[dup]").unwrap().path, "emoticons/extra/second");
    }

    #[test]
    fn no_source_entries_leaves_defaults_empty() {
        let table = parse(&catalog_xml(&[("extra", &[("[party]", "p1")])])).unwrap();
        assert_eq!(table.default_count(), 0);
        assert_eq!(table.page_count(), 0);
    }

    #[test]
    fn defaults_are_page_multiple() {
        let entries: Vec<(String, String)> = (0..27)
            .map(|i| (format!("[t{i}]"), format!("f{i}")))
            .collect();
        let refs: Vec<(&str, &str)> = entries
            .iter()
            .map(|(t, f)| (t.as_str(), f.as_str()))
            .collect();
        let table = parse(&catalog_xml(&[("source", &refs)])).unwrap();
        assert_eq!(table.default_count(), 40);
        assert_eq!(table.page(1).len(), 20);
        assert_eq!(table.page(1)[6].text, "[t26]");
        assert!(table.page(1)[7].is_placeholder());
    }

    #[test]
    fn escaped_attribute_values_are_unescaped() {
        let xml = r#"<Emoticons><Catalog Title="source"><Emoticon Tag="[a&amp;b]" File="ab" /></Catalog></Emoticons>"#;
        let table = parse(xml).unwrap();
        assert!(table.get("[a&b]").is_some());
    }

    #[test]
    fn catalog_without_wrapper_root_is_accepted() {
        let xml = r#"<Catalog Title="source"><Emoticon Tag="[x]" File="x" /></Catalog>"#;
        let table = parse(xml).unwrap();
        assert_eq!(table.get("[x]").unwrap().path, "emoticons/source/x");
    }

    #[test]
    fn entries_sorted_by_text() {
        let table = parse(&catalog_xml(&[("source", &[("[b]", "b"), ("[a]", "a")])])).unwrap();
        let texts: Vec<&str> = table.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["[a]", "[b]"]);
    }

    // =========================================================================
    // Malformed catalogs
    // =========================================================================

    #[test]
    fn attribute_names_are_case_sensitive() {
        let xml = r#"<Emoticons><Catalog Title="source"><Emoticon tag="[x]" File="x" /></Catalog></Emoticons>"#;
        assert!(matches!(
            parse(xml),
            Err(CatalogError::MissingAttribute {
                attribute: "Tag",
                ..
            })
        ));
    }

    #[test]
    fn missing_title_is_error() {
        let xml = r#"<Emoticons><Catalog><Emoticon Tag="[x]" File="x" /></Catalog></Emoticons>"#;
        assert!(matches!(
            parse(xml),
            Err(CatalogError::MissingAttribute {
                element: "Catalog",
                ..
            })
        ));
    }

    #[test]
    fn missing_file_is_error() {
        let xml = r#"<Emoticons><Catalog Title="source"><Emoticon Tag="[x]" /></Catalog></Emoticons>"#;
        assert!(matches!(
            parse(xml),
            Err(CatalogError::MissingAttribute { attribute: "File", .. })
        ));
    }

    #[test]
    fn entry_outside_group_is_error() {
        let xml = r#"<Emoticons><Emoticon Tag="[x]" File="x" /></Emoticons>"#;
        assert!(matches!(
            parse(xml),
            Err(CatalogError::UnexpectedElement { .. })
        ));
    }

    #[test]
    fn nested_group_is_error() {
        let xml = r#"<Emoticons><Catalog Title="a"><Catalog Title="b"></Catalog></Catalog></Emoticons>"#;
        assert!(matches!(
            parse(xml),
            Err(CatalogError::UnexpectedElement { .. })
        ));
    }

    #[test]
    fn unknown_element_inside_group_is_error() {
        let xml = r#"<Emoticons><Catalog Title="a"><Sticker Tag="[x]" /></Catalog></Emoticons>"#;
        assert!(matches!(
            parse(xml),
            Err(CatalogError::UnexpectedElement { element, .. }) if element == "Sticker"
        ));
    }

    #[test]
    fn entry_nested_in_entry_is_error() {
        let xml = r#"<Emoticons><Catalog Title="a"><Emoticon Tag="[x]" File="x"><Emoticon Tag="[y]" File="y"/></Emoticon></Catalog></Emoticons>"#;
        assert!(parse(xml).is_err());
    }

    #[test]
    fn document_cut_off_inside_group_is_truncated() {
        let xml = r#"<Emoticons><Catalog Title="source"><Emoticon Tag="[a]" File="a"/>"#;
        assert!(matches!(
            parse(xml),
            Err(CatalogError::Truncated { element }) if element == "Catalog"
        ));
    }

    #[test]
    fn missing_root_end_tag_is_truncated() {
        let xml = r#"<Emoticons><Catalog Title="source"><Emoticon Tag="[a]" File="a"/></Catalog>"#;
        assert!(matches!(
            parse(xml),
            Err(CatalogError::Truncated { element }) if element == "Emoticons"
        ));
    }

    #[test]
    fn truncated_catalog_fails_load() {
        let assets = MemoryAssets::new();
        let full = catalog_xml(&[("source", &[("[smile]", "s1"), ("[wave]", "s2")])]);
        let cut = full.find("</Catalog>").unwrap();
        assets.insert("emoticons/emoji.xml", &full.as_bytes()[..cut]);
        assert!(matches!(
            load_catalog(&assets, &catalog_config()),
            Err(CatalogError::Truncated { .. })
        ));
    }

    #[test]
    fn undecodable_attribute_reports_position() {
        let xml = r#"<Emoticons><Catalog Title="source"><Emoticon Tag="[a&bogus;]" File="a"/></Catalog></Emoticons>"#;
        match parse(xml) {
            Err(CatalogError::Xml { position, .. }) => assert!(position > 0),
            other => panic!("expected XML error, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_tags_are_xml_error() {
        let xml = r#"<Emoticons><Catalog Title="a"></Emoticons>"#;
        assert!(matches!(parse(xml), Err(CatalogError::Xml { .. })));
    }

    // =========================================================================
    // load_catalog
    // =========================================================================

    #[test]
    fn load_catalog_reads_document_from_assets() {
        let assets = MemoryAssets::new();
        assets.insert(
            "emoticons/emoji.xml",
            catalog_xml(&[("source", &[("[smile]", "s1")])]),
        );
        let table = load_catalog(&assets, &catalog_config()).unwrap();
        assert_eq!(table.get("[smile]").unwrap().path, "emoticons/source/s1");
    }

    #[test]
    fn load_catalog_missing_document_is_unreadable() {
        let assets = MemoryAssets::new();
        assert!(matches!(
            load_catalog(&assets, &catalog_config()),
            Err(CatalogError::Unreadable(AssetError::NotFound(_)))
        ));
    }
}
