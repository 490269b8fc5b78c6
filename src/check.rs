//! Whole-catalog validation.
//!
//! Resolves every tag both ways and collects what failed. Used by the
//! `check` command to catch missing or corrupt assets before shipping a
//! bundle.

use crate::cache::CacheStats;
use crate::resolver::{ResourceKind, Resolver};
use serde::Serialize;

/// One tag that failed to resolve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckFailure {
    pub tag: String,
    pub path: String,
    pub kind: ResourceKind,
    pub error: String,
}

/// Outcome of [`check`].
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub tags: usize,
    pub default_slots: usize,
    pub static_ok: usize,
    pub animated_ok: usize,
    pub failures: Vec<CheckFailure>,
    pub static_cache: CacheStats,
    pub animated_cache: CacheStats,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resolve every catalog tag statically and animated.
///
/// Tags without any asset at all count as failures of both kinds; a tag with
/// only a still image fails the animated pass.
pub fn check(resolver: &Resolver) -> CheckReport {
    let mut static_ok = 0;
    let mut animated_ok = 0;
    let mut failures = Vec::new();

    for entry in resolver.table().entries() {
        let mut fail = |kind: ResourceKind, error: String| {
            failures.push(CheckFailure {
                tag: entry.text.clone(),
                path: entry.path.clone(),
                kind,
                error,
            });
        };
        match resolver.try_resolve_static(&entry.text) {
            Ok(Some(_)) => static_ok += 1,
            Ok(None) => {}
            Err(err) => fail(ResourceKind::Static, err.to_string()),
        }
        match resolver.try_resolve_animated(&entry.text) {
            Ok(Some(_)) => animated_ok += 1,
            Ok(None) => {}
            Err(err) => fail(ResourceKind::Animated, err.to_string()),
        }
    }

    CheckReport {
        tags: resolver.table().len(),
        default_slots: resolver.default_entry_count(),
        static_ok,
        animated_ok,
        failures,
        static_cache: resolver.static_cache().stats(),
        animated_cache: resolver.animated_cache().stats(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use crate::test_helpers::*;
    use std::sync::Arc;

    #[test]
    fn check_reports_missing_and_corrupt_assets() {
        let assets = Arc::new(MemoryAssets::new());
        assets.insert(
            "emoticons/emoji.xml",
            catalog_xml(&[("source", &[("[ok]", "ok"), ("[still]", "still"), ("[bad]", "bad")])]),
        );
        assets.insert("emoticons/source/ok.gif", gif_bytes(2, 4, 4));
        assets.insert("emoticons/source/still.png", png_bytes(4, 4));
        assets.insert("emoticons/source/bad.gif", b"GIF89a garbage".to_vec());
        let resolver = test_builder(assets).build().unwrap();

        let report = check(&resolver);
        assert_eq!(report.tags, 3);
        assert_eq!(report.default_slots, 20);
        assert_eq!(report.static_ok, 2);
        assert_eq!(report.animated_ok, 1);
        assert!(!report.is_clean());

        let failed: Vec<(&str, ResourceKind)> = report
            .failures
            .iter()
            .map(|f| (f.tag.as_str(), f.kind))
            .collect();
        assert_eq!(
            failed,
            vec![
                ("[bad]", ResourceKind::Static),
                ("[bad]", ResourceKind::Animated),
                ("[still]", ResourceKind::Animated),
            ]
        );
    }

    #[test]
    fn check_clean_catalog() {
        let assets = Arc::new(MemoryAssets::new());
        assets.insert(
            "emoticons/emoji.xml",
            catalog_xml(&[("source", &[("[ok]", "ok")])]),
        );
        assets.insert("emoticons/source/ok.gif", gif_bytes(2, 4, 4));
        let report = check(&test_builder(assets).build().unwrap());
        assert!(report.is_clean());
        assert_eq!(report.static_cache.misses, 1);
    }
}
