//! Property-based invariant tests for path keys.
//!
//! 1. Canonical form round-trips through `parse`.
//! 2. Outer separators never change identity.
//! 3. Every ancestor is a strict prefix and `is_ancestor_of` agrees.
//! 4. `parent` is the longest ancestor.
//! 5. Parsing never panics on arbitrary input.

use proptest::prelude::*;
use tweakui_core::path::PathKey;

// ── Helpers ─────────────────────────────────────────────────────────────

fn segment_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.-]{1,8}".prop_filter("segment must not be blank", |s| !s.trim().is_empty())
}

fn segments_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(segment_strategy(), 1..6)
}

proptest! {
    #[test]
    fn canonical_round_trip(segments in segments_strategy()) {
        let key = PathKey::parse(&segments.join("/")).unwrap();
        let reparsed = PathKey::parse(&key.to_string()).unwrap();
        prop_assert_eq!(&key, &reparsed);
        prop_assert_eq!(key.segments(), segments.as_slice());
    }

    #[test]
    fn outer_separators_are_ignored(
        segments in segments_strategy(),
        lead in 0usize..3,
        trail in 0usize..3,
    ) {
        let plain = PathKey::parse(&segments.join("/")).unwrap();
        let padded = format!("{}{}{}", "/".repeat(lead), segments.join("/"), "/".repeat(trail));
        prop_assert_eq!(plain, PathKey::parse(&padded).unwrap());
    }

    #[test]
    fn ancestors_are_strict_prefixes(segments in segments_strategy()) {
        let key = PathKey::parse(&segments.join("/")).unwrap();
        let ancestors: Vec<PathKey> = key.ancestors().collect();
        prop_assert_eq!(ancestors.len(), key.depth() - 1);
        for ancestor in &ancestors {
            prop_assert!(ancestor.is_ancestor_of(&key));
            prop_assert!(!key.is_ancestor_of(ancestor));
        }
        prop_assert_eq!(key.parent(), ancestors.last().cloned());
    }

    #[test]
    fn parse_never_panics(text in ".{0,40}") {
        let _ = PathKey::parse(&text);
    }
}
