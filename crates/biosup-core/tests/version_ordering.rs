//! Property tests for version ordering
//!
//! - Dotted versions with equal segment counts order like their integer tuples
//! - Compact labels normalize to the same value as their dotted spelling

use biosup_core::{compare, ParsedVersion, VersionCode};
use proptest::prelude::*;

fn dotted(components: &[u32]) -> String {
    components
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Ordering matches componentwise integer ordering.
    #[test]
    fn prop_dotted_order_is_numeric(
        (a, b) in (2usize..5).prop_flat_map(|n| (
            prop::collection::vec(0u32..100_000, n),
            prop::collection::vec(0u32..100_000, n),
        ))
    ) {
        let va = VersionCode::parse(&dotted(&a)).unwrap();
        let vb = VersionCode::parse(&dotted(&b)).unwrap();
        prop_assert_eq!(compare(&va, &vb), a.cmp(&b));
    }

    /// compare is antisymmetric.
    #[test]
    fn prop_compare_antisymmetric(
        a in prop::collection::vec(0u32..1000, 1..5),
        b in prop::collection::vec(0u32..1000, 1..5),
    ) {
        let va = VersionCode::new(a);
        let vb = VersionCode::new(b);
        prop_assert_eq!(compare(&va, &vb), compare(&vb, &va).reverse());
    }

    /// "A" + two digits normalizes to "d.d".
    #[test]
    fn prop_compact_matches_dotted(major in 0u32..10, minor in 0u32..10) {
        let compact = ParsedVersion::parse(&format!("A{}{}", major, minor));
        let expected = VersionCode::parse(&format!("{}.{}", major, minor)).unwrap();
        prop_assert_eq!(compact.code(), Some(&expected));
    }

    /// Parsing never panics.
    #[test]
    fn prop_parse_total(raw in ".{0,12}") {
        let parsed = ParsedVersion::parse(&raw);
        prop_assert_eq!(parsed.raw(), raw.as_str());
    }
}
