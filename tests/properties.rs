use std::cmp::Ordering;

use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use fabresolve::{
    AttrValue, Attributes, CandidateComparator, CapabilityDraft, CapabilitySet, Directives,
    Filter, Op, Resource, ResourceDraft, Version, filter, namespace::*,
};

fn arb_attribute() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9.]{0,8}"
}

fn arb_value() -> impl Strategy<Value = String> {
    "\\PC{0,12}"
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Eq), Just(Op::Lte), Just(Op::Gte), Just(Op::Approx)]
}

fn arb_filter() -> impl Strategy<Value = Filter> {
    let leaf = prop_oneof![
        (arb_attribute(), arb_op(), arb_value())
            .prop_map(|(attribute, op, value)| Filter::compare(attribute, op, value)),
        arb_attribute().prop_map(|attribute| Filter::Present { attribute }),
        arb_substring(),
        Just(Filter::MatchAll),
    ];

    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..=3).prop_map(Filter::And),
            prop::collection::vec(inner.clone(), 1..=3).prop_map(Filter::Or),
            inner.prop_map(Filter::not),
        ]
    })
}

/// Equality leaves built from raw text with stars, escapes and parens.
fn arb_substring() -> impl Strategy<Value = Filter> {
    (arb_attribute(), "[ab*\\\\() ]{0,10}").prop_map(|(attribute, raw)| {
        Filter::from_pieces(attribute, filter::parse_substring(&raw))
    })
}

fn arb_version() -> impl Strategy<Value = Version> {
    (0u32..5, 0u32..5, 0u32..5).prop_map(|(major, minor, micro)| Version::new(major, minor, micro))
}

fn exporter(package: &str, version: Version) -> Resource {
    let mut attributes = Attributes::new();
    attributes.insert(PACKAGE_NAMESPACE.into(), AttrValue::from(package));
    attributes.insert(VERSION_ATTRIBUTE.into(), AttrValue::Version(version));
    let mut draft = ResourceDraft::new("exporter", TYPE_BUNDLE, Version::EMPTY);
    draft.add_capability(
        CapabilityDraft::new(PACKAGE_NAMESPACE, Directives::new(), attributes).unwrap(),
    );
    draft.build()
}

proptest! {
    #![proptest_config(ProptestConfig {
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_filter_display_parses_back(f in arb_filter()) {
        let text = f.to_string();
        prop_assert_eq!(filter::parse(&text).unwrap(), f);
    }

    #[test]
    fn prop_substring_display_parses_back(f in arb_substring()) {
        let text = f.to_string();
        prop_assert_eq!(filter::parse(&text).unwrap(), f);
    }

    #[test]
    fn prop_present_iff_attribute_exists(
        name in arb_attribute(),
        others in prop::collection::vec((arb_attribute(), arb_value()), 0..4),
    ) {
        let attributes: Attributes = others
            .into_iter()
            .map(|(k, v)| (k, AttrValue::from(v)))
            .collect();
        let present = Filter::Present { attribute: name.clone() };
        prop_assert_eq!(present.matches(&attributes), attributes.contains_key(&name));
    }

    #[test]
    fn prop_starless_value_is_equality(value in "[^*()\\\\]{0,12}", other in "[^*()\\\\]{0,12}") {
        let f = filter::parse(&format!("(a={value})")).unwrap();
        prop_assert_eq!(&f, &Filter::eq("a", value.clone()));

        let mut attributes = Attributes::new();
        attributes.insert("a".into(), AttrValue::from(other.clone()));
        prop_assert_eq!(f.matches(&attributes), other == value);
        prop_assert_eq!(filter::compare_substring(&other, &[value.clone()]), other == value);
    }

    #[test]
    fn prop_capability_set_add_is_idempotent(
        exports in prop::collection::vec(("[a-c]", arb_version()), 1..6),
    ) {
        let resources: Vec<_> = exports
            .iter()
            .map(|(package, version)| exporter(package, version.clone()))
            .collect();
        let set = CapabilitySet::new([PACKAGE_NAMESPACE]);
        for resource in &resources {
            set.add(resource.capabilities()[1].clone());
        }
        let dump = set.dump();
        let len = set.len();

        for resource in &resources {
            set.add(resource.capabilities()[1].clone());
        }
        prop_assert_eq!(set.len(), len);
        prop_assert_eq!(set.dump(), dump);
    }

    #[test]
    fn prop_capability_set_remove_restores(
        exports in prop::collection::vec(("[a-c]", arb_version()), 0..6),
        extra in "[a-c]",
    ) {
        let resources: Vec<_> = exports
            .iter()
            .map(|(package, version)| exporter(package, version.clone()))
            .collect();
        let set = CapabilitySet::new([PACKAGE_NAMESPACE]);
        for resource in &resources {
            set.add(resource.capabilities()[1].clone());
        }
        let dump = set.dump();

        let added = exporter(&extra, Version::EMPTY);
        let capability = added.capabilities()[1].clone();
        set.add(capability.clone());
        prop_assert!(set.remove(&capability));
        prop_assert!(!set.remove(&capability));
        prop_assert_eq!(set.dump(), dump);
        prop_assert_eq!(set.len(), resources.len());
    }

    #[test]
    fn prop_higher_package_version_first(a in arb_version(), b in arb_version()) {
        prop_assume!(a != b);
        let (high, low) = if a > b { (a, b) } else { (b, a) };
        let high = exporter("com.acme", high);
        let low = exporter("com.acme", low);

        let cmp = CandidateComparator::new();
        let high = &high.capabilities()[1];
        let low = &low.capabilities()[1];
        prop_assert_eq!(cmp.compare(high, low), Ordering::Less);
        prop_assert_eq!(cmp.compare(low, high), Ordering::Greater);
    }

    #[test]
    fn prop_comparator_is_transitive(
        exports in prop::collection::vec(("[a-c]", arb_version()), 3..8),
    ) {
        let resources: Vec<_> = exports
            .iter()
            .map(|(package, version)| exporter(package, version.clone()))
            .collect();
        let capabilities: Vec<_> = resources.iter().map(|r| r.capabilities()[1].clone()).collect();

        let cmp = CandidateComparator::new();
        for a in &capabilities {
            for b in &capabilities {
                for c in &capabilities {
                    if cmp.compare(a, b).is_le() && cmp.compare(b, c).is_le() {
                        prop_assert!(cmp.compare(a, c).is_le());
                    }
                }
            }
        }

        let mut sorted = capabilities.clone();
        sorted.sort_by(|a, b| cmp.compare(a, b));
        for pair in sorted.windows(2) {
            prop_assert!(cmp.compare(&pair[0], &pair[1]).is_le());
        }
    }
}
