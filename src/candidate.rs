use std::cmp::Ordering;

use regex::Regex;

use crate::{
    attr::AttrValue,
    namespace::*,
    resource::Capability,
    version::Version,
};

/// Orders competing providers of a requirement, most preferred first.
#[derive(Debug, Clone)]
pub struct CandidateComparator {
    /// `redhat-001002` style qualifiers compare as `redhat-001-002`.
    qualifier: Regex,
}

impl Default for CandidateComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateComparator {
    pub fn new() -> Self {
        Self {
            qualifier: Regex::new(r"(redhat-[0-9]{3})([0-9]{3})")
                .expect("qualifier pattern is valid"),
        }
    }

    /// System capabilities first; then, within the bundle, package and
    /// identity namespaces, by name ascending and version descending.
    /// Anything else compares equal.
    pub fn compare(&self, a: &Capability, b: &Capability) -> Ordering {
        let a_system = a.resource().is_some_and(|r| r.is_system());
        let b_system = b.resource().is_some_and(|r| r.is_system());
        match (a_system, b_system) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }

        if a.namespace() != b.namespace() {
            return Ordering::Equal;
        }

        match a.namespace() {
            BUNDLE_NAMESPACE => by_name(a, b, BUNDLE_NAMESPACE).then_with(|| {
                self.descending(a, b, BUNDLE_VERSION_ATTRIBUTE)
            }),
            PACKAGE_NAMESPACE => by_name(a, b, PACKAGE_NAMESPACE)
                .then_with(|| self.descending(a, b, VERSION_ATTRIBUTE))
                .then_with(|| self.descending(a, b, BUNDLE_VERSION_ATTRIBUTE)),
            IDENTITY_NAMESPACE => by_name(a, b, IDENTITY_NAMESPACE)
                .then_with(|| self.descending(a, b, CAPABILITY_VERSION_ATTRIBUTE)),
            _ => Ordering::Equal,
        }
    }

    /// Numeric on major, minor and micro, then on the normalized
    /// qualifier text.
    pub fn compare_versions(&self, a: &Version, b: &Version) -> Ordering {
        a.major()
            .cmp(&b.major())
            .then(a.minor().cmp(&b.minor()))
            .then(a.micro().cmp(&b.micro()))
            .then_with(|| {
                let a = self.qualifier.replace_all(a.qualifier(), "$1-$2");
                let b = self.qualifier.replace_all(b.qualifier(), "$1-$2");
                a.cmp(&b)
            })
    }

    fn descending(&self, a: &Capability, b: &Capability, attribute: &str) -> Ordering {
        self.compare_versions(&version_of(b, attribute), &version_of(a, attribute))
    }
}

fn by_name(a: &Capability, b: &Capability, attribute: &str) -> Ordering {
    a.attributes().get(attribute).cmp(&b.attributes().get(attribute))
}

fn version_of(capability: &Capability, attribute: &str) -> Version {
    match capability.attributes().get(attribute) {
        Some(AttrValue::Version(v)) => v.clone(),
        Some(AttrValue::Str(s)) => Version::parse(s).unwrap_or_default(),
        _ => Version::EMPTY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        attr::{Attributes, Directives},
        resource::{CapabilityDraft, Resource, ResourceDraft},
    };

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn exporter(bundle: &str, bundle_version: &str, package: &str, version: &str) -> Resource {
        let mut attributes = Attributes::new();
        attributes.insert(PACKAGE_NAMESPACE.into(), AttrValue::from(package));
        attributes.insert(VERSION_ATTRIBUTE.into(), AttrValue::Version(v(version)));
        attributes.insert(
            BUNDLE_VERSION_ATTRIBUTE.into(),
            AttrValue::Version(v(bundle_version)),
        );
        let mut draft = ResourceDraft::new(bundle, TYPE_BUNDLE, v(bundle_version));
        draft.add_capability(
            CapabilityDraft::new(PACKAGE_NAMESPACE, Directives::new(), attributes).unwrap(),
        );
        draft.build()
    }

    fn package_cap(resource: &Resource) -> Capability {
        resource.capabilities_in(PACKAGE_NAMESPACE).next().unwrap().clone()
    }

    #[test]
    fn higher_package_version_first() {
        let cmp = CandidateComparator::new();
        let old = exporter("a", "1.0", "com.acme", "1.0.0");
        let new = exporter("b", "1.0", "com.acme", "2.0.0");
        assert_eq!(cmp.compare(&package_cap(&new), &package_cap(&old)), Ordering::Less);
        assert_eq!(cmp.compare(&package_cap(&old), &package_cap(&new)), Ordering::Greater);
    }

    #[test]
    fn package_name_then_bundle_version() {
        let cmp = CandidateComparator::new();
        let a = exporter("x", "1.0", "com.a", "1.0");
        let b = exporter("x", "1.0", "com.b", "9.0");
        assert_eq!(cmp.compare(&package_cap(&a), &package_cap(&b)), Ordering::Less);

        let older_bundle = exporter("x", "1.0", "com.a", "1.0");
        let newer_bundle = exporter("y", "2.0", "com.a", "1.0");
        assert_eq!(
            cmp.compare(&package_cap(&newer_bundle), &package_cap(&older_bundle)),
            Ordering::Less
        );
    }

    #[test]
    fn system_resource_first() {
        let cmp = CandidateComparator::new();
        let system = ResourceDraft::new("framework", TYPE_BUNDLE, v("0.1"))
            .system()
            .build();
        let other = ResourceDraft::new("zzz", TYPE_BUNDLE, v("9.0")).build();
        let sys_cap = &system.capabilities()[0];
        let other_cap = &other.capabilities()[0];
        assert_eq!(cmp.compare(sys_cap, other_cap), Ordering::Less);
        assert_eq!(cmp.compare(other_cap, sys_cap), Ordering::Greater);
    }

    #[test]
    fn identity_by_name_then_version() {
        let cmp = CandidateComparator::new();
        let a1 = ResourceDraft::new("a", TYPE_FEATURE, v("1.0")).build();
        let a2 = ResourceDraft::new("a", TYPE_FEATURE, v("2.0")).build();
        let b = ResourceDraft::new("b", TYPE_FEATURE, v("3.0")).build();
        let mut caps = vec![
            b.capabilities()[0].clone(),
            a1.capabilities()[0].clone(),
            a2.capabilities()[0].clone(),
        ];
        caps.sort_by(|x, y| cmp.compare(x, y));
        let order: Vec<_> = caps
            .iter()
            .map(|c| c.resource().unwrap().to_string())
            .collect();
        assert_eq!(order, vec!["a/2.0.0", "a/1.0.0", "b/3.0.0"]);
    }

    #[test]
    fn different_namespaces_are_equal() {
        let cmp = CandidateComparator::new();
        let r = exporter("x", "1.0", "com.a", "1.0");
        assert_eq!(
            cmp.compare(&r.capabilities()[0], &package_cap(&r)),
            Ordering::Equal
        );
    }

    #[test]
    fn redhat_qualifiers_normalize() {
        let cmp = CandidateComparator::new();
        assert_eq!(
            cmp.compare_versions(&v("1.0.0.redhat-001002"), &v("1.0.0.redhat-001-002")),
            Ordering::Equal
        );
        assert_eq!(
            cmp.compare_versions(&v("1.0.0.redhat-002"), &v("1.0.0.redhat-001003")),
            Ordering::Greater
        );
        assert_eq!(cmp.compare_versions(&v("1.10"), &v("1.9")), Ordering::Greater);
    }
}
