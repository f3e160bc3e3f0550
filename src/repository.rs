use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::{
    capset::CapabilitySet,
    config::ResolverConfig,
    resource::{Capability, Requirement, Resource},
};

/// A source of capabilities.
pub trait Repository: Send + Sync {
    /// Matching capabilities per requirement, mandatory attributes obeyed.
    fn find_providers(&self, requirements: &[Requirement]) -> HashMap<Requirement, Vec<Capability>>;
}

/// In-memory repository with one capability set per namespace.
#[derive(Debug, Default)]
pub struct BaseRepository {
    config: ResolverConfig,
    resources: RwLock<Vec<Resource>>,
    sets: RwLock<HashMap<String, Arc<CapabilitySet>>>,
}

impl BaseRepository {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            resources: RwLock::new(Vec::new()),
            sets: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_resources(
        config: ResolverConfig,
        resources: impl IntoIterator<Item = Resource>,
    ) -> Self {
        let repository = Self::new(config);
        for resource in resources {
            repository.add_resource(resource);
        }
        repository
    }

    /// Add a resource and index its capabilities. Returns `false`, leaving
    /// the repository unchanged, when an equal resource is already held.
    pub fn add_resource(&self, resource: Resource) -> bool {
        let mut resources = self.resources.write();
        if resources.contains(&resource) {
            log::debug!("repository: already holds {resource}");
            return false;
        }
        log::debug!("repository: adding {resource}");

        let mut sets = self.sets.write();
        for capability in resource.capabilities() {
            let namespace = capability.namespace();
            let set = sets.entry(namespace.to_string()).or_insert_with(|| {
                Arc::new(CapabilitySet::new(
                    self.config.index_attributes_for(namespace),
                ))
            });
            set.add(capability.clone());
        }
        resources.push(resource);
        true
    }

    /// Remove a resource and its capabilities. Returns whether it was
    /// present.
    pub fn remove_resource(&self, resource: &Resource) -> bool {
        let mut resources = self.resources.write();
        let removed = match resources.iter().position(|r| r == resource) {
            Some(position) => resources.remove(position),
            None => return false,
        };
        log::debug!("repository: removing {removed}");

        let sets = self.sets.read();
        for capability in removed.capabilities() {
            if let Some(set) = sets.get(capability.namespace()) {
                set.remove(capability);
            }
        }
        true
    }

    pub fn resources(&self) -> Vec<Resource> {
        self.resources.read().clone()
    }

    /// The capability set of `namespace`, if any capability was ever added
    /// to it.
    pub fn capability_set(&self, namespace: &str) -> Option<Arc<CapabilitySet>> {
        self.sets.read().get(namespace).cloned()
    }
}

impl Repository for BaseRepository {
    fn find_providers(&self, requirements: &[Requirement]) -> HashMap<Requirement, Vec<Capability>> {
        let sets = self.sets.read();
        requirements
            .iter()
            .map(|requirement| {
                let providers = sets
                    .get(requirement.namespace())
                    .map(|set| set.match_filter(requirement.filter(), true))
                    .unwrap_or_default();
                log::debug!(
                    "repository: {} providers for {requirement}",
                    providers.len()
                );
                (requirement.clone(), providers)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        attr::{AttrValue, Attributes, Directives},
        namespace::*,
        resource::{CapabilityDraft, RequirementDraft, ResourceDraft},
        version::{Version, VersionRange},
    };

    fn exporter(name: &str, package: &str, version: Version) -> Resource {
        let mut attributes = Attributes::new();
        attributes.insert(PACKAGE_NAMESPACE.into(), AttrValue::from(package));
        attributes.insert(VERSION_ATTRIBUTE.into(), AttrValue::Version(version));
        let mut draft = ResourceDraft::new(name, TYPE_BUNDLE, Version::new(1, 0, 0));
        draft.add_capability(
            CapabilityDraft::new(PACKAGE_NAMESPACE, Directives::new(), attributes).unwrap(),
        );
        draft.build()
    }

    fn importer(package: &str, range: &str) -> Resource {
        let mut attributes = Attributes::new();
        attributes.insert(PACKAGE_NAMESPACE.into(), AttrValue::from(package));
        attributes.insert(
            VERSION_ATTRIBUTE.into(),
            AttrValue::Range(VersionRange::parse(range).unwrap()),
        );
        let mut draft = ResourceDraft::new("importer", TYPE_BUNDLE, Version::EMPTY);
        draft.add_requirement(
            RequirementDraft::new(PACKAGE_NAMESPACE, Directives::new(), attributes).unwrap(),
        );
        draft.build()
    }

    #[test]
    fn finds_matching_providers() {
        let repository = BaseRepository::with_resources(
            ResolverConfig::default(),
            [
                exporter("a", "com.acme", Version::new(1, 0, 0)),
                exporter("b", "com.acme", Version::new(2, 0, 0)),
                exporter("c", "com.other", Version::new(1, 0, 0)),
            ],
        );
        let user = importer("com.acme", "[1.0,2.0)");
        let requirement = user.requirements()[0].clone();

        let found = repository.find_providers(std::slice::from_ref(&requirement));
        let providers = &found[&requirement];
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].resource().unwrap().name(), "a");
    }

    #[test]
    fn unknown_namespace_is_empty() {
        let repository = BaseRepository::new(ResolverConfig::default());
        let mut draft = ResourceDraft::new("user", TYPE_BUNDLE, Version::EMPTY);
        draft.add_requirement(
            RequirementDraft::new("acme.nothing", Directives::new(), Attributes::new()).unwrap(),
        );
        let user = draft.build();
        let found = repository.find_providers(user.requirements());
        assert!(found[&user.requirements()[0]].is_empty());
    }

    #[test]
    fn remove_resource_drops_capabilities() {
        let a = exporter("a", "com.acme", Version::new(1, 0, 0));
        let repository = BaseRepository::with_resources(ResolverConfig::default(), [a.clone()]);
        assert_eq!(repository.resources().len(), 1);
        assert_eq!(
            repository.capability_set(PACKAGE_NAMESPACE).map(|s| s.len()),
            Some(1)
        );

        assert!(repository.remove_resource(&a));
        assert!(!repository.remove_resource(&a));
        assert!(repository.resources().is_empty());
        assert_eq!(
            repository.capability_set(PACKAGE_NAMESPACE).map(|s| s.len()),
            Some(0)
        );
    }

    #[test]
    fn adding_twice_then_removing_leaves_nothing_behind() {
        let a = exporter("a", "com.acme", Version::new(1, 0, 0));
        let repository = BaseRepository::new(ResolverConfig::default());
        assert!(repository.add_resource(a.clone()));
        assert!(!repository.add_resource(a.clone()));
        assert_eq!(repository.resources().len(), 1);

        let user = importer("com.acme", "[1.0,2.0)");
        let found = repository.find_providers(user.requirements());
        assert_eq!(found[&user.requirements()[0]].len(), 1);

        assert!(repository.remove_resource(&a));
        assert!(repository.resources().is_empty());
        let found = repository.find_providers(user.requirements());
        assert!(found[&user.requirements()[0]].is_empty());
    }

    #[test]
    fn re_adding_after_removal_restores_providers() {
        let a = exporter("a", "com.acme", Version::new(1, 0, 0));
        let repository = BaseRepository::with_resources(ResolverConfig::default(), [a.clone()]);
        assert!(repository.remove_resource(&a));
        assert!(repository.add_resource(a));

        let user = importer("com.acme", "[1.0,2.0)");
        let found = repository.find_providers(user.requirements());
        assert_eq!(found[&user.requirements()[0]].len(), 1);
        assert_eq!(repository.resources().len(), 1);
    }
}
