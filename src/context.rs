use std::sync::Arc;

use crate::{
    candidate::CandidateComparator,
    config::ResolverConfig,
    namespace::*,
    repository::Repository,
    resource::{Capability, Requirement, Resource},
};

/// What a resolver loop asks while resolving one set of resources.
pub struct ResolveContext {
    repository: Arc<dyn Repository>,
    mandatory: Vec<Resource>,
    optional: Vec<Resource>,
    config: ResolverConfig,
    comparator: CandidateComparator,
}

impl ResolveContext {
    pub fn new(
        repository: Arc<dyn Repository>,
        mandatory: Vec<Resource>,
        optional: Vec<Resource>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            repository,
            mandatory,
            optional,
            config,
            comparator: CandidateComparator::new(),
        }
    }

    /// Use `comparator` instead of a freshly built one, so one compiled
    /// comparator can serve many sessions.
    pub fn with_comparator(mut self, comparator: CandidateComparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Resources that must resolve.
    pub fn mandatory_resources(&self) -> &[Resource] {
        &self.mandatory
    }

    /// Resources resolved when possible.
    pub fn optional_resources(&self) -> &[Resource] {
        &self.optional
    }

    pub fn comparator(&self) -> &CandidateComparator {
        &self.comparator
    }

    /// Providers of `requirement`, most preferred first.
    pub fn find_providers(&self, requirement: &Requirement) -> Vec<Capability> {
        let mut found = self
            .repository
            .find_providers(std::slice::from_ref(requirement));
        let mut providers = found.remove(requirement).unwrap_or_default();
        providers.sort_by(|a, b| self.comparator.compare(a, b));
        log::debug!(
            "resolve: {} candidates for {requirement}",
            providers.len()
        );
        providers
    }

    /// Requirements take part in resolution when their `effective`
    /// directive is absent or `resolve`, and optional ones only when the
    /// session resolves optional requirements.
    pub fn is_effective(&self, requirement: &Requirement) -> bool {
        let effective = requirement
            .directives()
            .get(EFFECTIVE_DIRECTIVE)
            .is_none_or(|e| e == EFFECTIVE_RESOLVE);
        let optional = requirement
            .directives()
            .get(RESOLUTION_DIRECTIVE)
            .is_some_and(|r| r == RESOLUTION_OPTIONAL);
        effective && (self.config.resolves_optional() || !optional)
    }

    /// Insert `hosted` before the first capability it sorts ahead of or
    /// equal to. Returns the insertion index.
    pub fn insert_hosted_capability(
        &self,
        capabilities: &mut Vec<Capability>,
        hosted: Capability,
    ) -> usize {
        let index = capabilities
            .iter()
            .position(|existing| self.comparator.compare(&hosted, existing).is_le())
            .unwrap_or(capabilities.len());
        capabilities.insert(index, hosted);
        index
    }
}
