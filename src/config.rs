/// Settings shared by the resource builder, the repository and the resolve
/// context. Passed in explicitly; nothing here lives in a global.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    resolve_optional: bool,
    require_manifest_version_2: bool,
    /// Attribute names each per-namespace capability set indexes. `None`
    /// indexes the namespace attribute itself.
    index_attributes: Option<Vec<String>>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            resolve_optional: false,
            require_manifest_version_2: true,
            index_attributes: None,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from environment switches.
    ///
    /// `FAB_RESOLVE_OPTIONAL` turns on resolution of optional requirements,
    /// `FAB_LENIENT_MANIFEST` accepts manifests without
    /// `Bundle-ManifestVersion: 2`.
    pub fn from_env() -> Self {
        Self::default()
            .resolve_optional(std::env::var("FAB_RESOLVE_OPTIONAL").is_ok())
            .require_manifest_version_2(std::env::var("FAB_LENIENT_MANIFEST").is_err())
    }

    pub fn resolve_optional(mut self, enabled: bool) -> Self {
        self.resolve_optional = enabled;
        self
    }

    pub fn require_manifest_version_2(mut self, enabled: bool) -> Self {
        self.require_manifest_version_2 = enabled;
        self
    }

    pub fn index_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index_attributes = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn resolves_optional(&self) -> bool {
        self.resolve_optional
    }

    pub fn requires_manifest_version_2(&self) -> bool {
        self.require_manifest_version_2
    }

    /// Attribute names to index for capabilities of `namespace`.
    pub fn index_attributes_for(&self, namespace: &str) -> Vec<String> {
        match &self.index_attributes {
            Some(names) => names.clone(),
            None => vec![namespace.to_string()],
        }
    }
}
