use std::collections::HashMap;

use crate::{
    attr::{AttrValue, Attributes, Directives},
    error::{ResolveError, Result},
    namespace::*,
    resource::{RequirementDraft, Resource, ResourceDraft, builder::ResourceBuilder},
    version::{Version, VersionRange},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleInfo {
    pub location: String,
    /// Dependency bundles are installed on demand, not required.
    pub dependency: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDependency {
    pub name: String,
    /// `0.0.0` or blank for any version, `[a,b)` style for a range,
    /// otherwise an exact version.
    pub version: String,
}

/// A named group of bundles and other features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    pub version: Version,
    pub bundles: Vec<BundleInfo>,
    pub dependencies: Vec<FeatureDependency>,
    /// Extra capabilities in `Provide-Capability` syntax.
    pub capabilities: Vec<String>,
    /// Extra requirements in `Require-Capability` syntax.
    pub requirements: Vec<String>,
}

impl Feature {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            bundles: Vec::new(),
            dependencies: Vec::new(),
            capabilities: Vec::new(),
            requirements: Vec::new(),
        }
    }

    pub fn bundle(mut self, location: impl Into<String>) -> Self {
        self.bundles.push(BundleInfo {
            location: location.into(),
            dependency: false,
        });
        self
    }

    pub fn dependency_bundle(mut self, location: impl Into<String>) -> Self {
        self.bundles.push(BundleInfo {
            location: location.into(),
            dependency: true,
        });
        self
    }

    pub fn depends_on(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.dependencies.push(FeatureDependency {
            name: name.into(),
            version: version.into(),
        });
        self
    }

    pub fn capability(mut self, text: impl Into<String>) -> Self {
        self.capabilities.push(text.into());
        self
    }

    pub fn requirement(mut self, text: impl Into<String>) -> Self {
        self.requirements.push(text.into());
        self
    }

    /// Build the `karaf.feature` resource. `bundles` maps bundle locations
    /// to already built resources; every non-dependency bundle must be
    /// there.
    pub fn to_resource(&self, bundles: &HashMap<String, Resource>) -> Result<Resource> {
        let mut draft = ResourceDraft::new(self.name.as_str(), TYPE_FEATURE, self.version.clone());

        for info in self.bundles.iter().filter(|b| !b.dependency) {
            let bundle = bundles.get(&info.location).ok_or_else(|| {
                ResolveError::semantic(format!(
                    "unknown bundle {} in feature {}/{}",
                    info.location, self.name, self.version
                ))
            })?;
            draft.add_requirement(identity_requirement(
                bundle.name(),
                bundle.kind(),
                Some(VersionRange::exact(bundle.version().clone())),
            )?);
        }

        for dependency in &self.dependencies {
            draft.add_requirement(identity_requirement(
                &dependency.name,
                TYPE_FEATURE,
                dependency_range(&dependency.version)?,
            )?);
        }

        for text in &self.capabilities {
            draft.add_capabilities(ResourceBuilder::parse_capability(text)?);
        }
        for text in &self.requirements {
            draft.add_requirements(ResourceBuilder::parse_requirement(text)?);
        }

        Ok(draft.build())
    }
}

fn dependency_range(text: &str) -> Result<Option<VersionRange>> {
    let text = text.trim();
    if text.is_empty() || text == "0.0.0" {
        return Ok(None);
    }
    if text.starts_with(['[', '(']) {
        return VersionRange::parse(text).map(Some);
    }
    Ok(Some(VersionRange::exact(Version::parse(text)?)))
}

fn identity_requirement(
    name: &str,
    kind: &str,
    range: Option<VersionRange>,
) -> Result<RequirementDraft> {
    let mut attributes = Attributes::new();
    attributes.insert(IDENTITY_NAMESPACE.into(), AttrValue::from(name));
    attributes.insert(CAPABILITY_TYPE_ATTRIBUTE.into(), AttrValue::from(kind));
    if let Some(range) = range {
        attributes.insert(CAPABILITY_VERSION_ATTRIBUTE.into(), AttrValue::Range(range));
    }
    RequirementDraft::new(IDENTITY_NAMESPACE, Directives::new(), attributes)
}
