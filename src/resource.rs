pub mod builder;
pub mod feature;

use std::{
    collections::BTreeSet,
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, Weak},
};

use crate::{
    attr::{AttrValue, Attributes, Directives},
    error::{ResolveError, Result},
    filter::{self, Filter},
    header::parse_delimited,
    namespace::*,
    version::Version,
};

static MATCH_ALL: Filter = Filter::MatchAll;

/// Namespace plus directives and typed attributes.
///
/// Equality ignores map order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    namespace: String,
    directives: Directives,
    attributes: Attributes,
}

impl Clause {
    pub fn new(
        namespace: impl Into<String>,
        directives: Directives,
        attributes: Attributes,
    ) -> Result<Self> {
        let namespace = namespace.into();
        if namespace.trim().is_empty() {
            return Err(ResolveError::semantic("namespace must not be empty"));
        }
        if let Some(name) = directives.keys().find(|k| attributes.contains_key(*k)) {
            return Err(ResolveError::semantic(format!(
                "'{name}' is both a directive and an attribute of {namespace}"
            )));
        }
        Ok(Self {
            namespace,
            directives,
            attributes,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

impl Hash for Clause {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        let mut directives: Vec<_> = self.directives.iter().collect();
        directives.sort();
        directives.hash(state);
        let mut attributes: Vec<_> = self.attributes.iter().collect();
        attributes.sort_by(|a, b| a.0.cmp(b.0));
        attributes.hash(state);
    }
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty() || value.contains([';', ',', '='])
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    if needs_quotes(value) {
        write!(f, "\"{value}\"")
    } else {
        f.write_str(value)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.namespace)?;
        for (name, value) in &self.attributes {
            match value {
                AttrValue::Str(s) => {
                    write!(f, "; {name}=")?;
                    write_value(f, s)?;
                }
                AttrValue::Range(range) => {
                    write!(f, "; {name}=")?;
                    write_value(f, &range.to_string())?;
                }
                AttrValue::List(_) => write!(f, "; {name}:{}=\"{value}\"", value.type_name())?,
                other => write!(f, "; {name}:{}={other}", other.type_name())?,
            }
        }
        for (name, value) in &self.directives {
            write!(f, "; {name}:=")?;
            write_value(f, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Role {
    Capability { mandatory: BTreeSet<String> },
    Requirement { filter: Filter, optional: bool },
}

#[derive(Debug)]
struct ClauseEntry {
    resource: Weak<ResourceData>,
    clause: Clause,
    role: Role,
}

impl ClauseEntry {
    fn resource(&self) -> Option<Resource> {
        self.resource.upgrade().map(Resource)
    }
}

impl PartialEq for ClauseEntry {
    fn eq(&self, other: &Self) -> bool {
        self.clause == other.clause && self.role == other.role
    }
}

impl Eq for ClauseEntry {}

impl Hash for ClauseEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.clause.hash(state);
        self.role.hash(state);
    }
}

fn write_owned(
    f: &mut fmt::Formatter<'_>,
    resource: Option<Resource>,
    clause: &Clause,
) -> fmt::Result {
    match resource {
        Some(resource) => write!(f, "[{resource}] {clause}"),
        None => write!(f, "{clause}"),
    }
}

/// Something a resource provides. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capability(Arc<ClauseEntry>);

impl Capability {
    pub fn namespace(&self) -> &str {
        self.0.clause.namespace()
    }

    pub fn directives(&self) -> &Directives {
        self.0.clause.directives()
    }

    pub fn attributes(&self) -> &Attributes {
        self.0.clause.attributes()
    }

    pub fn clause(&self) -> &Clause {
        &self.0.clause
    }

    /// The owning resource, if it is still alive.
    pub fn resource(&self) -> Option<Resource> {
        self.0.resource()
    }

    /// Attributes a requirement must name explicitly to match.
    pub fn mandatory(&self) -> &BTreeSet<String> {
        static NONE: BTreeSet<String> = BTreeSet::new();
        match &self.0.role {
            Role::Capability { mandatory } => mandatory,
            Role::Requirement { .. } => &NONE,
        }
    }

    /// Whether `filter` names every mandatory attribute in its top level
    /// conjunction.
    pub fn mandatory_satisfied_by(&self, filter: &Filter) -> bool {
        let mandatory = self.mandatory();
        if mandatory.is_empty() {
            return true;
        }
        let named = filter.conjunct_attributes();
        mandatory.iter().all(|name| named.contains(name.as_str()))
    }

    /// Identity of this handle, shared by its clones.
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_owned(f, self.resource(), &self.0.clause)
    }
}

/// Something a resource needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement(Arc<ClauseEntry>);

impl Requirement {
    pub fn namespace(&self) -> &str {
        self.0.clause.namespace()
    }

    pub fn directives(&self) -> &Directives {
        self.0.clause.directives()
    }

    pub fn attributes(&self) -> &Attributes {
        self.0.clause.attributes()
    }

    pub fn clause(&self) -> &Clause {
        &self.0.clause
    }

    pub fn resource(&self) -> Option<Resource> {
        self.0.resource()
    }

    pub fn filter(&self) -> &Filter {
        match &self.0.role {
            Role::Requirement { filter, .. } => filter,
            Role::Capability { .. } => &MATCH_ALL,
        }
    }

    /// `resolution:=optional`.
    pub fn is_optional(&self) -> bool {
        matches!(self.0.role, Role::Requirement { optional: true, .. })
    }

    /// Same namespace, filter matches, and mandatory attributes named.
    pub fn matches(&self, capability: &Capability) -> bool {
        self.namespace() == capability.namespace()
            && self.filter().matches(capability.attributes())
            && capability.mandatory_satisfied_by(self.filter())
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_owned(f, self.resource(), &self.0.clause)
    }
}

/// A capability waiting for its resource.
#[derive(Debug, Clone)]
pub struct CapabilityDraft {
    clause: Clause,
    mandatory: BTreeSet<String>,
}

impl CapabilityDraft {
    /// Validate a capability clause. Every name in a `mandatory:=` list
    /// must be one of its attributes.
    pub fn new(
        namespace: impl Into<String>,
        directives: Directives,
        attributes: Attributes,
    ) -> Result<Self> {
        let clause = Clause::new(namespace, directives, attributes)?;
        let mut mandatory = BTreeSet::new();
        if let Some(list) = clause.directives.get(MANDATORY_DIRECTIVE) {
            for name in parse_delimited(list, ",", true)? {
                if name.is_empty() {
                    continue;
                }
                if !clause.attributes.contains_key(&name) {
                    return Err(ResolveError::semantic(format!(
                        "mandatory attribute '{name}' does not exist on {}",
                        clause.namespace
                    )));
                }
                mandatory.insert(name);
            }
        }
        Ok(Self { clause, mandatory })
    }

    pub fn namespace(&self) -> &str {
        self.clause.namespace()
    }

    pub fn attributes(&self) -> &Attributes {
        self.clause.attributes()
    }

    pub fn directives(&self) -> &Directives {
        self.clause.directives()
    }
}

/// A requirement waiting for its resource.
#[derive(Debug, Clone)]
pub struct RequirementDraft {
    clause: Clause,
    filter: Filter,
    optional: bool,
}

impl RequirementDraft {
    /// The filter comes from the `filter` directive when present, otherwise
    /// it is synthesized from the attributes.
    pub fn new(
        namespace: impl Into<String>,
        directives: Directives,
        attributes: Attributes,
    ) -> Result<Self> {
        let filter = match directives.get(FILTER_DIRECTIVE) {
            Some(text) => filter::parse(text)?,
            None => Filter::from_attributes(&attributes),
        };
        Self::with_filter(namespace, directives, attributes, filter)
    }

    pub fn with_filter(
        namespace: impl Into<String>,
        directives: Directives,
        attributes: Attributes,
        filter: Filter,
    ) -> Result<Self> {
        let clause = Clause::new(namespace, directives, attributes)?;
        let optional = clause
            .directives
            .get(RESOLUTION_DIRECTIVE)
            .is_some_and(|r| r == RESOLUTION_OPTIONAL);
        Ok(Self {
            clause,
            filter,
            optional,
        })
    }

    pub fn namespace(&self) -> &str {
        self.clause.namespace()
    }

    pub fn attributes(&self) -> &Attributes {
        self.clause.attributes()
    }

    pub fn directives(&self) -> &Directives {
        self.clause.directives()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct ResourceData {
    name: String,
    kind: String,
    version: Version,
    system: bool,
    capabilities: Vec<Capability>,
    requirements: Vec<Requirement>,
}

/// A bundle, fragment or feature: what it provides and what it needs.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource(Arc<ResourceData>);

impl Resource {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Identity type, e.g. `osgi.bundle`.
    pub fn kind(&self) -> &str {
        &self.0.kind
    }

    pub fn version(&self) -> &Version {
        &self.0.version
    }

    /// Whether this is the framework's own resource.
    pub fn is_system(&self) -> bool {
        self.0.system
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.0.capabilities
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.0.requirements
    }

    pub fn capabilities_in<'a>(
        &'a self,
        namespace: &'a str,
    ) -> impl Iterator<Item = &'a Capability> + 'a {
        self.0
            .capabilities
            .iter()
            .filter(move |c| c.namespace() == namespace)
    }

    pub fn requirements_in<'a>(
        &'a self,
        namespace: &'a str,
    ) -> impl Iterator<Item = &'a Requirement> + 'a {
        self.0
            .requirements
            .iter()
            .filter(move |r| r.namespace() == namespace)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0.name, self.0.version)
    }
}

/// Collects capabilities and requirements before the resource exists.
#[derive(Debug, Clone)]
pub struct ResourceDraft {
    name: String,
    kind: String,
    version: Version,
    system: bool,
    capabilities: Vec<CapabilityDraft>,
    requirements: Vec<RequirementDraft>,
}

impl ResourceDraft {
    /// Start a resource carrying its `osgi.identity` capability.
    pub fn new(name: impl Into<String>, kind: impl Into<String>, version: Version) -> Self {
        let name = name.into();
        let kind = kind.into();

        let mut attributes = Attributes::new();
        attributes.insert(IDENTITY_NAMESPACE.into(), AttrValue::Str(name.clone()));
        attributes.insert(
            CAPABILITY_TYPE_ATTRIBUTE.into(),
            AttrValue::Str(kind.clone()),
        );
        attributes.insert(
            CAPABILITY_VERSION_ATTRIBUTE.into(),
            AttrValue::Version(version.clone()),
        );
        let identity = CapabilityDraft {
            clause: Clause {
                namespace: IDENTITY_NAMESPACE.into(),
                directives: Directives::new(),
                attributes,
            },
            mandatory: BTreeSet::new(),
        };

        Self {
            name,
            kind,
            version,
            system: false,
            capabilities: vec![identity],
            requirements: Vec::new(),
        }
    }

    pub fn system(mut self) -> Self {
        self.system = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn add_capability(&mut self, capability: CapabilityDraft) {
        self.capabilities.push(capability);
    }

    pub fn add_capabilities(&mut self, capabilities: impl IntoIterator<Item = CapabilityDraft>) {
        self.capabilities.extend(capabilities);
    }

    pub fn add_requirement(&mut self, requirement: RequirementDraft) {
        self.requirements.push(requirement);
    }

    pub fn add_requirements(&mut self, requirements: impl IntoIterator<Item = RequirementDraft>) {
        self.requirements.extend(requirements);
    }

    pub fn build(self) -> Resource {
        let data = Arc::new_cyclic(|weak: &Weak<ResourceData>| ResourceData {
            capabilities: self
                .capabilities
                .into_iter()
                .map(|draft| {
                    Capability(Arc::new(ClauseEntry {
                        resource: weak.clone(),
                        clause: draft.clause,
                        role: Role::Capability {
                            mandatory: draft.mandatory,
                        },
                    }))
                })
                .collect(),
            requirements: self
                .requirements
                .into_iter()
                .map(|draft| {
                    Requirement(Arc::new(ClauseEntry {
                        resource: weak.clone(),
                        clause: draft.clause,
                        role: Role::Requirement {
                            filter: draft.filter,
                            optional: draft.optional,
                        },
                    }))
                })
                .collect(),
            name: self.name,
            kind: self.kind,
            version: self.version,
            system: self.system,
        });

        log::debug!(
            "built resource {}/{} with {} capabilities and {} requirements",
            data.name,
            data.version,
            data.capabilities.len(),
            data.requirements.len()
        );
        Resource(data)
    }
}
