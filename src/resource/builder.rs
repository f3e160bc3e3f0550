use std::collections::{HashMap, HashSet};

use crate::{
    attr::{AttrValue, Attributes, Directives},
    config::ResolverConfig,
    error::{ResolveError, Result},
    filter::{self, Filter},
    header::{ParsedClause, parse_delimited, parse_standard_header},
    namespace::*,
    resource::{CapabilityDraft, RequirementDraft, Resource, ResourceDraft},
    version::{Version, VersionRange},
};

/// Turns a bundle manifest into a [`Resource`].
#[derive(Debug, Clone, Default)]
pub struct ResourceBuilder {
    config: ResolverConfig,
}

impl ResourceBuilder {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Build the resource described by `headers`. Any malformed or invalid
    /// header fails the whole build.
    pub fn build(&self, uri: Option<&str>, headers: &HashMap<String, String>) -> Result<Resource> {
        let header = |name: &str| {
            headers
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        if self.config.requires_manifest_version_2() && header(BUNDLE_MANIFEST_VERSION) != Some("2")
        {
            return Err(ResolveError::semantic(format!(
                "unsupported {BUNDLE_MANIFEST_VERSION}: {}",
                header(BUNDLE_MANIFEST_VERSION).unwrap_or("<none>")
            )));
        }

        let version = match header(BUNDLE_VERSION) {
            Some(text) => Version::parse(text)?,
            None => Version::EMPTY,
        };
        let symbolic_name = header(BUNDLE_SYMBOLIC_NAME)
            .ok_or_else(|| ResolveError::semantic(format!("missing {BUNDLE_SYMBOLIC_NAME}")))?;
        let (name, bundle) = parse_symbolic_name(symbolic_name, &version)?;
        let host = header(FRAGMENT_HOST).map(parse_fragment_host).transpose()?;

        log::debug!("building resource {name}/{version} from manifest");

        let kind = if host.is_some() {
            TYPE_FRAGMENT
        } else {
            TYPE_BUNDLE
        };
        let mut draft = ResourceDraft::new(name.as_str(), kind, version.clone());

        if let Some(uri) = uri {
            let mut attributes = Attributes::new();
            attributes.insert(URI_NAMESPACE.into(), AttrValue::from(uri));
            draft.add_capability(CapabilityDraft::new(
                URI_NAMESPACE,
                Directives::new(),
                attributes,
            )?);
        }

        if host.is_none() {
            let attach_never = bundle
                .directives()
                .get(FRAGMENT_ATTACHMENT_DIRECTIVE)
                .is_some_and(|d| d == FRAGMENT_ATTACHMENT_NEVER);
            let attachable = if attach_never {
                None
            } else {
                Some(host_capability(&bundle)?)
            };
            draft.add_capability(bundle);
            draft.add_capabilities(attachable);
        }

        let text = |name: &str| header(name).unwrap_or_default();

        draft.add_capabilities(parse_exports(text(EXPORT_PACKAGE), &name, &version)?);
        draft.add_capabilities(Self::parse_capability(text(PROVIDE_CAPABILITY))?);
        draft.add_capabilities(parse_export_service(text(EXPORT_SERVICE))?);

        draft.add_requirements(host);
        draft.add_requirements(parse_imports(text(IMPORT_PACKAGE), false)?);
        draft.add_requirements(parse_require_bundle(text(REQUIRE_BUNDLE))?);
        draft.add_requirements(Self::parse_requirement(text(REQUIRE_CAPABILITY))?);
        draft.add_requirements(parse_imports(text(DYNAMIC_IMPORT_PACKAGE), true)?);
        draft.add_requirements(parse_execution_environment(text(
            BUNDLE_REQUIRED_EXECUTION_ENVIRONMENT,
        ))?);
        draft.add_requirements(parse_import_service(text(IMPORT_SERVICE))?);

        Ok(draft.build())
    }

    /// Capabilities in `Provide-Capability` syntax.
    pub fn parse_capability(text: &str) -> Result<Vec<CapabilityDraft>> {
        let mut capabilities = Vec::new();
        for clause in clauses(text)? {
            for namespace in &clause.paths {
                reject_wiring_namespace(namespace, PROVIDE_CAPABILITY)?;
                capabilities.push(CapabilityDraft::new(
                    namespace.as_str(),
                    clause.directives.clone(),
                    typed_attributes(&clause, &[])?,
                )?);
            }
        }
        Ok(capabilities)
    }

    /// Requirements in `Require-Capability` syntax. Without a `filter`
    /// directive a requirement matches any capability of its namespace.
    pub fn parse_requirement(text: &str) -> Result<Vec<RequirementDraft>> {
        let mut requirements = Vec::new();
        for clause in clauses(text)? {
            let filter = match clause.directives.get(FILTER_DIRECTIVE) {
                Some(text) => filter::parse(text)?,
                None => Filter::MatchAll,
            };
            for namespace in &clause.paths {
                reject_wiring_namespace(namespace, REQUIRE_CAPABILITY)?;
                requirements.push(RequirementDraft::with_filter(
                    namespace.as_str(),
                    clause.directives.clone(),
                    typed_attributes(&clause, &[])?,
                    filter.clone(),
                )?);
            }
        }
        Ok(requirements)
    }
}

fn clauses(text: &str) -> Result<Vec<ParsedClause>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    parse_standard_header(text)
}

fn reject_wiring_namespace(namespace: &str, header: &str) -> Result<()> {
    if namespace.starts_with(WIRING_NAMESPACE_PREFIX) {
        return Err(ResolveError::semantic(format!(
            "{header} cannot be used for the '{namespace}' namespace"
        )));
    }
    Ok(())
}

/// Clause attributes converted to their declared types, plain strings
/// when undeclared.
fn typed_attributes(clause: &ParsedClause, skip: &[&str]) -> Result<Attributes> {
    let mut attributes = Attributes::new();
    for (name, raw) in &clause.attributes {
        if skip.contains(&name.as_str()) {
            continue;
        }
        let value = match clause.types.get(name) {
            Some(type_name) => AttrValue::parse_typed(name, type_name, raw)?,
            None => AttrValue::from(raw.as_str()),
        };
        attributes.insert(name.clone(), value);
    }
    Ok(attributes)
}

/// Requirement whose filter is built from its attributes and recorded in
/// the `filter` directive.
fn synthesized_requirement(
    namespace: &str,
    mut directives: Directives,
    attributes: Attributes,
    keep_attributes: bool,
) -> Result<RequirementDraft> {
    let filter = Filter::from_attributes(&attributes);
    directives.insert(FILTER_DIRECTIVE.into(), filter.to_string());
    let attributes = if keep_attributes {
        attributes
    } else {
        Attributes::new()
    };
    RequirementDraft::with_filter(namespace, directives, attributes, filter)
}

fn single_path<'a>(clauses: &'a [ParsedClause], message: &str) -> Result<(&'a ParsedClause, &'a str)> {
    match clauses {
        [clause] if clause.paths.len() == 1 && !clause.paths[0].is_empty() => {
            Ok((clause, clause.paths[0].as_str()))
        }
        _ => Err(ResolveError::semantic(message)),
    }
}

fn parse_symbolic_name(text: &str, version: &Version) -> Result<(String, CapabilityDraft)> {
    let clauses = parse_standard_header(text)?;
    let (clause, name) = single_path(
        &clauses,
        "Bundle-SymbolicName must name exactly one bundle",
    )?;

    let mut attributes = Attributes::new();
    attributes.insert(BUNDLE_NAMESPACE.into(), AttrValue::from(name));
    attributes.insert(
        BUNDLE_VERSION_ATTRIBUTE.into(),
        AttrValue::Version(version.clone()),
    );
    attributes.extend(typed_attributes(
        clause,
        &[BUNDLE_NAMESPACE, BUNDLE_VERSION_ATTRIBUTE],
    )?);

    let capability = CapabilityDraft::new(BUNDLE_NAMESPACE, clause.directives.clone(), attributes)?;
    Ok((name.to_string(), capability))
}

/// The `osgi.wiring.host` twin of a bundle capability.
fn host_capability(bundle: &CapabilityDraft) -> Result<CapabilityDraft> {
    let attributes = bundle
        .attributes()
        .iter()
        .map(|(name, value)| {
            let name = if name == BUNDLE_NAMESPACE {
                HOST_NAMESPACE.to_string()
            } else {
                name.clone()
            };
            (name, value.clone())
        })
        .collect();
    CapabilityDraft::new(HOST_NAMESPACE, bundle.directives().clone(), attributes)
}

fn parse_fragment_host(text: &str) -> Result<RequirementDraft> {
    let clauses = parse_standard_header(text)?;
    let (clause, host) = single_path(&clauses, "Fragments cannot have multiple hosts")?;

    let range = match clause.attributes.get(BUNDLE_VERSION_ATTRIBUTE) {
        Some(text) => VersionRange::parse(text)?,
        None => VersionRange::at_least(Version::EMPTY),
    };
    let mut attributes = Attributes::new();
    attributes.insert(HOST_NAMESPACE.into(), AttrValue::from(host));
    attributes.insert(BUNDLE_VERSION_ATTRIBUTE.into(), AttrValue::Range(range));
    attributes.extend(typed_attributes(
        clause,
        &[HOST_NAMESPACE, BUNDLE_VERSION_ATTRIBUTE],
    )?);

    synthesized_requirement(HOST_NAMESPACE, clause.directives.clone(), attributes, true)
}

/// The effective package version, checking that `version` and
/// `specification-version` agree when both are given.
fn package_version<'a>(clause: &'a ParsedClause, package: &str) -> Result<Option<&'a str>> {
    let version = clause.attributes.get(VERSION_ATTRIBUTE).map(|v| v.trim());
    let specification = clause
        .attributes
        .get(SPECIFICATION_VERSION_ATTRIBUTE)
        .map(|v| v.trim());
    match (version, specification) {
        (Some(v), Some(s)) if v != s => Err(ResolveError::semantic(format!(
            "version and specification-version do not match for '{package}'"
        ))),
        (Some(v), _) | (None, Some(v)) => Ok(Some(v)),
        (None, None) => Ok(None),
    }
}

fn check_package_name(package: &str, action: &str) -> Result<()> {
    if package.is_empty() || package == "." {
        return Err(ResolveError::semantic(format!(
            "{action} package names cannot be empty"
        )));
    }
    if package.starts_with("java.") {
        return Err(ResolveError::semantic(format!(
            "{action} java.* packages is not allowed: {package}"
        )));
    }
    Ok(())
}

fn parse_imports(text: &str, dynamic: bool) -> Result<Vec<RequirementDraft>> {
    let mut seen = HashSet::new();
    let mut requirements = Vec::new();
    for clause in clauses(text)? {
        for package in &clause.paths {
            check_package_name(package, "importing")?;
            if dynamic
                && package.ends_with('*')
                && package != "*"
                && !package.ends_with(".*")
            {
                return Err(ResolveError::semantic(format!(
                    "partial wildcards are not allowed in dynamic imports: {package}"
                )));
            }
            if !dynamic && !seen.insert(package.clone()) {
                return Err(ResolveError::semantic(format!(
                    "duplicate import: {package}"
                )));
            }

            let mut attributes = Attributes::new();
            attributes.insert(PACKAGE_NAMESPACE.into(), AttrValue::from(package.as_str()));
            if let Some(version) = package_version(&clause, package)? {
                attributes.insert(
                    VERSION_ATTRIBUTE.into(),
                    AttrValue::Range(VersionRange::parse(version)?),
                );
            }
            for (name, value) in typed_attributes(
                &clause,
                &[
                    PACKAGE_NAMESPACE,
                    VERSION_ATTRIBUTE,
                    SPECIFICATION_VERSION_ATTRIBUTE,
                ],
            )? {
                let value = match (name.as_str(), &value) {
                    (BUNDLE_VERSION_ATTRIBUTE, AttrValue::Str(s)) => {
                        AttrValue::Range(VersionRange::parse(s)?)
                    }
                    _ => value,
                };
                attributes.insert(name, value);
            }

            let mut directives = clause.directives.clone();
            if dynamic {
                directives.insert(RESOLUTION_DIRECTIVE.into(), RESOLUTION_DYNAMIC.into());
            }
            requirements.push(synthesized_requirement(
                PACKAGE_NAMESPACE,
                directives,
                attributes,
                false,
            )?);
        }
    }
    Ok(requirements)
}

fn parse_exports(text: &str, bundle: &str, bundle_version: &Version) -> Result<Vec<CapabilityDraft>> {
    let mut capabilities = Vec::new();
    for clause in clauses(text)? {
        if clause.attributes.contains_key(BUNDLE_SYMBOLIC_NAME_ATTRIBUTE)
            || clause.attributes.contains_key(BUNDLE_VERSION_ATTRIBUTE)
        {
            return Err(ResolveError::semantic(
                "exports must not specify bundle symbolic name or bundle version",
            ));
        }
        for package in &clause.paths {
            check_package_name(package, "exporting")?;
            let version = match package_version(&clause, package)? {
                Some(text) => Version::parse(text)?,
                None => Version::EMPTY,
            };

            let mut attributes = Attributes::new();
            attributes.insert(PACKAGE_NAMESPACE.into(), AttrValue::from(package.as_str()));
            attributes.insert(VERSION_ATTRIBUTE.into(), AttrValue::Version(version));
            attributes.extend(typed_attributes(
                &clause,
                &[
                    PACKAGE_NAMESPACE,
                    VERSION_ATTRIBUTE,
                    SPECIFICATION_VERSION_ATTRIBUTE,
                ],
            )?);
            attributes.insert(
                BUNDLE_SYMBOLIC_NAME_ATTRIBUTE.into(),
                AttrValue::from(bundle),
            );
            attributes.insert(
                BUNDLE_VERSION_ATTRIBUTE.into(),
                AttrValue::Version(bundle_version.clone()),
            );

            capabilities.push(CapabilityDraft::new(
                PACKAGE_NAMESPACE,
                clause.directives.clone(),
                attributes,
            )?);
        }
    }
    Ok(capabilities)
}

fn parse_require_bundle(text: &str) -> Result<Vec<RequirementDraft>> {
    let mut requirements = Vec::new();
    for clause in clauses(text)? {
        let range = match clause.attributes.get(BUNDLE_VERSION_ATTRIBUTE) {
            Some(text) => VersionRange::parse(text)?,
            None => VersionRange::ANY,
        };
        for bundle in &clause.paths {
            let mut attributes = Attributes::new();
            attributes.insert(BUNDLE_NAMESPACE.into(), AttrValue::from(bundle.as_str()));
            attributes.insert(
                BUNDLE_VERSION_ATTRIBUTE.into(),
                AttrValue::Range(range.clone()),
            );
            attributes.extend(typed_attributes(
                &clause,
                &[BUNDLE_NAMESPACE, BUNDLE_VERSION_ATTRIBUTE],
            )?);
            requirements.push(synthesized_requirement(
                BUNDLE_NAMESPACE,
                clause.directives.clone(),
                attributes,
                true,
            )?);
        }
    }
    Ok(requirements)
}

/// Split `name[-version]` at the last dash.
fn split_ee(part: &str) -> (&str, Option<&str>) {
    match part.rsplit_once('-') {
        Some((name, version)) => (name, Some(version)),
        None => (part, None),
    }
}

/// One `osgi.ee` requirement OR-ing every listed environment.
fn parse_execution_environment(text: &str) -> Result<Vec<RequirementDraft>> {
    let mut alternatives = Vec::new();
    for entry in parse_delimited(text, ",", true)? {
        if entry.is_empty() {
            continue;
        }
        let (name, version) = match entry.split_once('/') {
            Some((left, right)) => {
                let (left_name, left_version) = split_ee(left.trim());
                let (right_name, right_version) = split_ee(right.trim());
                if let (Some(l), Some(r)) = (left_version, right_version) {
                    if l != r {
                        log::warn!("skipping execution environment {entry}: versions differ");
                        continue;
                    }
                }
                (
                    format!("{left_name}/{right_name}"),
                    left_version.or(right_version),
                )
            }
            None => {
                let (name, version) = split_ee(&entry);
                (name.to_string(), version)
            }
        };
        let name = if name == "J2SE" {
            "JavaSE".to_string()
        } else {
            name
        };

        let ee = Filter::eq(EXECUTION_ENVIRONMENT_NAMESPACE, name);
        alternatives.push(match version {
            Some(version) => Filter::And(vec![
                ee,
                Filter::eq(
                    CAPABILITY_VERSION_ATTRIBUTE,
                    Version::parse(version)?.to_string(),
                ),
            ]),
            None => ee,
        });
    }

    let filter = match alternatives.len() {
        0 => return Ok(Vec::new()),
        1 => alternatives.remove(0),
        _ => Filter::Or(alternatives),
    };
    let mut directives = Directives::new();
    directives.insert(FILTER_DIRECTIVE.into(), filter.to_string());
    Ok(vec![RequirementDraft::with_filter(
        EXECUTION_ENVIRONMENT_NAMESPACE,
        directives,
        Attributes::new(),
        filter,
    )?])
}

fn parse_export_service(text: &str) -> Result<Vec<CapabilityDraft>> {
    let mut capabilities = Vec::new();
    for clause in clauses(text)? {
        for service in &clause.paths {
            let mut attributes = Attributes::new();
            attributes.insert(OBJECT_CLASS_ATTRIBUTE.into(), AttrValue::from(service.as_str()));
            attributes.extend(typed_attributes(&clause, &[OBJECT_CLASS_ATTRIBUTE])?);
            let mut directives = clause.directives.clone();
            directives.insert(EFFECTIVE_DIRECTIVE.into(), EFFECTIVE_ACTIVE.into());
            capabilities.push(CapabilityDraft::new(
                SERVICE_NAMESPACE,
                directives,
                attributes,
            )?);
        }
    }
    Ok(capabilities)
}

fn parse_import_service(text: &str) -> Result<Vec<RequirementDraft>> {
    let mut requirements = Vec::new();
    for clause in clauses(text)? {
        let optional = clause
            .directives
            .get("availability")
            .is_some_and(|a| a == RESOLUTION_OPTIONAL);
        let multiple = clause
            .directives
            .get("multiple")
            .is_some_and(|m| m == "true");

        for service in &clause.paths {
            let mut attributes = Attributes::new();
            attributes.insert(OBJECT_CLASS_ATTRIBUTE.into(), AttrValue::from(service.as_str()));
            attributes.extend(typed_attributes(&clause, &[OBJECT_CLASS_ATTRIBUTE])?);

            let mut directives = Directives::new();
            directives.insert(EFFECTIVE_DIRECTIVE.into(), EFFECTIVE_ACTIVE.into());
            if optional {
                directives.insert(RESOLUTION_DIRECTIVE.into(), RESOLUTION_OPTIONAL.into());
            }
            if multiple {
                directives.insert(CARDINALITY_DIRECTIVE.into(), CARDINALITY_MULTIPLE.into());
            }
            requirements.push(synthesized_requirement(
                SERVICE_NAMESPACE,
                directives,
                attributes,
                false,
            )?);
        }
    }
    Ok(requirements)
}
