//! Namespace, attribute, directive and header names.

pub const IDENTITY_NAMESPACE: &str = "osgi.identity";
pub const CAPABILITY_TYPE_ATTRIBUTE: &str = "type";
pub const CAPABILITY_VERSION_ATTRIBUTE: &str = "version";

pub const TYPE_BUNDLE: &str = "osgi.bundle";
pub const TYPE_FRAGMENT: &str = "osgi.fragment";
pub const TYPE_FEATURE: &str = "karaf.feature";

pub const BUNDLE_NAMESPACE: &str = "osgi.wiring.bundle";
pub const HOST_NAMESPACE: &str = "osgi.wiring.host";
pub const PACKAGE_NAMESPACE: &str = "osgi.wiring.package";
pub const WIRING_NAMESPACE_PREFIX: &str = "osgi.wiring.";
pub const EXECUTION_ENVIRONMENT_NAMESPACE: &str = "osgi.ee";
pub const SERVICE_NAMESPACE: &str = "osgi.service";
pub const URI_NAMESPACE: &str = "fabric.uri";

pub const BUNDLE_VERSION_ATTRIBUTE: &str = "bundle-version";
pub const BUNDLE_SYMBOLIC_NAME_ATTRIBUTE: &str = "bundle-symbolic-name";
pub const VERSION_ATTRIBUTE: &str = "version";
pub const SPECIFICATION_VERSION_ATTRIBUTE: &str = "specification-version";
pub const OBJECT_CLASS_ATTRIBUTE: &str = "objectClass";

pub const FILTER_DIRECTIVE: &str = "filter";
pub const RESOLUTION_DIRECTIVE: &str = "resolution";
pub const RESOLUTION_OPTIONAL: &str = "optional";
pub const RESOLUTION_DYNAMIC: &str = "dynamic";
pub const MANDATORY_DIRECTIVE: &str = "mandatory";
pub const EFFECTIVE_DIRECTIVE: &str = "effective";
pub const EFFECTIVE_RESOLVE: &str = "resolve";
pub const EFFECTIVE_ACTIVE: &str = "active";
pub const CARDINALITY_DIRECTIVE: &str = "cardinality";
pub const CARDINALITY_MULTIPLE: &str = "multiple";
pub const FRAGMENT_ATTACHMENT_DIRECTIVE: &str = "fragment-attachment";
pub const FRAGMENT_ATTACHMENT_NEVER: &str = "never";

pub const BUNDLE_MANIFEST_VERSION: &str = "Bundle-ManifestVersion";
pub const BUNDLE_SYMBOLIC_NAME: &str = "Bundle-SymbolicName";
pub const BUNDLE_VERSION: &str = "Bundle-Version";
pub const FRAGMENT_HOST: &str = "Fragment-Host";
pub const EXPORT_PACKAGE: &str = "Export-Package";
pub const IMPORT_PACKAGE: &str = "Import-Package";
pub const DYNAMIC_IMPORT_PACKAGE: &str = "DynamicImport-Package";
pub const REQUIRE_BUNDLE: &str = "Require-Bundle";
pub const REQUIRE_CAPABILITY: &str = "Require-Capability";
pub const PROVIDE_CAPABILITY: &str = "Provide-Capability";
pub const BUNDLE_REQUIRED_EXECUTION_ENVIRONMENT: &str = "Bundle-RequiredExecutionEnvironment";
pub const EXPORT_SERVICE: &str = "Export-Service";
pub const IMPORT_SERVICE: &str = "Import-Service";
