//! Capability and requirement resolution primitives for OSGi style
//! bundles: manifest header parsing, LDAP filters, indexed capability
//! sets and candidate ordering.

pub mod attr;
pub mod candidate;
pub mod capset;
pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod header;
pub mod namespace;
pub mod repository;
pub mod resource;
pub mod version;

pub use attr::{AttrValue, Attributes, Directives};
pub use candidate::CandidateComparator;
pub use capset::CapabilitySet;
pub use config::ResolverConfig;
pub use context::ResolveContext;
pub use error::{ResolveError, Result};
pub use filter::{Filter, Op};
pub use repository::{BaseRepository, Repository};
pub use resource::{
    Capability,
    CapabilityDraft,
    Clause,
    Requirement,
    RequirementDraft,
    Resource,
    ResourceDraft,
    builder::ResourceBuilder,
    feature::{BundleInfo, Feature, FeatureDependency},
};
pub use version::{Version, VersionRange};
