use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use indexmap::IndexMap;

use crate::{
    error::{ResolveError, Result},
    header::parse_delimited,
    version::{Version, VersionRange},
};

/// Directive name -> value. Insertion ordered.
pub type Directives = IndexMap<String, String>;

/// Attribute name -> typed value. Insertion ordered; the primary attribute
/// of a clause goes first.
pub type Attributes = IndexMap<String, AttrValue>;

/// A typed attribute value.
#[derive(Debug, Clone)]
pub enum AttrValue {
    Str(String),
    Long(i64),
    Double(f64),
    Version(Version),
    Range(VersionRange),
    /// Homogeneous list of scalars.
    List(Vec<AttrValue>),
}

impl AttrValue {
    /// Parse `raw` as the declared attribute type (`String`, `Long`,
    /// `Double`, `Version` or `List<T>`).
    pub fn parse_typed(name: &str, type_name: &str, raw: &str) -> Result<Self> {
        let type_name = type_name.trim();
        if let Some(rest) = type_name.strip_prefix("List") {
            let element = list_element_type(name, type_name, rest)?;
            let tokens = parse_delimited(raw, ",", false)
                .map_err(|e| ResolveError::attribute(name, e.to_string()))?;
            let values = tokens
                .iter()
                .map(|token| Self::parse_scalar(name, element, token))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Self::List(values));
        }
        Self::parse_scalar(name, type_name, raw)
    }

    fn parse_scalar(name: &str, type_name: &str, raw: &str) -> Result<Self> {
        let bad = |e: &dyn fmt::Display| ResolveError::attribute(name, format!("{raw:?}: {e}"));
        match type_name {
            "String" => Ok(Self::Str(raw.to_string())),
            "Long" => raw.trim().parse().map(Self::Long).map_err(|e| bad(&e)),
            "Double" => raw.trim().parse().map(Self::Double).map_err(|e| bad(&e)),
            "Version" => Version::parse(raw).map(Self::Version).map_err(|e| bad(&e)),
            other => Err(ResolveError::semantic(format!(
                "unknown attribute type '{other}' for '{name}'"
            ))),
        }
    }

    /// The declared type token this value would be written with.
    pub fn type_name(&self) -> String {
        match self {
            Self::Str(_) => "String".into(),
            Self::Long(_) => "Long".into(),
            Self::Double(_) => "Double".into(),
            Self::Version(_) => "Version".into(),
            Self::Range(_) => "VersionRange".into(),
            Self::List(items) => {
                let element = items.first().map(Self::type_name);
                format!("List<{}>", element.as_deref().unwrap_or("String"))
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_version(&self) -> Option<&Version> {
        match self {
            Self::Version(v) => Some(v),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Str(_) => 0,
            Self::Long(_) => 1,
            Self::Double(_) => 2,
            Self::Version(_) => 3,
            Self::Range(_) => 4,
            Self::List(_) => 5,
        }
    }
}

fn list_element_type<'a>(name: &str, full: &str, rest: &'a str) -> Result<&'a str> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok("String");
    }
    match rest.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
        Some(inner) if !inner.trim().is_empty() => Ok(inner.trim()),
        _ => Err(ResolveError::semantic(format!(
            "invalid list type for attribute '{name}': {full}"
        ))),
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<Version> for AttrValue {
    fn from(v: Version) -> Self {
        Self::Version(v)
    }
}

impl From<VersionRange> for AttrValue {
    fn from(v: VersionRange) -> Self {
        Self::Range(v)
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AttrValue {}

impl PartialOrd for AttrValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order: by type first, then by the natural order of the type.
/// Doubles use IEEE total ordering.
impl Ord for AttrValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::Long(a), Self::Long(b)) => a.cmp(b),
            (Self::Double(a), Self::Double(b)) => a.total_cmp(b),
            (Self::Version(a), Self::Version(b)) => a.cmp(b),
            (Self::Range(a), Self::Range(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for AttrValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Str(s) => s.hash(state),
            Self::Long(v) => v.hash(state),
            Self::Double(v) => v.to_bits().hash(state),
            Self::Version(v) => v.hash(state),
            Self::Range(v) => v.hash(state),
            Self::List(items) => items.hash(state),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Long(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v:?}"),
            Self::Version(v) => write!(f, "{v}"),
            Self::Range(v) => write!(f, "{v}"),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}
