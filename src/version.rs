pub mod range;

use std::{fmt, str::FromStr};

pub use range::VersionRange;

use crate::error::{ResolveError, Result};

/// An OSGi version: `major.minor.micro[.qualifier]`.
///
/// Ordering is numeric on the first three parts, then lexical on the
/// qualifier, which is exactly the field order below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    major: u32,
    minor: u32,
    micro: u32,
    qualifier: String,
}

impl Version {
    pub const EMPTY: Version = Version {
        major: 0,
        minor: 0,
        micro: 0,
        qualifier: String::new(),
    };

    pub fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Result<Self> {
        let qualifier = qualifier.into();
        if !qualifier.chars().all(is_qualifier_char) {
            return Err(ResolveError::InvalidVersion(format!(
                "{}.{}.{}.{qualifier}",
                self.major, self.minor, self.micro
            )));
        }
        self.qualifier = qualifier;
        Ok(self)
    }

    /// Parse a version, trimming surrounding whitespace. A blank string is
    /// the empty version.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::EMPTY);
        }

        let invalid = || ResolveError::InvalidVersion(text.to_string());
        let mut parts = trimmed.splitn(4, '.');
        let mut numbers = [0u32; 3];
        let mut seen = 0;
        for slot in numbers.iter_mut() {
            match parts.next() {
                Some(part) => {
                    *slot = parse_component(part).ok_or_else(invalid)?;
                    seen += 1;
                }
                None => break,
            }
        }

        let qualifier = match parts.next() {
            Some(q) if seen == 3 && !q.is_empty() && q.chars().all(is_qualifier_char) => {
                q.to_string()
            }
            Some(_) => return Err(invalid()),
            None => String::new(),
        };

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            micro: numbers[2],
            qualifier,
        })
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn micro(&self) -> u32 {
        self.micro
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }
}

fn parse_component(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn is_qualifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl FromStr for Version {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_partial_versions() {
        assert_eq!(Version::parse("1").unwrap(), Version::new(1, 0, 0));
        assert_eq!(Version::parse("1.2").unwrap(), Version::new(1, 2, 0));
        assert_eq!(Version::parse(" 1.2.3 ").unwrap(), Version::new(1, 2, 3));
        assert_eq!(Version::parse("").unwrap(), Version::EMPTY);
    }

    #[test]
    fn parse_qualifier() {
        let v = Version::parse("1.2.3.redhat-001").unwrap();
        assert_eq!(v.qualifier(), "redhat-001");
        assert_eq!(v.to_string(), "1.2.3.redhat-001");
    }

    #[test]
    fn rejects_malformed() {
        assert!(Version::parse("1.x").is_err());
        assert!(Version::parse("1.2.").is_err());
        assert!(Version::parse("1.2.3.").is_err());
        assert!(Version::parse("1.2.3.a.b").is_err());
        assert!(Version::parse("+1").is_err());
        assert!(Version::parse("1.2.q").is_err());
    }

    #[test]
    fn ordering_is_semantic() {
        let a = Version::parse("1.10.0").unwrap();
        let b = Version::parse("1.9.0").unwrap();
        assert!(a > b);

        let plain = Version::parse("1.0.0").unwrap();
        let qualified = Version::parse("1.0.0.SNAPSHOT").unwrap();
        assert!(qualified > plain);
    }

    #[test]
    fn display_drops_empty_qualifier() {
        assert_eq!(Version::parse("2").unwrap().to_string(), "2.0.0");
    }
}
