use std::fmt;

use crate::{
    error::{ResolveError, Result},
    version::Version,
};

/// An interval of versions, `[floor,ceiling)` style. A missing ceiling means
/// "at least `floor`".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionRange {
    floor: Version,
    floor_inclusive: bool,
    ceiling: Option<Version>,
    ceiling_inclusive: bool,
}

impl VersionRange {
    /// Every version, i.e. at least `0.0.0`.
    pub const ANY: VersionRange = VersionRange {
        floor: Version::EMPTY,
        floor_inclusive: true,
        ceiling: None,
        ceiling_inclusive: false,
    };

    pub fn new(
        floor: Version,
        floor_inclusive: bool,
        ceiling: Option<Version>,
        ceiling_inclusive: bool,
    ) -> Self {
        Self {
            floor,
            floor_inclusive,
            ceiling,
            ceiling_inclusive,
        }
    }

    pub fn at_least(floor: Version) -> Self {
        Self::new(floor, true, None, false)
    }

    pub fn exact(version: Version) -> Self {
        Self::new(version.clone(), true, Some(version), true)
    }

    /// Parse `[a,b]`, `[a,b)`, `(a,b]`, `(a,b)` or a bare version.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let invalid = || ResolveError::InvalidVersionRange(text.to_string());

        let Some(comma) = trimmed.find(',') else {
            return Version::parse(trimmed)
                .map(Self::at_least)
                .map_err(|_| invalid());
        };

        let floor_inclusive = match trimmed.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => return Err(invalid()),
        };
        let ceiling_inclusive = match trimmed.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(invalid()),
        };

        let low = trimmed[1..comma].trim();
        let high = trimmed[comma + 1..trimmed.len() - 1].trim();
        if low.is_empty() || high.is_empty() {
            return Err(invalid());
        }

        let floor = Version::parse(low).map_err(|_| invalid())?;
        let ceiling = Version::parse(high).map_err(|_| invalid())?;
        Ok(Self::new(floor, floor_inclusive, Some(ceiling), ceiling_inclusive))
    }

    pub fn floor(&self) -> &Version {
        &self.floor
    }

    pub fn is_floor_inclusive(&self) -> bool {
        self.floor_inclusive
    }

    pub fn ceiling(&self) -> Option<&Version> {
        self.ceiling.as_ref()
    }

    pub fn is_ceiling_inclusive(&self) -> bool {
        self.ceiling_inclusive
    }

    pub fn includes(&self, version: &Version) -> bool {
        let above_floor = if self.floor_inclusive {
            version >= &self.floor
        } else {
            version > &self.floor
        };
        let below_ceiling = match &self.ceiling {
            None => true,
            Some(c) if self.ceiling_inclusive => version <= c,
            Some(c) => version < c,
        };
        above_floor && below_ceiling
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ceiling {
            None => write!(f, "{}", self.floor),
            Some(ceiling) => write!(
                f,
                "{}{},{}{}",
                if self.floor_inclusive { '[' } else { '(' },
                self.floor,
                ceiling,
                if self.ceiling_inclusive { ']' } else { ')' }
            ),
        }
    }
}
