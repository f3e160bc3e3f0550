pub mod convert;
pub mod evaluate;
pub mod parse;

use std::{collections::BTreeSet, fmt};

pub use evaluate::compare_substring;
pub use parse::{parse, parse_substring};

/// Comparison operator of a leaf filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Lte,
    Gte,
    Approx,
}

impl Op {
    fn symbol(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Lte => "<=",
            Op::Gte => ">=",
            Op::Approx => "~=",
        }
    }
}

/// An LDAP-style filter over capability attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Filter {
    MatchAll,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Compare {
        attribute: String,
        op: Op,
        value: String,
    },
    /// `attr=a*b*c`. Pieces are literal; an empty first or last piece
    /// leaves that end unanchored.
    Substring {
        attribute: String,
        pieces: Vec<String>,
    },
    Present {
        attribute: String,
    },
}

impl Filter {
    pub fn eq(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Compare {
            attribute: attribute.into(),
            op: Op::Eq,
            value: value.into(),
        }
    }

    pub fn compare(attribute: impl Into<String>, op: Op, value: impl Into<String>) -> Self {
        Self::Compare {
            attribute: attribute.into(),
            op,
            value: value.into(),
        }
    }

    pub fn not(filter: Filter) -> Self {
        Self::Not(Box::new(filter))
    }

    /// Build the leaf for `attribute=<pieces>` as produced by
    /// [`parse_substring`]: one piece is equality, `*` alone is presence.
    pub fn from_pieces(attribute: impl Into<String>, mut pieces: Vec<String>) -> Self {
        let attribute = attribute.into();
        match pieces.len() {
            0 => Self::eq(attribute, ""),
            1 => Self::eq(attribute, pieces.remove(0)),
            2 if pieces[0].is_empty() && pieces[1].is_empty() => Self::Present { attribute },
            _ => Self::Substring { attribute, pieces },
        }
    }

    /// The attribute a leaf tests, `None` for operators.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::Compare { attribute, .. }
            | Self::Substring { attribute, .. }
            | Self::Present { attribute } => Some(attribute),
            _ => None,
        }
    }

    /// Attribute names referenced by leaves reachable through `And`
    /// nodes only. These are the names a requirement is considered to
    /// name explicitly for mandatory attribute checks.
    pub fn conjunct_attributes(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_conjuncts(&mut names);
        names
    }

    fn collect_conjuncts<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Self::And(children) => {
                for child in children {
                    child.collect_conjuncts(names);
                }
            }
            other => {
                if let Some(attribute) = other.attribute() {
                    names.insert(attribute);
                }
            }
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    for c in value.chars() {
        if matches!(c, '\\' | '(' | ')' | '*') {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchAll => f.write_str("(*)"),
            Self::And(children) | Self::Or(children) => {
                f.write_str(if matches!(self, Self::And(_)) { "(&" } else { "(|" })?;
                for child in children {
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
            Self::Not(child) => write!(f, "(!{child})"),
            Self::Compare {
                attribute,
                op,
                value,
            } => {
                write!(f, "({attribute}{}", op.symbol())?;
                write_escaped(f, value)?;
                f.write_str(")")
            }
            Self::Substring { attribute, pieces } => {
                write!(f, "({attribute}=")?;
                for (i, piece) in pieces.iter().enumerate() {
                    if i > 0 {
                        f.write_str("*")?;
                    }
                    write_escaped(f, piece)?;
                }
                f.write_str(")")
            }
            Self::Present { attribute } => write!(f, "({attribute}=*)"),
        }
    }
}
