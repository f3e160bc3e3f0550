use std::cmp::Ordering;

use crate::{
    attr::{AttrValue, Attributes},
    filter::{Filter, Op},
    version::{Version, VersionRange},
};

impl Filter {
    /// Evaluate the filter against an attribute map. Type mismatches and
    /// unparsable operands evaluate to `false`.
    pub fn matches(&self, attributes: &Attributes) -> bool {
        match self {
            Filter::MatchAll => true,
            Filter::And(children) => children.iter().all(|c| c.matches(attributes)),
            Filter::Or(children) => children.iter().any(|c| c.matches(attributes)),
            Filter::Not(child) => !child.matches(attributes),
            Filter::Present { attribute } => attributes.contains_key(attribute),
            Filter::Compare {
                attribute,
                op,
                value,
            } => attributes
                .get(attribute)
                .is_some_and(|lhs| compare(lhs, *op, value)),
            Filter::Substring { attribute, pieces } => attributes
                .get(attribute)
                .is_some_and(|lhs| substring_matches(lhs, pieces)),
        }
    }
}

/// Compare an attribute value with a filter operand, coercing the operand
/// to the attribute's type. Lists match if any element does.
pub(crate) fn compare(lhs: &AttrValue, op: Op, rhs: &str) -> bool {
    match lhs {
        AttrValue::List(items) => items.iter().any(|item| compare(item, op, rhs)),
        AttrValue::Str(s) => match op {
            Op::Eq => s == rhs,
            Op::Lte => s.as_str() <= rhs,
            Op::Gte => s.as_str() >= rhs,
            Op::Approx => approx_eq(s, rhs),
        },
        AttrValue::Long(v) => rhs
            .trim()
            .parse::<i64>()
            .is_ok_and(|r| ordered(v.cmp(&r), op)),
        AttrValue::Double(v) => rhs
            .trim()
            .parse::<f64>()
            .is_ok_and(|r| ordered(v.total_cmp(&r), op)),
        AttrValue::Version(v) => Version::parse(rhs).is_ok_and(|r| ordered(v.cmp(&r), op)),
        AttrValue::Range(range) => match op {
            Op::Eq | Op::Approx => VersionRange::parse(rhs).is_ok_and(|r| &r == range),
            Op::Lte | Op::Gte => false,
        },
    }
}

fn ordered(ordering: Ordering, op: Op) -> bool {
    match op {
        Op::Eq | Op::Approx => ordering == Ordering::Equal,
        Op::Lte => ordering != Ordering::Greater,
        Op::Gte => ordering != Ordering::Less,
    }
}

fn approx_eq(lhs: &str, rhs: &str) -> bool {
    let normalize = |s: &str| {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect::<String>()
    };
    normalize(lhs) == normalize(rhs)
}

fn substring_matches(lhs: &AttrValue, pieces: &[String]) -> bool {
    match lhs {
        AttrValue::Str(s) => compare_substring(s, pieces),
        AttrValue::List(items) => items.iter().any(|item| substring_matches(item, pieces)),
        _ => false,
    }
}

/// Match `value` against substring pieces. The first piece must be a
/// prefix, the last a suffix, and the middle pieces must appear in order
/// without overlapping.
pub fn compare_substring(value: &str, pieces: &[String]) -> bool {
    if pieces.is_empty() {
        return true;
    }
    let last = pieces.len() - 1;
    if last == 0 {
        return value == pieces[0];
    }

    let mut index = 0;
    for (i, piece) in pieces.iter().enumerate() {
        if i == 0 && !value.starts_with(piece.as_str()) {
            return false;
        }
        if i == last {
            return value.ends_with(piece.as_str()) && value.len() >= index + piece.len();
        }
        if i > 0 {
            match value[index..].find(piece.as_str()) {
                Some(offset) => index += offset,
                None => return false,
            }
        }
        index += piece.len();
    }
    true
}
