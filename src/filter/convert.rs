use crate::{
    attr::{AttrValue, Attributes},
    filter::{Filter, Op, parse_substring},
    version::VersionRange,
};

impl Filter {
    /// Synthesize a filter from requirement attributes.
    ///
    /// Version ranges expand to bound checks; every other value becomes an
    /// equality (or substring, if its text holds a `*`) on its display form.
    /// Leaves keep attribute order, so the primary attribute stays first.
    pub fn from_attributes(attributes: &Attributes) -> Filter {
        let mut leaves = Vec::new();
        for (name, value) in attributes {
            match value {
                AttrValue::Range(range) => push_range(&mut leaves, name, range),
                other => leaves.push(Filter::from_pieces(
                    name.as_str(),
                    parse_substring(&other.to_string()),
                )),
            }
        }

        match leaves.len() {
            0 => Filter::MatchAll,
            1 => leaves.remove(0),
            _ => Filter::And(leaves),
        }
    }
}

fn push_range(leaves: &mut Vec<Filter>, name: &str, range: &VersionRange) {
    let floor = range.floor().to_string();
    leaves.push(if range.is_floor_inclusive() {
        Filter::compare(name, Op::Gte, floor)
    } else {
        Filter::not(Filter::compare(name, Op::Lte, floor))
    });

    if let Some(ceiling) = range.ceiling() {
        let ceiling = ceiling.to_string();
        leaves.push(if range.is_ceiling_inclusive() {
            Filter::compare(name, Op::Lte, ceiling)
        } else {
            Filter::not(Filter::compare(name, Op::Gte, ceiling))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    #[test]
    fn package_import_filter() {
        let mut attrs = Attributes::new();
        attrs.insert("osgi.wiring.package".into(), "com.acme.foo".into());
        attrs.insert(
            "version".into(),
            VersionRange::parse("[1.0,2.0)").unwrap().into(),
        );
        let filter = Filter::from_attributes(&attrs);
        assert_eq!(
            filter.to_string(),
            "(&(osgi.wiring.package=com.acme.foo)(version>=1.0.0)(!(version>=2.0.0)))"
        );
    }

    #[test]
    fn exclusive_floor_and_inclusive_ceiling() {
        let mut attrs = Attributes::new();
        attrs.insert(
            "v".into(),
            VersionRange::parse("(1,2]").unwrap().into(),
        );
        assert_eq!(
            Filter::from_attributes(&attrs).to_string(),
            "(&(!(v<=1.0.0))(v<=2.0.0))"
        );
    }

    #[test]
    fn single_and_empty() {
        assert_eq!(Filter::from_attributes(&Attributes::new()), Filter::MatchAll);

        let mut attrs = Attributes::new();
        attrs.insert("v".into(), AttrValue::Version(Version::new(1, 0, 0)));
        assert_eq!(Filter::from_attributes(&attrs), Filter::eq("v", "1.0.0"));

        let mut attrs = Attributes::new();
        attrs.insert("pkg".into(), "*".into());
        assert_eq!(
            Filter::from_attributes(&attrs),
            Filter::Present {
                attribute: "pkg".into()
            }
        );

        let mut attrs = Attributes::new();
        attrs.insert("pkg".into(), "com.acme.*".into());
        assert!(matches!(
            Filter::from_attributes(&attrs),
            Filter::Substring { .. }
        ));
    }

    #[test]
    fn at_least_range_has_no_ceiling() {
        let mut attrs = Attributes::new();
        attrs.insert("bundle-version".into(), VersionRange::ANY.into());
        assert_eq!(
            Filter::from_attributes(&attrs),
            Filter::compare("bundle-version", Op::Gte, "0.0.0")
        );
    }
}
