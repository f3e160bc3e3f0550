use nom::{
    IResult,
    Parser,
    branch::alt,
    bytes::complete::{tag, take_till1},
    character::complete::{char, multispace0},
    combinator::{map, peek, value},
    error::{Error, ErrorKind},
    multi::many1,
    sequence::{delimited, preceded, terminated},
};

use crate::{
    error::{ResolveError, Result},
    filter::{Filter, Op},
};

fn filter(input: &str) -> IResult<&str, Filter> {
    delimited(
        (multispace0, char('('), multispace0),
        filter_comp,
        (char(')'), multispace0),
    )
    .parse(input)
}

fn filter_comp(input: &str) -> IResult<&str, Filter> {
    alt((
        map(preceded(char('&'), many1(filter)), Filter::And),
        map(preceded(char('|'), many1(filter)), Filter::Or),
        map(preceded(char('!'), filter), Filter::not),
        value(Filter::MatchAll, terminated(char('*'), peek(char(')')))),
        item,
    ))
    .parse(input)
}

fn operator(input: &str) -> IResult<&str, Op> {
    alt((
        value(Op::Lte, tag("<=")),
        value(Op::Gte, tag(">=")),
        value(Op::Approx, tag("~=")),
        value(Op::Eq, char('=')),
    ))
    .parse(input)
}

fn attribute(input: &str) -> IResult<&str, &str> {
    let (rest, name) = take_till1(|c: char| "=<>~()".contains(c)).parse(input)?;
    let name = name.trim_end();
    if name.is_empty() {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
    }
    Ok((rest, name))
}

/// Raw value text up to the closing paren, escapes left in place.
fn raw_value(input: &str) -> IResult<&str, &str> {
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            ')' => return Ok((&input[i..], &input[..i])),
            '(' => return Err(nom::Err::Failure(Error::new(&input[i..], ErrorKind::Char))),
            _ => {}
        }
    }
    Err(nom::Err::Error(Error::new(input, ErrorKind::Eof)))
}

fn item(input: &str) -> IResult<&str, Filter> {
    let (input, name) = attribute(input)?;
    let (input, op) = operator(input)?;
    let (input, raw) = raw_value(input)?;
    let filter = match op {
        Op::Eq => Filter::from_pieces(name, parse_substring(raw)),
        op => Filter::compare(name, op, unescape(raw)),
    };
    Ok((input, filter))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut escaped = false;
    for c in raw.chars() {
        if c == '\\' && !escaped {
            escaped = true;
            continue;
        }
        escaped = false;
        out.push(c);
    }
    out
}

/// Parse a fully parenthesized filter such as `(&(a=1)(!(b<=2)))`.
pub fn parse(text: &str) -> Result<Filter> {
    match filter(text) {
        Ok(("", filter)) => Ok(filter),
        Ok((rest, _)) => Err(ResolveError::filter(
            text,
            format!("unexpected trailing input '{rest}'"),
        )),
        Err(e) => Err(ResolveError::filter(text, format!("parse error: {e}"))),
    }
}

/// Split a raw equality value on unescaped `*`, removing escapes.
///
/// A single piece means no wildcard. Otherwise an empty first or last
/// piece marks an unanchored end; `*` alone yields two empty pieces.
/// Consecutive stars collapse into one.
pub fn parse_substring(raw: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut left_star = false;
    let mut right_star = false;
    let mut escaped = false;

    for c in raw.chars() {
        if escaped {
            escaped = false;
            right_star = false;
            current.push(c);
            continue;
        }
        match c {
            '\\' => escaped = true,
            '*' => {
                if pieces.is_empty() && current.is_empty() {
                    left_star = true;
                }
                if !current.is_empty() {
                    pieces.push(std::mem::take(&mut current));
                }
                right_star = true;
            }
            _ => {
                right_star = false;
                current.push(c);
            }
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    if left_star || right_star || pieces.len() > 1 {
        if right_star {
            pieces.push(String::new());
        }
        if left_star {
            pieces.insert(0, String::new());
        }
    }
    if pieces.is_empty() {
        pieces.push(String::new());
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(raw: &str) -> Vec<String> {
        parse_substring(raw)
    }

    #[test]
    fn parse_simple_item() {
        assert_eq!(parse("(a=1)").unwrap(), Filter::eq("a", "1"));
        assert_eq!(
            parse("( version >= 1.0 )").unwrap(),
            Filter::compare("version", Op::Gte, " 1.0 ")
        );
        assert_eq!(
            parse("(n~=Foo Bar)").unwrap(),
            Filter::compare("n", Op::Approx, "Foo Bar")
        );
    }

    #[test]
    fn parse_composites() {
        let filter = parse("(&(a=1)(|(b=2)(c<=3))(!(d=4)))").unwrap();
        assert_eq!(
            filter,
            Filter::And(vec![
                Filter::eq("a", "1"),
                Filter::Or(vec![Filter::eq("b", "2"), Filter::compare("c", Op::Lte, "3")]),
                Filter::not(Filter::eq("d", "4")),
            ])
        );
    }

    #[test]
    fn parse_whitespace_between_children() {
        let filter = parse(" (& (a=1) (b=2) ) ").unwrap();
        assert_eq!(
            filter,
            Filter::And(vec![Filter::eq("a", "1"), Filter::eq("b", "2")])
        );
    }

    #[test]
    fn parse_substring_and_present() {
        assert_eq!(
            parse("(name=ab*cd)").unwrap(),
            Filter::Substring {
                attribute: "name".into(),
                pieces: vec!["ab".into(), "cd".into()],
            }
        );
        assert_eq!(
            parse("(name=*)").unwrap(),
            Filter::Present {
                attribute: "name".into()
            }
        );
        assert_eq!(parse(r"(name=a\*b)").unwrap(), Filter::eq("name", "a*b"));
    }

    #[test]
    fn parse_escapes() {
        assert_eq!(parse(r"(a=x\(y\))").unwrap(), Filter::eq("a", "x(y)"));
        assert_eq!(
            parse(r"(a<=\\)").unwrap(),
            Filter::compare("a", Op::Lte, "\\")
        );
    }

    #[test]
    fn parse_match_all() {
        assert_eq!(parse("(*)").unwrap(), Filter::MatchAll);
    }

    #[test]
    fn parse_errors() {
        for bad in [
            "", "a=1", "(a=1", "(a=1))", "(=1)", "(a)", "(&)", "(a=(b)", "(!(a=1)(b=2))",
        ] {
            assert!(
                matches!(parse(bad), Err(ResolveError::FilterSyntax { .. })),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn substring_pieces() {
        assert_eq!(pieces("abc"), vec!["abc"]);
        assert_eq!(pieces(""), vec![""]);
        assert_eq!(pieces("*"), vec!["", ""]);
        assert_eq!(pieces("a*"), vec!["a", ""]);
        assert_eq!(pieces("*a"), vec!["", "a"]);
        assert_eq!(pieces("a*b*c"), vec!["a", "b", "c"]);
        assert_eq!(pieces("a**b"), vec!["a", "b"]);
        assert_eq!(pieces("**"), vec!["", ""]);
        assert_eq!(pieces(r"a\*b"), vec!["a*b"]);
    }

    #[test]
    fn display_round_trips() {
        for text in [
            "(&(a=1)(|(b=2)(c<=3))(!(d=4)))",
            "(name=*ab*cd*)",
            "(name=*)",
            r"(a=x\(y\)\*)",
            "(a>=1.0.0)",
            "(*)",
        ] {
            let filter = parse(text).unwrap();
            assert_eq!(filter.to_string(), text);
            assert_eq!(parse(&filter.to_string()).unwrap(), filter);
        }
    }
}
