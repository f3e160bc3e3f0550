use indexmap::IndexMap;

use crate::error::{ResolveError, Result};

/// One clause of a manifest header, before any header-specific
/// normalization. Values are raw text with surrounding quotes removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedClause {
    pub paths: Vec<String>,
    pub directives: IndexMap<String, String>,
    pub attributes: IndexMap<String, String>,
    /// Declared types of typed attributes (`key:Type=value`).
    pub types: IndexMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ClauseStart,
    ParameterStart,
    Key,
    DirectiveOrTypedAttribute,
    Argument,
    Value,
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Attributes,
    Directives,
}

/// Split a header value into clauses.
///
/// `,` separates clauses and `;` separates parameters. A parameter is a
/// path, a `key=value` attribute, a `key:=value` directive or a
/// `key:Type=value` typed attribute. Quoted values may contain delimiters;
/// `\` escapes the next character and is kept in the value.
pub fn parse_standard_header(header: &str) -> Result<Vec<ParsedClause>> {
    let chars: Vec<char> = header.chars().collect();
    let text = |from: usize, to: usize| chars[from..to].iter().collect::<String>();

    let mut clauses: Vec<ParsedClause> = Vec::new();
    let mut state = State::ClauseStart;
    let mut target = Target::Attributes;
    let mut key = String::new();
    let mut pos = 0;
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;

    loop {
        let current = chars.get(pos).copied();
        match state {
            State::ClauseStart => {
                clauses.push(ParsedClause::default());
                state = State::ParameterStart;
                continue;
            }
            State::ParameterStart => {
                start = pos;
                state = State::Key;
                continue;
            }
            State::Key => {
                match current {
                    Some(c @ (':' | '=')) => {
                        key = text(start, pos).trim().to_string();
                        if key.is_empty() {
                            return Err(ResolveError::header(header, "missing key"));
                        }
                        start = pos + 1;
                        target = Target::Attributes;
                        state = if c == ':' {
                            State::DirectiveOrTypedAttribute
                        } else {
                            State::Argument
                        };
                    }
                    None | Some(',' | ';') => {
                        let path = text(start, pos).trim().to_string();
                        if let Some(clause) = clauses.last_mut() {
                            clause.paths.push(path);
                        }
                        state = if current == Some(',') {
                            State::ClauseStart
                        } else {
                            State::ParameterStart
                        };
                    }
                    _ => {}
                }
                pos += 1;
            }
            State::DirectiveOrTypedAttribute => {
                if current == Some('=') {
                    if start != pos {
                        let type_name = text(start, pos).trim().to_string();
                        if let Some(clause) = clauses.last_mut() {
                            clause.types.insert(key.clone(), type_name);
                        }
                    } else {
                        target = Target::Directives;
                    }
                    state = State::Argument;
                    start = pos + 1;
                }
                pos += 1;
            }
            State::Argument => {
                if current == Some('"') {
                    quoted = true;
                    pos += 1;
                } else {
                    quoted = false;
                }
                if current.is_some_and(char::is_whitespace) {
                    pos += 1;
                } else {
                    state = State::Value;
                }
            }
            State::Value => {
                if escaped {
                    escaped = false;
                } else if current == Some('\\') {
                    escaped = true;
                } else if quoted && current == Some('"') {
                    quoted = false;
                } else if !quoted && matches!(current, None | Some(';' | ',')) {
                    let mut value = text(start, pos).trim().to_string();
                    if value.is_empty() {
                        return Err(ResolveError::header(
                            header,
                            format!("missing value for '{key}'"),
                        ));
                    }
                    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
                        value = value[1..value.len() - 1].to_string();
                    }
                    let Some(clause) = clauses.last_mut() else {
                        return Err(ResolveError::header(header, "value outside of a clause"));
                    };
                    let map = match target {
                        Target::Attributes => &mut clause.attributes,
                        Target::Directives => &mut clause.directives,
                    };
                    if map.insert(key.clone(), value).is_some() {
                        return Err(ResolveError::header(header, format!("duplicate '{key}'")));
                    }
                    state = if current == Some(';') {
                        State::ParameterStart
                    } else {
                        State::ClauseStart
                    };
                }
                pos += 1;
            }
        }

        if current.is_none() {
            break;
        }
    }

    match state {
        State::ClauseStart | State::ParameterStart => Ok(clauses),
        State::Value if quoted => Err(ResolveError::header(header, "unterminated quote")),
        _ => Err(ResolveError::header(header, "unexpected end of header")),
    }
}

/// Split `value` on any of the `delims` characters.
///
/// Delimiters inside double quotes are literal; quotes are kept in the
/// tokens. `\` escapes the next character and is dropped.
pub fn parse_delimited(value: &str, delims: &str, trim: bool) -> Result<Vec<String>> {
    const CHAR: u8 = 1;
    const DELIMITER: u8 = 2;
    const START_QUOTE: u8 = 4;
    const END_QUOTE: u8 = 8;

    let finish = |token: &str| {
        if trim {
            token.trim().to_string()
        } else {
            token.to_string()
        }
    };

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut expecting = CHAR | DELIMITER | START_QUOTE;
    let mut escaped = false;

    for c in value.chars() {
        if !escaped && c == '\\' {
            escaped = true;
            continue;
        }

        if escaped {
            current.push(c);
        } else if delims.contains(c) && expecting & DELIMITER != 0 {
            tokens.push(finish(&current));
            current.clear();
            expecting = CHAR | DELIMITER | START_QUOTE;
        } else if c == '"' && expecting & START_QUOTE != 0 {
            current.push(c);
            expecting = CHAR | END_QUOTE;
        } else if c == '"' && expecting & END_QUOTE != 0 {
            current.push(c);
            expecting = CHAR | START_QUOTE | DELIMITER;
        } else if expecting & CHAR != 0 {
            current.push(c);
        } else {
            return Err(ResolveError::header(value, "invalid delimited string"));
        }
        escaped = false;
    }

    if !current.is_empty() {
        tokens.push(finish(&current));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_paths_and_parameters() {
        let clauses =
            parse_standard_header("com.acme.foo;com.acme.bar;version=1.2.0;resolution:=optional")
                .unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].paths, vec!["com.acme.foo", "com.acme.bar"]);
        assert_eq!(clauses[0].attributes["version"], "1.2.0");
        assert_eq!(clauses[0].directives["resolution"], "optional");
    }

    #[test]
    fn parse_multiple_clauses() {
        let clauses = parse_standard_header("a;x=1, b , c;y:=2").unwrap();
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0].paths, vec!["a"]);
        assert_eq!(clauses[1].paths, vec!["b"]);
        assert_eq!(clauses[2].directives["y"], "2");
    }

    #[test]
    fn quoted_values_keep_delimiters() {
        let clauses =
            parse_standard_header(r#"pkg;version="[1.0,2.0)";uses:="a,b;c""#).unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].attributes["version"], "[1.0,2.0)");
        assert_eq!(clauses[0].directives["uses"], "a,b;c");
    }

    #[test]
    fn typed_attributes() {
        let clauses =
            parse_standard_header("osgi.ee;osgi.ee=JavaSE;version:List<Version>=\"1.7,1.8\"")
                .unwrap();
        assert_eq!(clauses[0].types["version"], "List<Version>");
        assert_eq!(clauses[0].attributes["version"], "1.7,1.8");
        assert!(!clauses[0].types.contains_key("osgi.ee"));
    }

    #[test]
    fn escapes_are_kept() {
        let clauses = parse_standard_header(r"ns;filter:=(a=b\,c)").unwrap();
        assert_eq!(clauses[0].directives["filter"], r"(a=b\,c)");
    }

    #[test]
    fn unterminated_quote_fails() {
        let err = parse_standard_header(r#"pkg;version="1.0"#).unwrap_err();
        assert!(matches!(err, ResolveError::HeaderSyntax { .. }));
    }

    #[test]
    fn duplicate_key_fails() {
        assert!(parse_standard_header("pkg;a=1;a=2").is_err());
        // an attribute and a directive may share a name
        assert!(parse_standard_header("pkg;a=1;a:=2").is_ok());
    }

    #[test]
    fn dangling_key_fails() {
        assert!(parse_standard_header("pkg;version=").is_err());
        assert!(parse_standard_header("pkg;version:").is_err());
        assert!(parse_standard_header("pkg;version=,other").is_err());
        assert!(parse_standard_header("pkg;=1").is_err());
        assert!(parse_standard_header("pkg; :=x").is_err());

        let quoted = parse_standard_header(r#"pkg;version="""#).unwrap();
        assert_eq!(quoted[0].attributes["version"], "");
    }

    #[test]
    fn delimited_strings() {
        assert_eq!(
            parse_delimited("a, b ,c", ",", true).unwrap(),
            vec!["a", "b", "c"]
        );
        assert_eq!(
            parse_delimited(r#""x,y",z"#, ",", false).unwrap(),
            vec![r#""x,y""#, "z"]
        );
        assert_eq!(parse_delimited(r"a\,b", ",", false).unwrap(), vec!["a,b"]);
        assert!(parse_delimited(r#""a"b"#, ",", false).is_ok());
        assert!(parse_delimited(r#""a""b"#, ",", false).is_ok());
    }
}
