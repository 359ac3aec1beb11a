//! `{param}` placeholders in resource URI templates.

use std::collections::BTreeMap;

/// Names of the `{param}` placeholders in `template`, in order of appearance.
///
/// An unmatched `{` restarts at the next `{`; text without a closing `}` is ignored.
///
/// ```rust
/// use mcpgen_runtime::uri_template::extract_params;
///
/// assert_eq!(extract_params("file:///{dir}/{name}.txt"), vec!["dir", "name"]);
/// ```
pub fn extract_params(template: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut start: Option<usize> = None;
    for (i, ch) in template.char_indices() {
        match ch {
            '{' => start = Some(i + 1),
            '}' => {
                if let Some(s) = start.take() {
                    params.push(template[s..i].to_string());
                }
            }
            _ => {}
        }
    }
    params
}

enum Segment<'a> {
    Literal(&'a str),
    Param(&'a str),
}

fn segments(template: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        if open > 0 {
            out.push(Segment::Literal(&rest[..open]));
        }
        out.push(Segment::Param(&rest[open + 1..open + close]));
        rest = &rest[open + close + 1..];
    }
    if !rest.is_empty() {
        out.push(Segment::Literal(rest));
    }
    out
}

/// Match `uri` against `template` and capture each placeholder.
///
/// A placeholder captures up to the first occurrence of the literal text that follows it, or
/// to the end of the URI when it is last. Empty captures do not match.
pub fn match_uri(template: &str, uri: &str) -> Option<BTreeMap<String, String>> {
    let segs = segments(template);
    let mut captures = BTreeMap::new();
    let mut rest = uri;
    let mut i = 0;
    while i < segs.len() {
        match segs[i] {
            Segment::Literal(lit) => {
                rest = rest.strip_prefix(lit)?;
            }
            Segment::Param(name) => {
                let value = match segs.get(i + 1) {
                    Some(Segment::Literal(next)) => {
                        let end = rest.find(next)?;
                        &rest[..end]
                    }
                    // Two adjacent placeholders cannot be split unambiguously.
                    Some(Segment::Param(_)) => return None,
                    None => rest,
                };
                if value.is_empty() {
                    return None;
                }
                captures.insert(name.to_string(), value.to_string());
                rest = &rest[value.len()..];
            }
        }
        i += 1;
    }
    rest.is_empty().then_some(captures)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn test_extract_params() {
        assert_eq!(extract_params("db://{table}/{id}"), vec!["table", "id"]);
        assert!(extract_params("file:///static.txt").is_empty());
        assert_eq!(extract_params("x://{a{b}"), vec!["b"]);
        assert!(extract_params("x://{open").is_empty());
    }

    #[test]
    fn test_match_uri_captures() {
        let caps = match_uri("db://{table}/{id}", "db://users/42").unwrap();
        assert_eq!(caps["table"], "users");
        assert_eq!(caps["id"], "42");
    }

    #[test]
    fn test_match_uri_trailing_literal() {
        let caps = match_uri("file:///{name}.md", "file:///readme.md").unwrap();
        assert_eq!(caps["name"], "readme");
        assert!(match_uri("file:///{name}.md", "file:///readme.txt").is_none());
    }

    #[test]
    fn test_match_uri_rejects_mismatch() {
        assert!(match_uri("db://{table}", "http://users").is_none());
        assert!(match_uri("db://{table}/{id}", "db://users/").is_none());
        assert!(match_uri("db://static", "db://static/extra").is_none());
        assert!(match_uri("db://static", "db://static").unwrap().is_empty());
    }
}
