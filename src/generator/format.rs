use crate::error::{GenError, Result};

/// First line of every file the generator owns outright.
pub const GENERATED_HEADER: &str = "// Code generated by mcpgen. DO NOT EDIT.";

/// Parse `raw` as a Rust file and pretty-print it.
///
/// # Errors
///
/// `CodeFormat` carrying the unformatted buffer when `raw` does not parse.
pub fn format_source(file: &str, raw: &str) -> Result<String> {
    let parsed = parse_file(file, raw)?;
    Ok(prettyplease::unparse(&parsed))
}

/// [`format_source`] with [`GENERATED_HEADER`] prepended.
pub fn format_generated(file: &str, raw: &str) -> Result<String> {
    let formatted = format_source(file, raw)?;
    Ok(format!("{GENERATED_HEADER}\n\n{formatted}"))
}

/// Check that `source` parses, leaving it untouched. Used for user-owned files whose
/// non-doc comments must survive.
pub fn check_source(file: &str, source: &str) -> Result<()> {
    parse_file(file, source).map(|_| ())
}

fn parse_file(file: &str, source: &str) -> Result<syn::File> {
    syn::parse_file(source).map_err(|e| {
        let start = e.span().start();
        GenError::CodeFormat {
            file: file.to_string(),
            message: format!("{e} (line {}, column {})", start.line, start.column + 1),
            source_code: source.to_string(),
        }
    })
}

/// Format a single method for insertion into an `impl` block.
///
/// The method is wrapped in a throwaway `impl`, pretty-printed, and unwrapped again, so the
/// result carries the same indentation and line breaks as methods in a freshly rendered file.
pub fn format_method(file: &str, method: &str) -> Result<String> {
    let wrapped = format!("impl __Trait for __Type {{\n{method}\n}}\n");
    let formatted = format_source(file, &wrapped)?;
    let lines: Vec<&str> = formatted.lines().collect();
    let body = match lines.as_slice() {
        [_, inner @ .., _] => inner.join("\n"),
        _ => String::new(),
    };
    Ok(body)
}

/// Wrap `text` in a raw string literal with enough `#` marks to contain it.
pub fn raw_string_literal(text: &str) -> String {
    let mut longest = 0;
    let mut run: Option<usize> = None;
    for c in text.chars() {
        run = match (c, run) {
            ('"', _) => Some(0),
            ('#', Some(n)) => Some(n + 1),
            _ => None,
        };
        if let Some(n) = run {
            longest = longest.max(n);
        }
    }
    let hashes = "#".repeat(longest + 1);
    format!("r{hashes}\"{text}\"{hashes}")
}

/// A Rust string literal for `text`.
pub fn string_literal(text: &str) -> String {
    format!("{text:?}")
}

/// `Some("..".to_string())` or `None`.
pub fn optional_string_literal(text: Option<&str>) -> String {
    match text {
        Some(t) => format!("Some({}.to_string())", string_literal(t)),
        None => "None".to_string(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn test_format_source_normalizes_layout() {
        let out = format_source("types.rs", "pub struct A{pub x:i64,}").unwrap();
        assert_eq!(out, "pub struct A {\n    pub x: i64,\n}\n");
    }

    #[test]
    fn test_format_source_reports_raw_buffer() {
        let err = format_source("types.rs", "pub struct {").unwrap_err();
        assert_eq!(err.raw_buffer(), Some("pub struct {"));
        assert!(err.to_string().contains("types.rs"));
    }

    #[test]
    fn test_format_generated_prepends_header() {
        let out = format_generated("server.rs", "pub type A = i64;").unwrap();
        assert!(out.starts_with(GENERATED_HEADER));
        assert!(out.ends_with("pub type A = i64;\n"));
    }

    #[test]
    fn test_format_method_is_indented() {
        let out = format_method(
            "handlers.rs",
            "async fn ping(&self) -> Result<(), HandlerError> { Err(HandlerError::not_implemented(\"ping\")) }",
        )
        .unwrap();
        assert!(out.starts_with("    async fn ping(&self)"));
        assert!(out.ends_with("    }"));
        assert!(!out.contains("__Trait"));
    }

    #[test]
    fn test_raw_string_literal_hashes() {
        assert_eq!(raw_string_literal("{}"), "r#\"{}\"#");
        assert_eq!(raw_string_literal(r##"a"#b"##), "r##\"a\"#b\"##");
        assert_eq!(raw_string_literal(r###""##"###), "r###\"\"##\"###");
    }

    #[test]
    fn test_optional_string_literal() {
        assert_eq!(optional_string_literal(None), "None");
        assert_eq!(
            optional_string_literal(Some("say \"hi\"")),
            "Some(\"say \\\"hi\\\"\".to_string())"
        );
    }
}
