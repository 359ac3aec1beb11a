//! The orphaned-handler section at the end of a handler file.
//!
//! Layout, after the last live item:
//!
//! ```text
//! // ============================================================================
//! // Orphaned handlers
//! // ...banner...
//!
//! #[doc(hidden)]
//! pub const ORPHANED_HANDLERS: &[::mcpgen_runtime::OrphanedHandler] = &[
//!     ::mcpgen_runtime::OrphanedHandler { category: "tool", name: "old_tool" },
//! ];
//!
//! // orphaned tool handler `old_tool`:
//! // async fn old_tool(&self, ...) -> ... {
//! //     ...
//! // }
//! ```
//!
//! The constant is what the parser keys on; the comment blocks carry each handler's last
//! source so it can be copied back when its operation returns. The section ends with the last
//! block. Anything after it is ordinary code and is carried through merges untouched.

use once_cell::sync::Lazy;
use regex::Regex;
use syn::{Expr, Lit, Member};

use super::category::{HandlerCategory, HandlerId};

/// Name of the marker constant.
pub const ORPHANED_CONST: &str = "ORPHANED_HANDLERS";

pub const BANNER: [&str; 8] = [
    "// ============================================================================",
    "// Orphaned handlers",
    "// ============================================================================",
    "// The operations behind these handlers are no longer in the API description.",
    "// Their last source is kept below as comments. If an operation comes back,",
    "// the next `mcpgen generate` adds a fresh stub and copies this source above",
    "// it. Delete entries you no longer need.",
    "// ============================================================================",
];

#[allow(clippy::expect_used)]
static BLOCK_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^// orphaned (tool|resource|resource_template|prompt) handler `([^`]+)`:$")
        .expect("orphan header regex should be valid")
});

/// A quarantined handler and its last known source, dedented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanEntry {
    pub id: HandlerId,
    pub source: String,
}

/// Render the complete section for `entries`. Empty when there are none.
pub fn render_trailer(entries: &[OrphanEntry], runtime_crate: &str) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let marker = format!("::{runtime_crate}::OrphanedHandler");
    let mut out = String::new();
    for line in BANNER {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    out.push_str("#[doc(hidden)]\n");
    out.push_str(&format!("pub const {ORPHANED_CONST}: &[{marker}] = &[\n"));
    for entry in entries {
        out.push_str(&format!(
            "    {marker} {{\n        category: {:?},\n        name: {:?},\n    }},\n",
            entry.id.category.slug(),
            entry.id.name
        ));
    }
    out.push_str("];\n");
    for entry in entries {
        out.push('\n');
        out.push_str(&format!(
            "// orphaned {} handler `{}`:\n",
            entry.id.category.slug(),
            entry.id.name
        ));
        out.push_str(&comment_out(&entry.source, ""));
    }
    out
}

/// Prefix every line of `source` with `indent` and `// `.
pub fn comment_out(source: &str, indent: &str) -> String {
    let mut out = String::new();
    for line in source.lines() {
        if line.trim().is_empty() {
            out.push_str(&format!("{indent}//\n"));
        } else {
            out.push_str(&format!("{indent}// {line}\n"));
        }
    }
    out
}

/// Remove the indentation common to every non-blank line.
pub fn dedent(source: &str) -> String {
    let common = source
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    source
        .lines()
        .map(|l| l.get(common..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether `line` opens an orphan comment block.
pub(crate) fn is_block_header(line: &str) -> bool {
    BLOCK_HEADER_RE.is_match(line)
}

/// Whether the lines directly above a marker constant are the banner.
pub(crate) fn is_banner(lines: &[&str]) -> bool {
    lines.len() == BANNER.len() && lines.iter().zip(BANNER).all(|(l, b)| l.trim_end() == b)
}

/// Handler identities listed in the marker constant's initializer.
pub(crate) fn sentinel_entries(expr: &Expr) -> Vec<HandlerId> {
    let expr = match expr {
        Expr::Reference(r) => &*r.expr,
        other => other,
    };
    let Expr::Array(array) = expr else {
        return Vec::new();
    };
    array
        .elems
        .iter()
        .filter_map(|elem| {
            let Expr::Struct(fields) = elem else {
                return None;
            };
            let field = |key: &str| {
                fields.fields.iter().find_map(|fv| match (&fv.member, &fv.expr) {
                    (Member::Named(ident), Expr::Lit(lit)) if ident == key => match &lit.lit {
                        Lit::Str(s) => Some(s.value()),
                        _ => None,
                    },
                    _ => None,
                })
            };
            let category = HandlerCategory::from_slug(&field("category")?)?;
            Some(HandlerId::new(category, field("name")?))
        })
        .collect()
}

/// Commented-out sources following the marker constant, keyed by handler.
pub(crate) fn parse_comment_blocks(text: &str) -> Vec<(HandlerId, String)> {
    let mut blocks = Vec::new();
    let mut current: Option<(HandlerId, Vec<String>)> = None;
    for line in text.lines() {
        let line = line.trim_end();
        if let Some(caps) = BLOCK_HEADER_RE.captures(line) {
            if let Some((id, body)) = current.take() {
                blocks.push((id, body.join("\n")));
            }
            let category = HandlerCategory::from_slug(&caps[1]);
            current = category.map(|c| (HandlerId::new(c, &caps[2]), Vec::new()));
            continue;
        }
        let Some((_, body)) = current.as_mut() else {
            continue;
        };
        match line.strip_prefix("//") {
            Some(rest) => body.push(rest.strip_prefix(' ').unwrap_or(rest).to_string()),
            None => {
                if let Some((id, body)) = current.take() {
                    blocks.push((id, body.join("\n")));
                }
            }
        }
    }
    if let Some((id, body)) = current {
        blocks.push((id, body.join("\n")));
    }
    blocks
}
