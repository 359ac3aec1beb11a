use std::collections::BTreeMap;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use proc_macro2::{LineColumn, TokenStream};
use quote::ToTokens;
use syn::{GenericArgument, ImplItem, Item, PathArguments, Type};
use tracing::{debug, warn};

use super::category::{HandlerCategory, HandlerId};
use super::trailer::{
    is_banner, is_block_header, parse_comment_blocks, sentinel_entries, OrphanEntry, BANNER,
    ORPHANED_CONST,
};
use crate::error::{GenError, Result};

/// Byte offsets of line starts, for turning token positions into slices.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            starts,
            len: source.len(),
        }
    }

    /// Byte offset of a 1-based line, 0-based character column position.
    pub fn offset(&self, source: &str, at: LineColumn) -> usize {
        let index = at.line.saturating_sub(1);
        let Some(&start) = self.starts.get(index) else {
            return self.len;
        };
        let line = &source[start..self.line_end(index)];
        start
            + line
                .char_indices()
                .nth(at.column)
                .map_or(line.len(), |(i, _)| i)
    }

    /// 0-based line containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&s| s <= offset).saturating_sub(1)
    }

    pub fn line_start(&self, line: usize) -> usize {
        self.starts.get(line).copied().unwrap_or(self.len)
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Offset just past the line's newline, or the end of the file.
    pub fn next_line_start(&self, line: usize) -> usize {
        self.line_start(line + 1)
    }

    /// Offset of the line's newline, or the end of the file.
    fn line_end(&self, line: usize) -> usize {
        match self.starts.get(line + 1) {
            Some(&next) => next - 1,
            None => self.len,
        }
    }

    pub fn line<'s>(&self, source: &'s str, line: usize) -> &'s str {
        let start = self.line_start(line);
        let end = self.line_end(line).max(start);
        source[start..end].trim_end_matches('\r')
    }
}

/// A handler method found in a live `impl` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRecord {
    pub id: HandlerId,
    /// Method text from the start of its first line (leading comments and attributes included)
    /// through the closing brace.
    pub source: String,
    /// Byte range removing the handler cuts; whole lines where the layout allows.
    pub span: Range<usize>,
    /// Set by the merge when the handler no longer matches an operation.
    pub orphaned: bool,
}

/// An `impl <HandlerTrait> for <Resolver>` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImplBlock {
    pub category: HandlerCategory,
    /// Byte offset of the block's closing `}`.
    pub close_brace: usize,
}

/// The orphaned-handler section of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    /// Byte offset of the first banner line, or of the marker when the banner is gone.
    pub start: usize,
    /// Byte offset just past the last orphan comment block, or past the marker line when there
    /// are no blocks. Text from here on is user code.
    pub end: usize,
    pub entries: Vec<OrphanEntry>,
}

/// What an existing handler file contains, as the merge sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingHandlers {
    pub live: BTreeMap<HandlerId, HandlerRecord>,
    pub orphaned: Vec<OrphanEntry>,
}

/// A parsed handler file.
pub struct ParsedHandlerFile {
    pub path: PathBuf,
    pub source: String,
    pub lines: LineIndex,
    syntax: syn::File,
}

/// Locates handler methods, handler `impl` blocks and the orphaned section in a handler file.
#[derive(Debug, Clone)]
pub struct ResolverSourceParser {
    resolver_type: String,
}

impl ResolverSourceParser {
    pub fn new(resolver_type: impl Into<String>) -> Self {
        Self {
            resolver_type: resolver_type.into(),
        }
    }

    /// Read and parse `path`.
    ///
    /// # Errors
    ///
    /// `FileIo` when unreadable, `MergeParse` when not valid Rust.
    pub fn parse(&self, path: &Path) -> Result<ParsedHandlerFile> {
        let source = fs::read_to_string(path).map_err(|e| GenError::io("read", path, e))?;
        self.parse_source(path, source)
    }

    pub fn parse_source(&self, path: &Path, source: String) -> Result<ParsedHandlerFile> {
        let syntax = syn::parse_file(&source).map_err(|e| {
            let at = e.span().start();
            GenError::MergeParse {
                path: path.to_path_buf(),
                message: format!("{e} at line {}, column {}", at.line, at.column + 1),
            }
        })?;
        Ok(ParsedHandlerFile {
            path: path.to_path_buf(),
            lines: LineIndex::new(&source),
            source,
            syntax,
        })
    }

    /// Live handlers and orphaned entries of `parsed`.
    pub fn extract_handlers(&self, parsed: &ParsedHandlerFile) -> ExistingHandlers {
        let mut live = BTreeMap::new();
        for (category, item) in self.handler_impls(parsed) {
            for impl_item in &item.items {
                let ImplItem::Fn(method) = impl_item else {
                    continue;
                };
                let id = HandlerId::new(category, method.sig.ident.to_string());
                let Some(record) = method_record(parsed, method.to_token_stream(), id.clone()) else {
                    continue;
                };
                if live.contains_key(&id) {
                    warn!(file = %parsed.path.display(), handler = %id, "duplicate handler, keeping the first");
                    continue;
                }
                live.insert(id, record);
            }
        }
        let orphaned = self
            .trailer(parsed)
            .map(|t| t.entries)
            .unwrap_or_default();
        debug!(
            file = %parsed.path.display(),
            live = live.len(),
            orphaned = orphaned.len(),
            "handlers extracted"
        );
        ExistingHandlers { live, orphaned }
    }

    /// Handler `impl` blocks in file order.
    pub fn impl_blocks(&self, parsed: &ParsedHandlerFile) -> Vec<ImplBlock> {
        self.handler_impls(parsed)
            .map(|(category, item)| {
                let close = item.brace_token.span.close().start();
                ImplBlock {
                    category,
                    close_brace: parsed.lines.offset(&parsed.source, close),
                }
            })
            .collect()
    }

    /// The orphaned section, when the file has one.
    pub fn trailer(&self, parsed: &ParsedHandlerFile) -> Option<Trailer> {
        let marker = parsed.syntax.items.iter().find_map(|item| match item {
            Item::Const(c) if c.ident == ORPHANED_CONST => Some(c),
            _ => None,
        })?;
        let (start, end) = token_bounds(marker.to_token_stream())?;
        let start = parsed.lines.offset(&parsed.source, start);
        let end = parsed.lines.offset(&parsed.source, end);
        let marker_line = parsed.lines.line_of(start);

        let mut above = marker_line;
        while above > 0 && parsed.lines.line(&parsed.source, above - 1).trim().is_empty() {
            above -= 1;
        }
        let section_line = match above.checked_sub(BANNER.len()) {
            Some(first) => {
                let lines: Vec<&str> = (first..above)
                    .map(|l| parsed.lines.line(&parsed.source, l))
                    .collect();
                if is_banner(&lines) {
                    first
                } else {
                    marker_line
                }
            }
            None => marker_line,
        };

        let blocks_end = section_end(parsed, end);
        let mut sources: BTreeMap<HandlerId, String> =
            parse_comment_blocks(&parsed.source[end..blocks_end]).into_iter().collect();
        let entries = sentinel_entries(&marker.expr)
            .into_iter()
            .map(|id| OrphanEntry {
                source: sources.remove(&id).unwrap_or_default(),
                id,
            })
            .collect();
        Some(Trailer {
            start: parsed.lines.line_start(section_line),
            end: blocks_end,
            entries,
        })
    }

    fn handler_impls<'f>(
        &'f self,
        parsed: &'f ParsedHandlerFile,
    ) -> impl Iterator<Item = (HandlerCategory, &'f syn::ItemImpl)> + 'f {
        parsed.syntax.items.iter().filter_map(move |item| {
            let Item::Impl(item) = item else {
                return None;
            };
            let (_, trait_path, _) = item.trait_.as_ref()?;
            let trait_name = trait_path.segments.last()?.ident.to_string();
            let category = HandlerCategory::from_trait_name(&trait_name)?;
            names_type(&item.self_ty, &self.resolver_type).then_some((category, item))
        })
    }
}

/// Whether `ty` is the resolver type, possibly behind `&`, `&mut`, `Box`, `Arc` or `Rc`.
fn names_type(ty: &Type, name: &str) -> bool {
    match ty {
        Type::Reference(r) => names_type(&r.elem, name),
        Type::Paren(p) => names_type(&p.elem, name),
        Type::Group(g) => names_type(&g.elem, name),
        Type::Path(p) => {
            let Some(segment) = p.path.segments.last() else {
                return false;
            };
            if segment.ident == name {
                return true;
            }
            let wrapper = ["Box", "Arc", "Rc"].iter().any(|w| segment.ident == w);
            match &segment.arguments {
                PathArguments::AngleBracketed(args) if wrapper => args.args.iter().any(|arg| {
                    matches!(arg, GenericArgument::Type(inner) if names_type(inner, name))
                }),
                _ => false,
            }
        }
        _ => false,
    }
}

/// End of the orphan comment blocks that follow the marker ending at `marker_end`.
///
/// Blank lines between blocks belong to the section; the first line that is neither blank nor
/// part of a block ends it.
fn section_end(parsed: &ParsedHandlerFile, marker_end: usize) -> usize {
    let source = parsed.source.as_str();
    let lines = &parsed.lines;
    let marker_line = lines.line_of(marker_end.saturating_sub(1));
    let mut end = lines.next_line_start(marker_line);
    let mut line = marker_line + 1;
    while line < lines.line_count() {
        let text = lines.line(source, line).trim_end();
        if text.is_empty() {
            line += 1;
            continue;
        }
        if !is_block_header(text) {
            break;
        }
        line += 1;
        while line < lines.line_count() {
            let body = lines.line(source, line).trim_end();
            if !body.starts_with("//") || is_block_header(body) {
                break;
            }
            line += 1;
        }
        end = lines.line_start(line);
    }
    end
}

/// Positions of the first and last token of `tokens`.
fn token_bounds(tokens: TokenStream) -> Option<(LineColumn, LineColumn)> {
    let mut iter = tokens.into_iter();
    let first = iter.next()?;
    let start = first.span().start();
    let end = iter.last().unwrap_or(first).span().end();
    Some((start, end))
}

fn method_record(parsed: &ParsedHandlerFile, tokens: TokenStream, id: HandlerId) -> Option<HandlerRecord> {
    let source = parsed.source.as_str();
    let lines = &parsed.lines;
    let (start, end) = token_bounds(tokens)?;
    let start = lines.offset(source, start);
    let end = lines.offset(source, end);

    let first_line = lines.line_of(start);
    let last_line = lines.line_of(end.saturating_sub(1));
    let alone_at_start = source[lines.line_start(first_line)..start].trim().is_empty();
    let alone_at_end = source[end..lines.next_line_start(last_line)].trim().is_empty();

    let from = if alone_at_start {
        let mut line = first_line;
        while line > 0 && lines.line(source, line - 1).trim_start().starts_with("//") {
            line -= 1;
        }
        lines.line_start(line)
    } else {
        start
    };
    let to = if alone_at_end {
        lines.next_line_start(last_line)
    } else {
        end
    };

    // Take one blank separator line along so removals leave no double gaps.
    let from_line = lines.line_of(from);
    let cut_from = if alone_at_start && from_line > 0 && lines.line(source, from_line - 1).trim().is_empty() {
        lines.line_start(from_line - 1)
    } else {
        from
    };

    Some(HandlerRecord {
        id,
        source: source[from..end].to_string(),
        span: cut_from..to,
        orphaned: false,
    })
}
