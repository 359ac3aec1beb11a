use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use tracing::{debug, info};

use super::category::{HandlerCategory, HandlerId, RequiredHandlers};
use super::parser::{ExistingHandlers, HandlerRecord, ImplBlock, ParsedHandlerFile, ResolverSourceParser};
use super::trailer::{comment_out, dedent, render_trailer, OrphanEntry};
use crate::error::{GenError, Result};

/// Comment placed above a restored stub, followed by the previous source.
pub const RESTORED_NOTE: &str = "Restored from the orphaned section. Previous implementation:";

/// What a merge will do to a handler file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    /// Operations without any handler: they get a fresh stub.
    pub new_stubs: Vec<HandlerId>,
    /// Previously orphaned and required again, with no live copy: a fresh stub is added and
    /// the old source is copied above it as a comment.
    pub restored: Vec<OrphanEntry>,
    /// Previously orphaned and required again, already live again: only leaves the section.
    pub reclaimed: Vec<HandlerId>,
    /// Live handlers whose operation is gone: cut out and moved to the section.
    pub newly_orphaned: Vec<HandlerRecord>,
    /// Full orphaned section after the merge, sorted.
    pub orphans: Vec<OrphanEntry>,
}

impl MergePlan {
    pub fn changed(&self) -> bool {
        !(self.new_stubs.is_empty()
            && self.restored.is_empty()
            && self.reclaimed.is_empty()
            && self.newly_orphaned.is_empty())
    }

    pub fn summary(&self) -> MergeSummary {
        MergeSummary {
            added: self.new_stubs.len(),
            orphaned: self.newly_orphaned.len(),
            restored: self.restored.len() + self.reclaimed.len(),
        }
    }
}

/// Counts reported after a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub added: usize,
    pub orphaned: usize,
    pub restored: usize,
}

impl MergeSummary {
    pub fn changed(&self) -> bool {
        self.added + self.orphaned + self.restored > 0
    }
}

impl fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.changed() {
            return f.write_str("up to date");
        }
        write!(
            f,
            "added {} new, orphaned {}, restored {} from orphaned",
            self.added, self.orphaned, self.restored
        )
    }
}

/// Decide which stubs to add, which handlers to quarantine and which to bring back.
///
/// Records of quarantined handlers get their `orphaned` flag set. A live handler that also has
/// a stale entry in the orphaned section replaces that entry.
pub fn merge(existing: &mut ExistingHandlers, required: &RequiredHandlers) -> MergePlan {
    let mut plan = MergePlan::default();
    let mut section: BTreeMap<HandlerId, OrphanEntry> = existing
        .orphaned
        .iter()
        .map(|e| (e.id.clone(), e.clone()))
        .collect();

    for id in required.iter() {
        if existing.live.contains_key(id) {
            if section.remove(id).is_some() {
                plan.reclaimed.push(id.clone());
            }
        } else if let Some(entry) = section.remove(id) {
            plan.restored.push(entry);
        } else {
            plan.new_stubs.push(id.clone());
        }
    }

    for (id, record) in existing.live.iter_mut() {
        if required.contains(id) {
            continue;
        }
        record.orphaned = true;
        section.insert(
            id.clone(),
            OrphanEntry {
                id: id.clone(),
                source: dedent(&record.source),
            },
        );
        plan.newly_orphaned.push(record.clone());
    }

    plan.orphans = section.into_values().collect();
    debug!(
        new = plan.new_stubs.len(),
        restored = plan.restored.len(),
        reclaimed = plan.reclaimed.len(),
        orphaned = plan.newly_orphaned.len(),
        "merge planned"
    );
    plan
}

struct Edit {
    range: Range<usize>,
    text: String,
}

/// Applies a [`MergePlan`] to the text of a parsed handler file.
pub struct MergeWriter<'p> {
    parsed: &'p ParsedHandlerFile,
    impl_blocks: Vec<ImplBlock>,
    /// Start of the orphaned section, or the end of the file.
    live_end: usize,
    /// End of the orphaned section. Text after it is copied through.
    tail_start: usize,
    resolver_type: String,
    runtime_crate: String,
}

impl<'p> MergeWriter<'p> {
    pub fn new(
        parser: &ResolverSourceParser,
        parsed: &'p ParsedHandlerFile,
        resolver_type: impl Into<String>,
        runtime_crate: impl Into<String>,
    ) -> Self {
        let (live_end, tail_start) = parser
            .trailer(parsed)
            .map_or((parsed.source.len(), parsed.source.len()), |t| (t.start, t.end));
        Self {
            parsed,
            impl_blocks: parser.impl_blocks(parsed),
            live_end,
            tail_start,
            resolver_type: resolver_type.into(),
            runtime_crate: runtime_crate.into(),
        }
    }

    /// Produce the merged file. `stub` renders the formatted, indented stub method of a
    /// handler.
    ///
    /// # Errors
    ///
    /// Whatever `stub` returns, and `CodeFormat` when the merged text does not parse.
    pub fn write(
        &self,
        plan: &MergePlan,
        mut stub: impl FnMut(&HandlerId) -> Result<String>,
    ) -> Result<String> {
        let source = self.parsed.source.as_str();

        let mut additions: BTreeMap<HandlerCategory, Vec<(String, String)>> = BTreeMap::new();
        for id in &plan.new_stubs {
            additions
                .entry(id.category)
                .or_default()
                .push((id.name.clone(), stub(id)?));
        }
        for entry in &plan.restored {
            let text = format!(
                "    // {RESTORED_NOTE}\n{}{}",
                comment_out(&entry.source, "    "),
                stub(&entry.id)?
            );
            additions
                .entry(entry.id.category)
                .or_default()
                .push((entry.id.name.clone(), text));
        }

        let mut edits: Vec<Edit> = plan
            .newly_orphaned
            .iter()
            .map(|r| Edit {
                range: r.span.clone(),
                text: String::new(),
            })
            .collect();

        let mut new_blocks = Vec::new();
        for (category, mut methods) in additions {
            methods.sort_by(|a, b| a.0.cmp(&b.0));
            let joined = methods
                .into_iter()
                .map(|(_, text)| text)
                .collect::<Vec<_>>()
                .join("\n\n");
            let mut candidates = self.impl_blocks.iter().rev().filter(|b| b.category == category);
            let block = candidates
                .clone()
                .find(|b| b.close_brace < self.live_end)
                .or_else(|| candidates.next());
            match block {
                Some(block) => edits.push(self.insertion(block, &joined)),
                None => new_blocks.push(format!(
                    "impl {} for {} {{\n{joined}\n}}\n",
                    category.trait_name(),
                    self.resolver_type
                )),
            }
        }

        let (head_edits, rest): (Vec<Edit>, Vec<Edit>) = edits
            .into_iter()
            .partition(|e| e.range.end <= self.live_end);
        let tail_edits = rest
            .into_iter()
            .filter(|e| e.range.start >= self.tail_start)
            .collect();
        let live = apply_edits(&source[..self.live_end], 0, head_edits);
        let tail = apply_edits(&source[self.tail_start..], self.tail_start, tail_edits);

        let mut out = live.trim_end().to_string();
        out.push('\n');
        for block in new_blocks {
            out.push('\n');
            out.push_str(&block);
        }
        if !plan.orphans.is_empty() {
            out.push('\n');
            out.push_str(&render_trailer(&plan.orphans, &self.runtime_crate));
        }
        let tail = skip_blank_lines(&tail);
        if !tail.is_empty() {
            out.push('\n');
            out.push_str(tail);
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        syn::parse_file(&out).map_err(|e| GenError::CodeFormat {
            file: self.parsed.path.display().to_string(),
            message: format!("merged handler file does not parse: {e}"),
            source_code: out.clone(),
        })?;
        info!(file = %self.parsed.path.display(), summary = %plan.summary(), "handlers merged");
        Ok(out)
    }

    /// Insert `methods` before the closing brace of `block`.
    fn insertion(&self, block: &ImplBlock, methods: &str) -> Edit {
        let source = self.parsed.source.as_str();
        let lines = &self.parsed.lines;
        let line_start = lines.line_start(lines.line_of(block.close_brace));
        if source[line_start..block.close_brace].trim().is_empty() {
            let separator = if source[..line_start].trim_end().ends_with('{') {
                ""
            } else {
                "\n"
            };
            Edit {
                range: line_start..line_start,
                text: format!("{separator}{methods}\n"),
            }
        } else {
            Edit {
                range: block.close_brace..block.close_brace,
                text: format!("\n{methods}\n"),
            }
        }
    }
}

/// Apply `edits` to `text`, which starts at byte `offset` of the original file. Edits
/// overlapping one already applied are dropped.
fn apply_edits(text: &str, offset: usize, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| {
        b.range
            .start
            .cmp(&a.range.start)
            .then(b.range.end.cmp(&a.range.end))
    });
    let mut out = text.to_string();
    let mut applied_from = usize::MAX;
    for edit in edits {
        if edit.range.end > applied_from {
            continue;
        }
        applied_from = edit.range.start;
        out.replace_range(edit.range.start - offset..edit.range.end - offset, &edit.text);
    }
    out
}

/// `text` without its leading whitespace-only lines.
fn skip_blank_lines(text: &str) -> &str {
    let mut rest = text;
    while let Some(newline) = rest.find('\n') {
        if !rest[..newline].trim().is_empty() {
            break;
        }
        rest = &rest[newline + 1..];
    }
    if rest.trim().is_empty() {
        ""
    } else {
        rest
    }
}
