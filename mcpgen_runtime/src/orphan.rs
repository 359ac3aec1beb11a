/// An entry in a handler file's `ORPHANED_HANDLERS` table.
///
/// The generator writes one entry per handler whose operation disappeared from the API
/// description. The table marks where the quarantined, commented-out section of the file
/// begins, and lists what it contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrphanedHandler {
    /// `tool`, `resource`, `resource_template` or `prompt`.
    pub category: &'static str,
    /// Method name of the handler.
    pub name: &'static str,
}
