//! Caption uniqueness checks.

use term_registry_core::{default_caption, SessionHandle, SessionMetadata};

/// True iff no entry uses `caption` (exact match).
pub fn is_caption_available<'a, I>(entries: I, caption: &str) -> bool
where
    I: IntoIterator<Item = &'a SessionMetadata>,
{
    !entries.into_iter().any(|meta| meta.caption == caption)
}

/// Handle of the first entry, in iteration order, using `caption`.
pub fn handle_for_caption<'a, I>(entries: I, caption: &str) -> Option<&'a SessionHandle>
where
    I: IntoIterator<Item = &'a SessionMetadata>,
{
    entries
        .into_iter()
        .find(|meta| meta.caption == caption)
        .map(|meta| &meta.handle)
}

/// First free `"Terminal <n>"` caption with `n >= sequence`.
///
/// `None` if every such caption is taken.
pub fn free_default_caption<'a, I>(entries: I, sequence: u32) -> Option<String>
where
    I: IntoIterator<Item = &'a SessionMetadata> + Clone,
{
    (sequence..=u32::MAX)
        .map(default_caption)
        .find(|candidate| is_caption_available(entries.clone(), candidate))
}
