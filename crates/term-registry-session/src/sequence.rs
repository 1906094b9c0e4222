//! Sequence number allocation.

use term_registry_core::{SessionMetadata, SEQUENCE_NO_TERMINAL};

/// Next sequence number: one above the highest ever seen.
///
/// `high_water` is the largest sequence the caller has already handed out
/// or tracked, so numbers freed by removal are never reused. Returns `None`
/// once `u32::MAX` has been used.
pub fn next_sequence<'a, I>(entries: I, high_water: u32) -> Option<u32>
where
    I: IntoIterator<Item = &'a SessionMetadata>,
{
    entries
        .into_iter()
        .map(|meta| meta.sequence)
        .fold(SEQUENCE_NO_TERMINAL.max(high_water), u32::max)
        .checked_add(1)
}
