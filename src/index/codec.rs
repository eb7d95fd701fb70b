//! Wire encoding for one variable's entry list.
//!
//! This is a contract shared with any external reader of the persisted
//! index: entries join on `"|||"`, fields join on U+001F (unit separator),
//! three fields per entry (context, raw value, comment; comment possibly
//! empty). Decoding splits with a field-count limit of 3 so a comment
//! containing separator-adjacent text survives.

use crate::types::VariableEntry;

pub const FIELD_SEP: char = '\u{1F}';
pub const ENTRY_SEP: &str = "|||";

/// Encode an entry list into the persisted blob form.
pub fn encode_entries(entries: &[VariableEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}{FIELD_SEP}{}{FIELD_SEP}{}", e.context, e.value, e.comment))
        .collect::<Vec<_>>()
        .join(ENTRY_SEP)
}

/// Decode a persisted blob back into entries.
///
/// Tolerant: blank segments are skipped, an entry with fewer than two
/// fields is skipped, a missing comment field decodes as empty.
pub fn decode_entries(blob: &str) -> Vec<VariableEntry> {
    blob.split(ENTRY_SEP)
        .filter(|seg| !seg.trim().is_empty())
        .filter_map(|seg| {
            let mut fields = seg.splitn(3, FIELD_SEP);
            let context = fields.next()?;
            let value = fields.next()?;
            let comment = fields.next().unwrap_or("");
            Some(VariableEntry::new(context, value, comment))
        })
        .collect()
}
