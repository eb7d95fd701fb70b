//! Persistent variable index: per-file extraction results, scope-filtered
//! lookup, and the on-disk encoding contract.

pub mod codec;
pub mod persistence;
pub mod store;

pub use codec::{ENTRY_SEP, FIELD_SEP, decode_entries, encode_entries};
pub use persistence::IndexPersistence;
pub use store::VariableIndex;
