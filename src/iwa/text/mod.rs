//! Text Storage Handling for iWork Documents
//!
//! Text storages are collected as [`TextBlock`]s while the index is parsed
//! and emitted once the document structure is known. Placeholder text is
//! masked in place before emission; see [`redact`].

pub mod block;
pub mod redact;

pub use block::{TextBlock, TextMarker};
pub use redact::{REDACTION_CHAR, redact_placeholders};
