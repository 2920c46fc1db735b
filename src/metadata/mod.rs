//! Metadata extraction for device-control files.
//!
//! Two sources feed the catalog: explicit `# Key: value` comment headers
//! inside the file, and a fallback heuristic over filename and directory
//! conventions. Header data always wins; guessed records carry
//! `is_guessed = true` until a user confirms and writes them back.

pub mod guess;
pub mod header;
pub mod vocab;

pub use guess::guess_metadata;
pub use header::{insert_header, parse_header};
