//! Hash-anchored line editing.
//!
//! An agent addresses lines as `"<line>:<fingerprint>"` references taken from
//! its last read of a file. Before any line is touched the reference is checked
//! against the current content, so edits computed from a stale view fail
//! instead of landing on the wrong line.
//!
//! - **`hash`**: per-line fingerprints
//! - **`reference`**: reference parsing and resolution
//! - **`engine`**: atomic batches of line edits
//! - **`render`**: anchored `read_file` output

pub mod engine;
mod error;
pub mod hash;
pub mod reference;
pub mod render;
mod text;

pub use engine::{AppliedEdit, EditBatchResult, EditKind, EditOperation, WireEdit, apply};
pub use error::{EditError, StaleReason, StaleReference};
pub use hash::{FINGERPRINT_LEN, Fingerprint, fingerprint};
pub use reference::{LineReference, resolve};
pub use render::{anchors, render_anchored};
pub use text::split_lines;
