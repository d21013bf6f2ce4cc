//! Shared infrastructure utilities for Tether.
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename)
//! - **`diff`**: Compact line diffs and stats

pub mod atomic_write;
pub mod diff;

pub use atomic_write::{AtomicWriteOptions, FileSyncPolicy, atomic_write, atomic_write_with_options};
pub use diff::{DiffStats, format_compact_diff};
