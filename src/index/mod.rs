//! Background index building over a scan root.
//!
//! A scan walks the tree breadth-first and grows an [`IndexSnapshot`] one
//! directory at a time, so searches against a live scan see a valid prefix
//! of the final index. Scans are cooperative: cancellation is honored at
//! directory granularity and leaves the snapshot exactly as populated.

mod builder;
mod data;
mod walk;

pub use builder::{IndexBuilder, ScanHandle, ScanState};
pub use data::{IndexSnapshot, ScanWarning};
pub use walk::{walk_into, WalkContext, WalkOutcome};
