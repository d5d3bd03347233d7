// src/scanner/mod.rs
// =============================================================================
// Finding links in the files of a working copy.
// =============================================================================

mod links;

pub use links::{FileFilter, LinkScanner};
