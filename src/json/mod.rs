//! Purpose: JSON text boundary for the loader.
//! Exports: `parse` module with decode helpers and failure classification.
//! Role: Single seam for turning JSON text into `Value` or typed config.
//! Invariants: Every JSON decode in the crate goes through this module.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub mod parse;
