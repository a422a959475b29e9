//! Purpose: Load loosely-typed dynamic data into strictly-typed values.
//! Exports: `api` (public surface), `core` (engine, types, routines), `json` (text boundary).
//! Role: Library crate; `api` is the stable entry point, `core` is public for custom handlers.
//! Invariants: Loading is pure in-memory transformation with no global state.
//! Invariants: Caller input and type descriptors are only borrowed.
pub mod api;
pub mod core;
pub mod json;
