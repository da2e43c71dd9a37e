//! Typed entity paths for a small library domain.
//!
//! These are the hand-written counterpart of generated query types and double as the built-in
//! schema of the `entipath` CLI.

pub mod library;
