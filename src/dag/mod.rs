// src/dag/mod.rs

//! Graph checks over task dependencies.
//!
//! The engine keeps its own index-based adjacency lists; this module only
//! builds a throwaway petgraph view to validate them.

pub mod validate;

pub use validate::{ensure_acyclic, find_cycle};
