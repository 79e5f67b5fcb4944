//! Roadmap use-case services.
//!
//! # Responsibility
//! - Own the live tree and expose the mutation API (`tree_store`).
//! - Persist committed snapshots off the caller's thread (`save_worker`).
//!
//! # Invariants
//! - UI/FFI layers mutate the tree only through `TreeStore`.

pub mod save_worker;
pub mod tree_store;

pub use tree_store::{Mutation, ReorderScope, StoreError, StoreResult, TreeStore};
