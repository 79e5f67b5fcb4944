//! Roadmap domain model.
//!
//! # Responsibility
//! - Define the Project -> Task -> Subtask tree and its value types.
//! - Keep one explicit Unset representation for dates.
//!
//! # Invariants
//! - Every node is identified by a stable `NodeId`.
//! - Ownership is strictly tree-shaped; nodes carry no parent pointers.

pub mod interval;
pub mod node;
pub mod patch;
pub mod tree;
