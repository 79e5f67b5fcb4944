//! Roadmap constraint engine.
//!
//! # Responsibility
//! - Interval arithmetic (`interval`).
//! - Upward/downward date propagation and aggregate rollups (`constraint`).
//! - Dense sibling ordering (`order`).
//!
//! # Invariants
//! - Engine functions are pure over the node values they are handed; they
//!   never log, persist, or read the clock.

pub mod constraint;
pub mod interval;
pub mod order;

pub use constraint::{Direction, Propagation};
