//! Pointer-driven bar editing on the timeline.
//!
//! # Responsibility
//! - Track one move/resize gesture from pointer-down to release.
//! - Convert pointer movement into whole-day interval edits.
//! - Rate-limit store updates while the pointer moves.
//!
//! # Invariants
//! - At most one gesture is active at a time.
//! - Release always applies the final computed interval.
//! - The clock is passed in by the caller; nothing here reads it.

pub mod config;
pub mod controller;

pub use config::DragConfig;
pub use controller::{DragController, DragError, DragMode, DragResult, DragState};
