//! Persistence gateways for the roadmap tree.
//!
//! # Responsibility
//! - Define the whole-tree load/save contract (`gateway`).
//! - Convert between the tree and its flat wire records (`records`).
//! - Ship SQLite and JSON file backends.
//!
//! # Invariants
//! - Gateways never hold business rules; derived values are recomputed by
//!   the constraint engine on load.
//! - Read paths reject invalid persisted state instead of masking it, except
//!   for dates, which degrade to unset.

pub mod gateway;
pub mod json_gateway;
pub mod records;
pub mod sqlite_gateway;

pub use gateway::{GatewayError, GatewayResult, PersistenceGateway};
pub use json_gateway::JsonFileGateway;
pub use records::{ProjectRecord, RoadmapRecords, SubtaskRecord, TaskRecord};
pub use sqlite_gateway::SqliteRoadmapGateway;
