//! Flutter bridge crate for the LifePlan roadmap core.

pub mod api;
