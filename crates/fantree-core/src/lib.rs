//! Core types for fantree.
//!
//! This crate provides the concurrency primitives and shared types used by
//! the file-tree engine: the fan-in [`Counter`], the per-facade
//! [`OperationTracker`], the error vocabulary and the engine configuration.

mod config;
mod counter;
mod error;
mod report;
mod tracker;

pub use config::{EngineConfig, EngineConfigBuilder, EngineConfigBuilderError};
pub use counter::{Counter, CounterGuard};
pub use error::{ErrorKind, FsError, FsOp, Result};
pub use report::TreeReport;
pub use tracker::{OperationGuard, OperationTracker};
