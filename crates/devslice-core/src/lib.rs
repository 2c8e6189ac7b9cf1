//! Resolution and validation engine for devslice resource slices.
//!
//! This crate flattens mixin references into resolved devices and counter
//! sets (`resolve`), builds the `consumesCapacityFrom` reference graph and
//! detects cycles in it, validates slices on create and update
//! (`SliceValidator`), and applies the admission steps that depend on the
//! partitionable-devices feature gate (`SliceStrategy`).

pub mod admission;
pub mod config;
pub mod cycles;
pub mod graph;
pub mod meta;
pub mod mixin;
pub mod resolve;
pub mod validation;

pub use admission::{
    prepare_for_create, prepare_for_update, uses_partitionable_devices, FeatureGates,
    SliceStrategy,
};
pub use config::Config;
pub use cycles::{find_cycles, CyclePath};
pub use graph::{CapacityConsumer, ReferenceGraph};
pub use meta::{BasicMetaValidator, MetaValidator};
pub use mixin::MixinTable;
pub use resolve::{resolve, resolve_checked, verify_resolved};
pub use validation::{validate_create, validate_update, SliceValidator};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("resource slice error: {0}")]
    Slice(#[from] devslice_schema::SliceError),
    #[error("validation failed: {0}")]
    Invalid(#[from] devslice_schema::ValidationError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
}
