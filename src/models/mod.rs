//! Data models for the item mapper.
//!
//! This module contains all the core data structures used throughout the pipeline:
//! - [`Category`] / [`Dataset`]: identities of the remote datasets and their endpoints
//! - [`records`]: raw catalog records as decoded from the source JSON
//! - [`IdentifierMapping`]: the canonical output unit (unique name → identifier)
//! - [`IndexTable`]: the weapon name → weapon id table shared read-only with market extraction
//! - [`MapperConfig`]: source URLs, output root, and logging settings loaded from `ItemMapper.yaml`
//!
//! # Architecture Note
//!
//! Records are owned by the extractor that consumes them and dropped once the mapping is
//! built. Mappings live for the duration of one run and are discarded after the writer
//! finishes; nothing is cached between runs.

pub mod config;
pub mod dataset;
pub mod mapping;
pub mod records;

pub use config::{LoggingSettings, MapperConfig, OutputSettings, SourceSettings};
pub use dataset::{Category, Dataset};
pub use mapping::{GroupedIds, IdentifierMapping, IndexTable, KeyId, PatternSeeds};
