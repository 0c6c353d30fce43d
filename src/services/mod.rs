//! Services module - the stateless units the pipeline schedules.
//!
//! Nothing in here spawns tasks or holds shared state; the [`crate::pipeline`] owns all
//! concurrency and decides what runs when.
//!
//! # Components
//!
//! - [`SourceClient`]: one HTTP GET per dataset, content-encoding dispatch
//!   (gzip, deflate, br, zstd, identity) and JSON decode into typed records.
//!   Every failure mode surfaces as a single [`FetchError`].
//!
//! - [`catalog`]: the eleven category extractors. Each applies a parse step (direct
//!   def index or composite-ID suffix) and a category-specific filter step.
//!
//! - [`markets`]: primary and regional market extractors, cross-referenced against the
//!   [`IndexTable`](crate::models::IndexTable), plus the marketplace-ids catalog split.
//!
//! - [`Writer`]: publishes an [`Artifact`] as compact and four-space-indented JSON with
//!   sorted keys under the `mini/` and `pretty/` trees.

pub mod catalog;
pub mod markets;
pub mod source;
pub mod writer;

pub use catalog::SkinIndexes;
pub use markets::MarketplaceIds;
pub use source::{FetchError, SourceClient};
pub use writer::{Artifact, Style, WriteError, Writer};
