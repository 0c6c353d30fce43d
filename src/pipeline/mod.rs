//! Orchestrator for one mapping run.
//!
//! A run is three barrier-separated phases:
//!
//! 1. **Catalog wave**: every catalog category plus the marketplace-ids catalog is fetched
//!    and extracted concurrently. The skins task publishes the [`IndexTable`].
//! 2. **Market wave**: the primary market and every regional market are fetched
//!    concurrently, each filtered against the complete `IndexTable` from wave 1.
//! 3. **Write phase**: every mapping that succeeded becomes an [`Artifact`] and is
//!    written in both styles concurrently.
//!
//! A failed dataset only removes its own outputs. Failures are collected per phase,
//! logged, and returned in the [`RunReport`]; they never cancel sibling tasks.

pub mod task_group;

pub use task_group::TaskGroup;

use crate::metrics::RunMetrics;
use crate::models::config::PRIMARY_MARKET_SLUG;
use crate::models::records::{
    Agent, Collectible, Crate, Graffiti, Highlight, Key, Keychain, MarketplaceCatalog, MusicKit,
    Patch, PrimaryMarketEntry, Skin, Sticker,
};
use crate::models::{Category, Dataset, IdentifierMapping, IndexTable, KeyId, MapperConfig, SourceSettings};
use crate::services::catalog::{self, SkinIndexes};
use crate::services::markets::{self, MarketplaceIds};
use crate::services::writer::layout;
use crate::services::{Artifact, FetchError, SourceClient, Style, WriteError, Writer};
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;

/// A failure recorded during a run. None of these abort the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to fetch {dataset}: {source}")]
    Fetch {
        dataset: Dataset,
        #[source]
        source: FetchError,
    },

    #[error("Task for {dataset} aborted: {message}")]
    Task { dataset: Dataset, message: String },

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl PipelineError {
    /// The dataset a fetch-side failure belongs to
    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            PipelineError::Fetch { dataset, .. } | PipelineError::Task { dataset, .. } => {
                Some(dataset)
            }
            PipelineError::Write(_) => None,
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Default)]
pub struct RunReport {
    pub errors: Vec<PipelineError>,
    pub files_written: usize,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result slots of the catalog wave. An absent slot means that dataset failed.
#[derive(Debug, Default)]
pub struct CatalogResults {
    pub def_indexes: Option<Arc<IndexTable>>,
    pub paint_indexes: Option<IdentifierMapping<i64>>,
    pub agents: Option<IdentifierMapping<i64>>,
    pub collectibles: Option<IdentifierMapping<i64>>,
    pub crates: Option<IdentifierMapping<i64>>,
    pub graffiti: Option<IdentifierMapping<String>>,
    pub highlights: Option<IdentifierMapping<String>>,
    pub keychains: Option<IdentifierMapping<i64>>,
    pub keys: Option<IdentifierMapping<KeyId>>,
    pub music_kits: Option<IdentifierMapping<i64>>,
    pub patches: Option<IdentifierMapping<i64>>,
    pub stickers: Option<IdentifierMapping<i64>>,
    pub marketplace: Option<MarketplaceIds>,
}

impl CatalogResults {
    /// The published index table, or an empty one when the skins dataset failed.
    pub fn index_table(&self) -> Arc<IndexTable> {
        self.def_indexes.clone().unwrap_or_default()
    }

    fn absorb(&mut self, output: CatalogOutput) {
        match output {
            CatalogOutput::Indexes(indexes) => {
                self.def_indexes = Some(Arc::new(indexes.def_indexes));
                self.paint_indexes = Some(indexes.paint_indexes);
            }
            CatalogOutput::Agents(ids) => self.agents = Some(ids),
            CatalogOutput::Collectibles(ids) => self.collectibles = Some(ids),
            CatalogOutput::Crates(ids) => self.crates = Some(ids),
            CatalogOutput::Graffiti(ids) => self.graffiti = Some(ids),
            CatalogOutput::Highlights(ids) => self.highlights = Some(ids),
            CatalogOutput::Keychains(ids) => self.keychains = Some(ids),
            CatalogOutput::Keys(ids) => self.keys = Some(ids),
            CatalogOutput::MusicKits(ids) => self.music_kits = Some(ids),
            CatalogOutput::Patches(ids) => self.patches = Some(ids),
            CatalogOutput::Stickers(ids) => self.stickers = Some(ids),
            CatalogOutput::Marketplace(ids) => self.marketplace = Some(ids),
        }
    }
}

/// Result slots of the market wave, regional listings keyed by source slug.
#[derive(Debug, Default)]
pub struct MarketResults {
    pub primary: Option<IdentifierMapping<i64>>,
    pub regional: BTreeMap<String, IdentifierMapping<i64>>,
}

enum CatalogOutput {
    Indexes(SkinIndexes),
    Agents(IdentifierMapping<i64>),
    Collectibles(IdentifierMapping<i64>),
    Crates(IdentifierMapping<i64>),
    Graffiti(IdentifierMapping<String>),
    Highlights(IdentifierMapping<String>),
    Keychains(IdentifierMapping<i64>),
    Keys(IdentifierMapping<KeyId>),
    MusicKits(IdentifierMapping<i64>),
    Patches(IdentifierMapping<i64>),
    Stickers(IdentifierMapping<i64>),
    Marketplace(MarketplaceIds),
}

enum MarketOutput {
    Primary(IdentifierMapping<i64>),
    Regional(String, IdentifierMapping<i64>),
}

type FetchGroup<O> = TaskGroup<Dataset, Result<O, FetchError>>;

/// Spawn one fetch-then-extract unit. Extraction runs inside the task, after the fetch.
fn spawn_fetch<R, O, F>(
    group: &mut FetchGroup<O>,
    client: &SourceClient,
    dataset: Dataset,
    url: String,
    extract: F,
) where
    R: DeserializeOwned + Send + 'static,
    O: Send + 'static,
    F: FnOnce(R) -> O + Send + 'static,
{
    let client = client.clone();
    group.spawn(dataset, async move {
        let records = client.fetch::<R>(&url).await?;
        Ok(extract(records))
    });
}

/// Artifacts staged for the write phase, plus any snapshot failures.
#[derive(Default)]
struct Staging {
    artifacts: Vec<Artifact>,
    errors: Vec<PipelineError>,
}

impl Staging {
    /// Stage one mapping; an absent mapping is skipped without error.
    fn stage<T: Serialize>(&mut self, relative_path: &str, mapping: Option<&IdentifierMapping<T>>) {
        let Some(mapping) = mapping else {
            return;
        };

        match Artifact::from_mapping(relative_path, mapping) {
            Ok(artifact) => self.artifacts.push(artifact),
            Err(err) => self.errors.push(err.into()),
        }
    }
}

/// The mapping pipeline: shared HTTP client, writer, and run counters.
pub struct Pipeline {
    client: SourceClient,
    sources: SourceSettings,
    writer: Writer,
    metrics: RunMetrics,
}

impl Pipeline {
    pub fn new(config: &MapperConfig) -> Result<Self> {
        Ok(Self {
            client: SourceClient::new(&config.sources)?,
            sources: config.sources.clone(),
            writer: Writer::new(&config.output.root),
            metrics: RunMetrics::new(),
        })
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    pub fn writer(&self) -> &Writer {
        &self.writer
    }

    /// Execute the full run: catalog wave, market wave, write phase.
    ///
    /// Only output directory creation can fail the run; every dataset-level failure is
    /// reported in the returned [`RunReport`].
    pub async fn run(&self) -> Result<RunReport> {
        self.writer
            .prepare_directories()
            .context("Failed to prepare output directories")?;

        let (catalog, mut errors) = self.run_catalog_wave().await;
        log_errors("API fetch", &errors);

        let index = catalog.index_table();
        if catalog.def_indexes.is_none() {
            tracing::warn!("Index table unavailable, market listings will not be cross-referenced");
        }

        let (markets, market_errors) = self.run_market_wave(index).await;
        log_errors("market fetch", &market_errors);
        errors.extend(market_errors);

        let staging = self.stage_outputs(&catalog, &markets);
        log_errors("output encoding", &staging.errors);
        errors.extend(staging.errors);

        let (files_written, write_errors) = self.write_outputs(staging.artifacts).await;
        log_errors("file write", &write_errors);
        errors.extend(write_errors);

        tracing::info!(
            "Run complete: {} files written, {} errors",
            files_written,
            errors.len()
        );

        Ok(RunReport {
            errors,
            files_written,
        })
    }

    /// Wave 1: fetch and extract every catalog category and the marketplace-ids catalog.
    pub async fn run_catalog_wave(&self) -> (CatalogResults, Vec<PipelineError>) {
        let mut group: FetchGroup<CatalogOutput> = TaskGroup::new();

        for category in Category::ALL {
            let dataset = Dataset::Catalog(category);
            let url = self.sources.catalog_url(category);
            let client = &self.client;

            match category {
                Category::Skins => spawn_fetch(&mut group, client, dataset, url, |r: Vec<Skin>| {
                    CatalogOutput::Indexes(catalog::extract_skin_indexes(&r))
                }),
                Category::Agents => spawn_fetch(&mut group, client, dataset, url, |r: Vec<Agent>| {
                    CatalogOutput::Agents(catalog::extract_agents(&r))
                }),
                Category::Collectibles => {
                    spawn_fetch(&mut group, client, dataset, url, |r: Vec<Collectible>| {
                        CatalogOutput::Collectibles(catalog::extract_collectibles(&r))
                    })
                }
                Category::Crates => spawn_fetch(&mut group, client, dataset, url, |r: Vec<Crate>| {
                    CatalogOutput::Crates(catalog::extract_crates(&r))
                }),
                Category::Graffiti => {
                    spawn_fetch(&mut group, client, dataset, url, |r: Vec<Graffiti>| {
                        CatalogOutput::Graffiti(catalog::extract_graffiti(&r))
                    })
                }
                Category::Highlights => {
                    spawn_fetch(&mut group, client, dataset, url, |r: Vec<Highlight>| {
                        CatalogOutput::Highlights(catalog::extract_highlights(&r))
                    })
                }
                Category::Keychains => {
                    spawn_fetch(&mut group, client, dataset, url, |r: Vec<Keychain>| {
                        CatalogOutput::Keychains(catalog::extract_keychains(&r))
                    })
                }
                Category::Keys => spawn_fetch(&mut group, client, dataset, url, |r: Vec<Key>| {
                    CatalogOutput::Keys(catalog::extract_keys(&r))
                }),
                Category::MusicKits => {
                    spawn_fetch(&mut group, client, dataset, url, |r: Vec<MusicKit>| {
                        CatalogOutput::MusicKits(catalog::extract_music_kits(&r))
                    })
                }
                Category::Patches => spawn_fetch(&mut group, client, dataset, url, |r: Vec<Patch>| {
                    CatalogOutput::Patches(catalog::extract_patches(&r))
                }),
                Category::Stickers => {
                    spawn_fetch(&mut group, client, dataset, url, |r: Vec<Sticker>| {
                        CatalogOutput::Stickers(catalog::extract_stickers(&r))
                    })
                }
            }
        }

        spawn_fetch(
            &mut group,
            &self.client,
            Dataset::MarketplaceIds,
            self.sources.marketplace_ids_url.clone(),
            |catalog: MarketplaceCatalog| {
                CatalogOutput::Marketplace(markets::extract_marketplace_ids(catalog))
            },
        );

        tracing::info!("Catalog wave started with {} tasks", group.len());

        let mut results = CatalogResults::default();
        let errors = self.settle(group.join_all().await, |output| results.absorb(output));

        tracing::info!("Catalog wave finished with {} failures", errors.len());
        (results, errors)
    }

    /// Wave 2: fetch the primary and regional market listings, filtered by `index`.
    ///
    /// `index` must be the complete table from wave 1; it is only read.
    pub async fn run_market_wave(
        &self,
        index: Arc<IndexTable>,
    ) -> (MarketResults, Vec<PipelineError>) {
        let mut group: FetchGroup<MarketOutput> = TaskGroup::new();

        let primary_index = Arc::clone(&index);
        spawn_fetch(
            &mut group,
            &self.client,
            Dataset::PrimaryMarket,
            self.sources.market_url(PRIMARY_MARKET_SLUG),
            move |listing: HashMap<String, PrimaryMarketEntry>| {
                MarketOutput::Primary(markets::extract_primary_market_ids(listing, &primary_index))
            },
        );

        for slug in self.sources.regional_marketplaces.keys() {
            let regional_index = Arc::clone(&index);
            let market = slug.clone();
            spawn_fetch(
                &mut group,
                &self.client,
                Dataset::RegionalMarket(slug.clone()),
                self.sources.market_url(slug),
                move |listing: HashMap<String, i64>| {
                    let ids = markets::extract_regional_market_ids(listing, &regional_index);
                    MarketOutput::Regional(market, ids)
                },
            );
        }

        tracing::info!(
            "Market wave started with {} tasks against {} indexed weapons",
            group.len(),
            index.len()
        );

        let mut results = MarketResults::default();
        let errors = self.settle(group.join_all().await, |output| match output {
            MarketOutput::Primary(ids) => results.primary = Some(ids),
            MarketOutput::Regional(slug, ids) => {
                results.regional.insert(slug, ids);
            }
        });

        tracing::info!("Market wave finished with {} failures", errors.len());
        (results, errors)
    }

    /// Write every artifact in both styles concurrently.
    ///
    /// # Returns
    /// The number of files written and the failures
    pub async fn write_outputs(&self, artifacts: Vec<Artifact>) -> (usize, Vec<PipelineError>) {
        let mut group = TaskGroup::new();

        for artifact in artifacts {
            let artifact = Arc::new(artifact);
            for style in Style::ALL {
                let writer = self.writer.clone();
                let artifact = Arc::clone(&artifact);
                let path = self.writer.path_for(style, artifact.relative_path());
                group.spawn_blocking(path, move || writer.write(&artifact, style));
            }
        }

        tracing::debug!("Write phase started with {} tasks", group.len());

        let mut files_written = 0;
        let mut errors: Vec<PipelineError> = Vec::new();
        for (path, joined) in group.join_all().await {
            match joined {
                Ok(Ok(_)) => {
                    files_written += 1;
                    self.metrics.record_file_written();
                }
                Ok(Err(err)) => {
                    self.metrics.record_file_failed();
                    errors.push(err.into());
                }
                Err(err) => {
                    self.metrics.record_file_failed();
                    errors.push(
                        WriteError::Task {
                            path,
                            message: err.to_string(),
                        }
                        .into(),
                    );
                }
            }
        }

        (files_written, errors)
    }

    /// Turn every present result slot into an artifact at its output location.
    fn stage_outputs(&self, catalog: &CatalogResults, markets: &MarketResults) -> Staging {
        let mut staging = Staging::default();

        staging.stage(
            layout::DEF_INDEXES,
            catalog.def_indexes.as_deref().map(IndexTable::as_mapping),
        );
        staging.stage(layout::PAINT_INDEXES, catalog.paint_indexes.as_ref());

        staging.stage(layout::AGENTS, catalog.agents.as_ref());
        staging.stage(layout::COLLECTIBLES, catalog.collectibles.as_ref());
        staging.stage(layout::CRATES, catalog.crates.as_ref());
        staging.stage(layout::GRAFFITI, catalog.graffiti.as_ref());
        staging.stage(layout::HIGHLIGHTS, catalog.highlights.as_ref());
        staging.stage(layout::KEYCHAINS, catalog.keychains.as_ref());
        staging.stage(layout::KEYS, catalog.keys.as_ref());
        staging.stage(layout::MUSIC_KITS, catalog.music_kits.as_ref());
        staging.stage(layout::PATCHES, catalog.patches.as_ref());
        staging.stage(layout::STICKERS, catalog.stickers.as_ref());

        staging.stage(layout::STEAM_MARKET, markets.primary.as_ref());
        for (slug, stem) in &self.sources.regional_marketplaces {
            staging.stage(&layout::regional_market(stem), markets.regional.get(slug));
        }

        if let Some(ids) = &catalog.marketplace {
            staging.stage(layout::BUFF_MARKET, Some(&ids.buff_market));
            staging.stage(layout::BUFF163_STICKERS, Some(&ids.stickers));
            staging.stage(layout::BUFF163_PAINTSEED_GROUPS, Some(&ids.paintseed_groups));
            staging.stage(layout::BUFF163_PHASES, Some(&ids.phases));
            staging.stage(layout::BUFF163_TAGS, Some(&ids.tags));
            staging.stage(layout::BUFF163_PATCHES, Some(&ids.patches));
            staging.stage(layout::BUFF163_PATTERNS, Some(&ids.patterns));
        }

        staging
    }

    /// Route successful outputs to `accept` and convert failures into pipeline errors.
    fn settle<O>(
        &self,
        outcomes: Vec<(Dataset, Result<Result<O, FetchError>, JoinError>)>,
        mut accept: impl FnMut(O),
    ) -> Vec<PipelineError> {
        let mut errors = Vec::new();

        for (dataset, joined) in outcomes {
            match joined {
                Ok(Ok(output)) => {
                    tracing::debug!("Dataset {} extracted", dataset);
                    self.metrics.record_dataset_fetched();
                    accept(output);
                }
                Ok(Err(source)) => {
                    self.metrics.record_dataset_failed();
                    errors.push(PipelineError::Fetch { dataset, source });
                }
                Err(err) => {
                    self.metrics.record_dataset_failed();
                    errors.push(PipelineError::Task {
                        dataset,
                        message: err.to_string(),
                    });
                }
            }
        }

        errors
    }
}

fn log_errors(phase: &str, errors: &[PipelineError]) {
    for err in errors {
        tracing::error!("Error during {}: {}", phase, err);
    }
}
