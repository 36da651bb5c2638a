//! Concept resolution over a streaming knowledge graph: candidates extracted from source chunks
//! are merged into existing concepts or created as new ones, evidence is linked back to its
//! source spans, and query usage feeds a fitness score that biases later searches.

pub mod error;
pub mod ingest;
pub mod matcher;
pub mod resolve;
pub mod scoring;
pub mod search;

mod evidence;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;
use uuid::Uuid;

pub use error::{Error, Result};
pub use ingest::{IngestReport, IngestRequest, ResolvedCandidate, SourceChunk};
pub use matcher::ConceptMatch;
pub use resolve::{Decision, Resolution};
pub use scoring::{Clock, FlushPolicy, Hit, ScoreQueue, SystemClock};
pub use search::{SearchItem, SearchRequest, rank_hits};

use cairn_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use cairn_providers::{embedding, extractor};
use cairn_storage::{Caller, GraphStore};
use resolve::GraphLocks;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait ExtractorProvider
where
	Self: Send + Sync,
{
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub extractor: Arc<dyn ExtractorProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, extractor: Arc<dyn ExtractorProvider>) -> Self {
		Self { embedding, extractor }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), extractor: provider }
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}
impl ExtractorProvider for DefaultProviders {
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		Box::pin(extractor::extract(cfg, messages))
	}
}

pub struct Service {
	pub cfg: Config,
	pub store: Arc<dyn GraphStore>,
	pub providers: Providers,
	pub(crate) locks: GraphLocks,
	pub(crate) scores: ScoreQueue,
}
impl Service {
	pub fn new(cfg: Config, store: Arc<dyn GraphStore>) -> Self {
		Self::with_providers(cfg, store, Providers::default())
	}

	pub fn with_providers(cfg: Config, store: Arc<dyn GraphStore>, providers: Providers) -> Self {
		let scores = ScoreQueue::spawn(
			store.clone(),
			Caller::new("cairn-scoring"),
			FlushPolicy::from_config(&cfg.scoring),
			Arc::new(SystemClock),
			cfg.scoring.channel_capacity,
		);

		Self { cfg, store, providers, locks: GraphLocks::default(), scores }
	}

	/// Records one query hit against a concept outside of search, e.g. when a caller follows a
	/// returned concept into its evidence.
	pub async fn record_hit(&self, concept_id: Uuid, relevance: f64) -> Result<()> {
		self.scores.record_hit(concept_id, relevance).await
	}

	/// Drains and flushes the scoring queue, then stops its consumer. Pending deltas are flushed
	/// before this returns.
	pub async fn shutdown(self) -> Result<()> {
		self.scores.shutdown().await
	}
}
