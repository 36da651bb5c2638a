//! Test fixtures shared across the workspace: a fault-injecting store wrapper, deterministic
//! embedding helpers, and a ready-to-edit config.

use std::sync::atomic::{AtomicU32, Ordering};

use serde_json::Map;
use uuid::Uuid;

use cairn_config::{
	Config, EmbeddingProviderConfig, Graph, LlmProviderConfig, Providers, Resolution, Scoring,
	Search, Service,
};
use cairn_domain::{Concept, Instance, Relationship};
use cairn_storage::{
	BoxFuture, Caller, Error, FitnessDelta, GraphStore, Result, RosterEntry, VectorHit,
};

/// Wraps a real store and fails a configured number of leading calls, so retry paths can be
/// exercised against otherwise-correct storage.
pub struct FlakyStore<S> {
	inner: S,
	failing_flushes: AtomicU32,
	conflicting_creates: AtomicU32,
}
impl<S> FlakyStore<S>
where
	S: GraphStore,
{
	pub fn new(inner: S) -> Self {
		Self { inner, failing_flushes: AtomicU32::new(0), conflicting_creates: AtomicU32::new(0) }
	}

	/// The first `count` calls to `batch_update_fitness` return [`Error::Unavailable`].
	pub fn fail_next_flushes(&self, count: u32) {
		self.failing_flushes.store(count, Ordering::SeqCst);
	}

	/// The first `count` calls to `upsert_concept` return [`Error::Conflict`] without writing.
	pub fn conflict_next_creates(&self, count: u32) {
		self.conflicting_creates.store(count, Ordering::SeqCst);
	}

	pub fn inner(&self) -> &S {
		&self.inner
	}

	fn take_fault(counter: &AtomicU32) -> bool {
		counter
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
				(remaining > 0).then(|| remaining - 1)
			})
			.is_ok()
	}
}
impl<S> GraphStore for FlakyStore<S>
where
	S: GraphStore,
{
	fn upsert_concept<'a>(
		&'a self,
		caller: &'a Caller,
		concept: &'a Concept,
	) -> BoxFuture<'a, Result<()>> {
		if Self::take_fault(&self.conflicting_creates) {
			return Box::pin(async {
				Err(Error::Conflict("Injected concept write conflict.".to_string()))
			});
		}

		self.inner.upsert_concept(caller, concept)
	}

	fn create_instance<'a>(
		&'a self,
		caller: &'a Caller,
		instance: &'a Instance,
	) -> BoxFuture<'a, Result<()>> {
		self.inner.create_instance(caller, instance)
	}

	fn upsert_relationship<'a>(
		&'a self,
		caller: &'a Caller,
		graph_id: &'a str,
		relationship: &'a Relationship,
	) -> BoxFuture<'a, Result<()>> {
		self.inner.upsert_relationship(caller, graph_id, relationship)
	}

	fn batch_update_fitness<'a>(
		&'a self,
		caller: &'a Caller,
		deltas: &'a [FitnessDelta],
	) -> BoxFuture<'a, Result<()>> {
		if Self::take_fault(&self.failing_flushes) {
			return Box::pin(async {
				Err(Error::Unavailable("Injected flush outage.".to_string()))
			});
		}

		self.inner.batch_update_fitness(caller, deltas)
	}

	fn query_by_vector<'a>(
		&'a self,
		caller: &'a Caller,
		graph_id: &'a str,
		embedding: &'a [f32],
		k: usize,
	) -> BoxFuture<'a, Result<Vec<VectorHit>>> {
		self.inner.query_by_vector(caller, graph_id, embedding, k)
	}

	fn concept_roster<'a>(
		&'a self,
		caller: &'a Caller,
		graph_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<RosterEntry>>> {
		self.inner.concept_roster(caller, graph_id)
	}

	fn get_concept<'a>(
		&'a self,
		caller: &'a Caller,
		concept_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Concept>>> {
		self.inner.get_concept(caller, concept_id)
	}
}

/// A unit basis vector: orthogonal to every other axis, so cosine similarities are exact.
pub fn axis_vector(dimensions: usize, axis: usize) -> Vec<f32> {
	let mut vector = vec![0.0; dimensions];

	vector[axis] = 1.0;

	vector
}

/// A unit vector whose cosine similarity against `axis_vector(dimensions, axis)` is exactly
/// `similarity`. The remainder lands on the next axis.
pub fn vector_near_axis(dimensions: usize, axis: usize, similarity: f32) -> Vec<f32> {
	let mut vector = vec![0.0; dimensions];

	vector[axis] = similarity;
	vector[(axis + 1) % dimensions] = (1.0 - similarity * similarity).max(0.0).sqrt();

	vector
}

/// A complete valid config with small, test-friendly numbers. Tests edit the fields they care
/// about.
pub fn test_config(dimensions: u32) -> Config {
	Config {
		service: Service { log_level: "debug".to_string() },
		graph: Graph { embedding_profile: format!("test-embedding@{dimensions}") },
		resolution: Resolution { merge_threshold: 0.75, review_confidence: 0.5 },
		scoring: Scoring {
			flush_max_pending: 100,
			flush_interval_secs: 10,
			channel_capacity: 1_024,
			flush_max_attempts: 3,
		},
		search: Search { top_k: 10, candidate_k: 50 },
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:0".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test-embedding".to_string(),
				dimensions,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			llm_extractor: LlmProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:0".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "test-llm".to_string(),
				temperature: 0.0,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
	}
}
