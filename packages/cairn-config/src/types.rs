use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub graph: Graph,
	pub resolution: Resolution,
	pub scoring: Scoring,
	pub search: Search,
	pub providers: Providers,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Graph {
	/// Active embedding profile label, e.g. "text-embedding-3-large@3072". Candidates embedded
	/// under a different profile must never enter resolution.
	pub embedding_profile: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Resolution {
	/// Minimum cosine similarity for a candidate to merge into an existing concept.
	pub merge_threshold: f32,
	/// Candidates extracted below this confidence still resolve, but new concepts are flagged
	/// for review.
	pub review_confidence: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Scoring {
	pub flush_max_pending: usize,
	pub flush_interval_secs: u64,
	pub channel_capacity: usize,
	pub flush_max_attempts: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Search {
	pub top_k: usize,
	pub candidate_k: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm_extractor: LlmProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}
