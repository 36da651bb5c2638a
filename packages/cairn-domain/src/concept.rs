use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// A deduplicated entity node in the knowledge graph. Concepts are created once, on the first
/// unmatched candidate, and then accumulate evidence and usage signal; this core never deletes
/// them.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Concept {
	pub concept_id: Uuid,
	pub graph_id: String,
	pub label: String,
	pub embedding: Vec<f32>,
	pub query_count: i64,
	pub relevance_sum: f64,
	pub fitness_score: f64,
	/// Privileged, externally-set adjustment. Never mutated by this core.
	pub manual_bias: f64,
	pub final_score: f64,
	pub confidence: f32,
	pub flagged_for_review: bool,
	pub created_by: String,
	pub created_at: OffsetDateTime,
}

/// A verbatim quote evidencing that a concept occurs in a source document. Holds only the
/// reference fields needed to retrieve the source text, never the text itself.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Instance {
	pub instance_id: Uuid,
	pub concept_id: Uuid,
	pub quote: String,
	pub source_ref: Value,
	pub start_offset: usize,
	pub end_offset: usize,
	pub sentence_index: usize,
	pub created_at: OffsetDateTime,
}

/// Directed edge between two concepts. Edges live in a flat list keyed by
/// `(from_id, to_id, relation)`; duplicates keep the maximum confidence seen.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Relationship {
	pub from_id: Uuid,
	pub to_id: Uuid,
	pub relation: String,
	pub confidence: f32,
}

pub fn normalize_label(input: &str) -> String {
	input.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// `relevance_sum / query_count`, clamped so bounded relevance inputs always yield a value in
/// [0, 1]. A concept that has never been queried scores 0, never NaN.
pub fn fitness_score(relevance_sum: f64, query_count: i64) -> f64 {
	if query_count <= 0 {
		return 0.0;
	}

	(relevance_sum / query_count as f64).clamp(0.0, 1.0)
}

pub fn final_score(fitness_score: f64, manual_bias: f64) -> f64 {
	fitness_score + manual_bias
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fitness_is_zero_without_queries() {
		assert_eq!(fitness_score(0.0, 0), 0.0);
		assert_eq!(fitness_score(3.5, 0), 0.0);
		assert_eq!(fitness_score(0.0, -1), 0.0);
	}

	#[test]
	fn fitness_is_mean_relevance_clamped_to_unit_interval() {
		assert_eq!(fitness_score(3.0, 10), 0.3);
		assert_eq!(fitness_score(12.0, 10), 1.0);
		assert_eq!(fitness_score(-1.0, 10), 0.0);
		assert!(fitness_score(0.7, 2).is_finite());
	}

	#[test]
	fn final_score_equals_fitness_at_zero_bias() {
		assert_eq!(final_score(0.3, 0.0), 0.3);
		assert_eq!(final_score(0.3, 0.5), 0.8);
	}

	#[test]
	fn labels_normalize_whitespace_and_case() {
		assert_eq!(normalize_label("  Agile   Governance "), "agile governance");
	}
}
