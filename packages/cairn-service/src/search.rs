use uuid::Uuid;

use crate::{Error, Result, Service};
use cairn_domain::{boosted_score, cmp_f32_desc, cmp_f64_desc};
use cairn_storage::{Caller, VectorHit};

#[derive(Clone, Debug)]
pub struct SearchRequest {
	pub graph_id: String,
	pub embedding: Vec<f32>,
	/// Defaults to the configured `search.top_k`.
	pub top_k: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct SearchItem {
	pub concept_id: Uuid,
	pub label: String,
	pub raw_score: f32,
	pub final_score: f64,
	pub boosted_score: f64,
}

/// Re-ranks raw similarity hits by blending in the persisted final score:
/// `boosted = raw * max(0, 1 + final_score)`, descending; ties break by raw score, then by
/// concept id. Pure over already-fetched data, parallelizable across queries.
pub fn rank_hits(hits: Vec<VectorHit>) -> Vec<SearchItem> {
	let mut items = hits
		.into_iter()
		.map(|hit| SearchItem {
			concept_id: hit.concept_id,
			label: hit.label,
			raw_score: hit.raw_score,
			final_score: hit.final_score,
			boosted_score: boosted_score(hit.raw_score, hit.final_score),
		})
		.collect::<Vec<_>>();

	items.sort_by(|left, right| {
		cmp_f64_desc(left.boosted_score, right.boosted_score)
			.then_with(|| cmp_f32_desc(left.raw_score, right.raw_score))
			.then_with(|| left.concept_id.cmp(&right.concept_id))
	});

	items
}

impl Service {
	/// Vector search over one graph, boosted by accumulated fitness. Every returned item counts
	/// as a query hit: the raw score (clamped to [0, 1]) enters the scoring queue as that hit's
	/// relevance, to be flushed later outside this call.
	pub async fn search(&self, caller: &Caller, request: SearchRequest) -> Result<Vec<SearchItem>> {
		let expected = self.cfg.providers.embedding.dimensions as usize;

		if request.embedding.len() != expected {
			return Err(Error::Config {
				message: format!(
					"Query embedding dimension {} does not match the active profile dimension {expected}.",
					request.embedding.len()
				),
			});
		}

		let hits = self
			.store
			.query_by_vector(
				caller,
				&request.graph_id,
				&request.embedding,
				self.cfg.search.candidate_k,
			)
			.await?;
		let mut ranked = rank_hits(hits);

		ranked.truncate(request.top_k.unwrap_or(self.cfg.search.top_k));

		for item in &ranked {
			self.scores.record_hit(item.concept_id, f64::from(item.raw_score)).await?;
		}

		Ok(ranked)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hit(concept_id: Uuid, raw_score: f32, final_score: f64) -> VectorHit {
		VectorHit { concept_id, label: concept_id.to_string(), raw_score, final_score }
	}

	#[test]
	fn boost_blends_fitness_and_bias_into_the_ranking() {
		// raw 0.9 at final 0.8 boosts to 1.62 and outranks a closer raw match.
		let boosted = Uuid::from_u128(1);
		let raw_only = Uuid::from_u128(2);
		let ranked = rank_hits(vec![
			hit(raw_only, 0.95, 0.0),
			hit(boosted, 0.9, 0.8),
		]);

		assert_eq!(ranked[0].concept_id, boosted);
		assert!((ranked[0].boosted_score - 1.62).abs() < 1e-6);
		assert_eq!(ranked[1].concept_id, raw_only);
	}

	#[test]
	fn very_negative_bias_floors_at_zero_instead_of_inverting() {
		let poisoned = Uuid::from_u128(1);
		let neutral = Uuid::from_u128(2);
		let ranked = rank_hits(vec![
			hit(poisoned, 0.99, -5.0),
			hit(neutral, 0.2, 0.0),
		]);

		assert_eq!(ranked[0].concept_id, neutral);
		assert_eq!(ranked[1].boosted_score, 0.0);
		assert!(ranked.iter().all(|item| item.boosted_score >= 0.0));
	}

	#[test]
	fn ties_break_by_raw_score_then_concept_id() {
		let id_a = Uuid::from_u128(1);
		let id_b = Uuid::from_u128(2);
		let id_c = Uuid::from_u128(3);
		// Equal boosted scores: 0.8 * 1.0 and 0.4 * 2.0.
		let ranked = rank_hits(vec![
			hit(id_c, 0.4, 1.0),
			hit(id_b, 0.8, 0.0),
			hit(id_a, 0.8, 0.0),
		]);

		assert_eq!(ranked[0].concept_id, id_a);
		assert_eq!(ranked[1].concept_id, id_b);
		assert_eq!(ranked[2].concept_id, id_c);
	}
}
