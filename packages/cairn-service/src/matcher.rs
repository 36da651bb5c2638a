use uuid::Uuid;

use crate::{Error, Result};
use cairn_domain::{cmp_f32_desc, cmp_f64_desc, cosine_similarity};
use cairn_storage::RosterEntry;

#[derive(Clone, Debug)]
pub struct ConceptMatch {
	pub concept_id: Uuid,
	pub similarity: f32,
	pub fitness_score: f64,
}

/// O(N·D) cosine scan of a candidate embedding against the live roster, best match first.
///
/// Ordering is the documented tie-break rule for resolution: similarity descending, then
/// fitness_score descending, then lowest concept id. An empty roster yields no match; a
/// dimension mismatch against the roster's profile is a config error, never a silent zero.
pub fn rank_matches(candidate: &[f32], roster: &[RosterEntry]) -> Result<Vec<ConceptMatch>> {
	let Some(first) = roster.first() else {
		return Ok(Vec::new());
	};

	if candidate.len() != first.embedding.len() {
		return Err(Error::Config {
			message: format!(
				"Candidate embedding dimension {} does not match the graph dimension {}.",
				candidate.len(),
				first.embedding.len()
			),
		});
	}

	let mut matches = roster
		.iter()
		.map(|entry| ConceptMatch {
			concept_id: entry.concept_id,
			similarity: cosine_similarity(candidate, &entry.embedding),
			fitness_score: entry.fitness_score,
		})
		.collect::<Vec<_>>();

	matches.sort_by(|left, right| {
		cmp_f32_desc(left.similarity, right.similarity)
			.then_with(|| cmp_f64_desc(left.fitness_score, right.fitness_score))
			.then_with(|| left.concept_id.cmp(&right.concept_id))
	});

	Ok(matches)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entry(concept_id: Uuid, fitness_score: f64, embedding: Vec<f32>) -> RosterEntry {
		RosterEntry { concept_id, fitness_score, embedding }
	}

	#[test]
	fn empty_roster_yields_no_match() {
		let matches = rank_matches(&[1.0, 0.0], &[]).expect("Empty roster must not error.");

		assert!(matches.is_empty());
	}

	#[test]
	fn dimension_mismatch_is_a_config_error() {
		let roster = vec![entry(Uuid::new_v4(), 0.0, vec![1.0, 0.0, 0.0])];
		let err = rank_matches(&[1.0, 0.0], &roster).expect_err("Expected a config error.");

		assert!(matches!(err, Error::Config { .. }));
	}

	#[test]
	fn matches_are_ordered_by_similarity() {
		let near = Uuid::new_v4();
		let far = Uuid::new_v4();
		let roster = vec![
			entry(far, 0.9, vec![0.0, 1.0]),
			entry(near, 0.0, vec![1.0, 0.0]),
		];
		let matches = rank_matches(&[1.0, 0.1], &roster).expect("Scan failed.");

		assert_eq!(matches[0].concept_id, near);
		assert!(matches[0].similarity > matches[1].similarity);
	}

	#[test]
	fn equal_similarity_prefers_higher_fitness_then_lower_id() {
		let id_a = Uuid::from_u128(1);
		let id_b = Uuid::from_u128(2);
		let id_c = Uuid::from_u128(3);
		let shared = vec![1.0_f32, 0.0];
		let roster = vec![
			entry(id_c, 0.2, shared.clone()),
			entry(id_a, 0.2, shared.clone()),
			entry(id_b, 0.8, shared.clone()),
		];
		let matches = rank_matches(&shared, &roster).expect("Scan failed.");

		assert_eq!(matches[0].concept_id, id_b);
		assert_eq!(matches[1].concept_id, id_a);
		assert_eq!(matches[2].concept_id, id_c);
	}
}
