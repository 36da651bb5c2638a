use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, matcher};
use cairn_domain::Concept;
use cairn_storage::{Caller, GraphStore, RosterEntry};

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
	Merged,
	Created,
}

/// Per-candidate state machine: `Received -> Scored -> {Merge | Create} -> Committed`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ResolutionState {
	Received,
	Scored,
	Merge,
	Create,
	Committed,
}

#[derive(Debug)]
pub struct Resolution {
	pub concept_id: Uuid,
	pub decision: Decision,
	pub top_similarity: Option<f32>,
}

/// Everything the controller needs to mint a concept row if the candidate turns out to be new.
#[derive(Debug)]
pub(crate) struct CandidateConcept {
	pub(crate) label: String,
	pub(crate) embedding: Vec<f32>,
	pub(crate) confidence: f32,
	pub(crate) flagged_for_review: bool,
}

/// Per-graph write serialization for the decide-to-commit step. The similarity scan and evidence
/// writes run outside the lock; only the roster re-check plus the concept commit hold it. Across
/// processes the store's label uniqueness constraint is the backstop.
#[derive(Default)]
pub(crate) struct GraphLocks {
	locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}
impl GraphLocks {
	pub(crate) fn lock_for(&self, graph_id: &str) -> Arc<tokio::sync::Mutex<()>> {
		let mut locks = self.locks.lock().unwrap_or_else(|err| err.into_inner());

		locks.entry(graph_id.to_string()).or_default().clone()
	}
}

fn transition(label: &str, state: ResolutionState) {
	tracing::debug!(label, ?state, "Resolution state transition.");
}

/// Decides merge-versus-create for one candidate and commits the outcome.
///
/// `roster` is the pass-local roster: the store roster as of the pass start plus every concept
/// resolved earlier in the same pass. On create it is refreshed from the store under the graph
/// lock, so a concurrent creator's concept is seen before committing; a store conflict triggers
/// exactly one retry against another fresh roster before surfacing `ResolutionConflict`.
pub(crate) async fn resolve_candidate(
	store: &dyn GraphStore,
	locks: &GraphLocks,
	caller: &Caller,
	graph_id: &str,
	merge_threshold: f32,
	candidate: CandidateConcept,
	roster: &mut Vec<RosterEntry>,
) -> Result<Resolution> {
	transition(&candidate.label, ResolutionState::Received);

	let matches = matcher::rank_matches(&candidate.embedding, roster)?;

	transition(&candidate.label, ResolutionState::Scored);

	if let Some(top) = matches.first()
		&& top.similarity >= merge_threshold
	{
		transition(&candidate.label, ResolutionState::Merge);

		return Ok(Resolution {
			concept_id: top.concept_id,
			decision: Decision::Merged,
			top_similarity: Some(top.similarity),
		});
	}

	transition(&candidate.label, ResolutionState::Create);

	let lock = locks.lock_for(graph_id);
	let _guard = lock.lock().await;

	// Another resolver may have committed between our scan and the lock; re-read before writing.
	*roster = store.concept_roster(caller, graph_id).await?;

	for attempt in 0..2 {
		let matches = matcher::rank_matches(&candidate.embedding, roster)?;

		if let Some(top) = matches.first()
			&& top.similarity >= merge_threshold
		{
			transition(&candidate.label, ResolutionState::Merge);

			return Ok(Resolution {
				concept_id: top.concept_id,
				decision: Decision::Merged,
				top_similarity: Some(top.similarity),
			});
		}

		let top_similarity = matches.first().map(|top| top.similarity);
		let concept = new_concept(caller, graph_id, &candidate);

		match store.upsert_concept(caller, &concept).await {
			Ok(()) => {
				transition(&candidate.label, ResolutionState::Committed);

				roster.push(RosterEntry {
					concept_id: concept.concept_id,
					fitness_score: 0.0,
					embedding: concept.embedding,
				});

				return Ok(Resolution {
					concept_id: concept.concept_id,
					decision: Decision::Created,
					top_similarity,
				});
			},
			Err(cairn_storage::Error::Conflict(message)) => {
				tracing::warn!(
					label = %candidate.label,
					attempt,
					%message,
					"Create lost a write race; refreshing roster.",
				);

				*roster = store.concept_roster(caller, graph_id).await?;
			},
			Err(other) => return Err(other.into()),
		}
	}

	Err(Error::ResolutionConflict { label: candidate.label })
}

fn new_concept(caller: &Caller, graph_id: &str, candidate: &CandidateConcept) -> Concept {
	Concept {
		concept_id: Uuid::new_v4(),
		graph_id: graph_id.to_string(),
		label: candidate.label.clone(),
		embedding: candidate.embedding.clone(),
		query_count: 0,
		relevance_sum: 0.0,
		fitness_score: 0.0,
		manual_bias: 0.0,
		final_score: 0.0,
		confidence: candidate.confidence,
		flagged_for_review: candidate.flagged_for_review,
		created_by: caller.actor.clone(),
		created_at: OffsetDateTime::now_utc(),
	}
}
