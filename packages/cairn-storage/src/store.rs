use uuid::Uuid;

use crate::{
	BoxFuture, Result,
	models::{Caller, FitnessDelta, RosterEntry, VectorHit},
};
use cairn_domain::{Concept, Instance, Relationship};

/// Contract this core consumes from the graph storage engine. The engine itself (transactions,
/// schemas, authorization) is out of scope; implementations must only honor the documented
/// semantics of each call.
pub trait GraphStore
where
	Self: Send + Sync,
{
	/// Inserts or replaces a concept keyed by `concept_id`. A different concept already holding
	/// the same normalized label in the same graph is a [`Error::Conflict`]; the resolution
	/// controller relies on that signal to detect create races.
	fn upsert_concept<'a>(&'a self, caller: &'a Caller, concept: &'a Concept)
	-> BoxFuture<'a, Result<()>>;

	fn create_instance<'a>(
		&'a self,
		caller: &'a Caller,
		instance: &'a Instance,
	) -> BoxFuture<'a, Result<()>>;

	/// Upserts a directed edge. Duplicates of the same `(from, to, relation)` keep the maximum
	/// confidence seen.
	fn upsert_relationship<'a>(
		&'a self,
		caller: &'a Caller,
		graph_id: &'a str,
		relationship: &'a Relationship,
	) -> BoxFuture<'a, Result<()>>;

	/// Applies one batch of usage deltas transactionally: `query_count += count`,
	/// `relevance_sum += relevance_sum_delta`, then recomputes fitness and final scores.
	/// `manual_bias` is left untouched.
	fn batch_update_fitness<'a>(
		&'a self,
		caller: &'a Caller,
		deltas: &'a [FitnessDelta],
	) -> BoxFuture<'a, Result<()>>;

	/// Raw similarity-ranked hits for a query vector, best first.
	fn query_by_vector<'a>(
		&'a self,
		caller: &'a Caller,
		graph_id: &'a str,
		embedding: &'a [f32],
		k: usize,
	) -> BoxFuture<'a, Result<Vec<VectorHit>>>;

	/// The live concept roster for one graph, used by the O(N) similarity scan.
	fn concept_roster<'a>(
		&'a self,
		caller: &'a Caller,
		graph_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<RosterEntry>>>;

	fn get_concept<'a>(
		&'a self,
		caller: &'a Caller,
		concept_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Concept>>>;
}
