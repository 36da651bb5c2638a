use std::{
	collections::{HashMap, HashSet},
	sync::Mutex,
};

use uuid::Uuid;

use crate::{
	BoxFuture, Error, Result,
	models::{Caller, FitnessDelta, RosterEntry, VectorHit},
	store::GraphStore,
};
use cairn_domain::{Concept, Instance, Relationship, cmp_f32_desc, cosine_similarity};

/// In-memory reference backend implementing the full [`GraphStore`] contract. Production
/// deployments bring their own engine; this one backs tests and local runs.
#[derive(Default)]
pub struct MemoryGraphStore {
	inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
	concepts: HashMap<Uuid, Concept>,
	labels: HashMap<(String, String), Uuid>,
	instances: Vec<Instance>,
	relationships: HashMap<(String, Uuid, Uuid, String), Relationship>,
	denied_actors: HashSet<String>,
}

impl MemoryGraphStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Marks an actor as denied for every subsequent call. Stand-in for the external
	/// access-control layer.
	pub fn deny_actor(&self, actor: &str) {
		let mut inner = self.lock();

		inner.denied_actors.insert(actor.to_string());
	}

	/// Curation-side bias adjustment. Privileged external callers only; the resolution and
	/// scoring paths never touch it.
	pub fn set_manual_bias(&self, concept_id: Uuid, manual_bias: f64) -> Result<()> {
		let mut inner = self.lock();
		let concept = inner
			.concepts
			.get_mut(&concept_id)
			.ok_or_else(|| Error::NotFound(format!("concept not found; concept_id={concept_id}")))?;

		concept.manual_bias = manual_bias;
		concept.final_score = cairn_domain::final_score(concept.fitness_score, manual_bias);

		Ok(())
	}

	pub fn concept_count(&self, graph_id: &str) -> usize {
		self.lock().concepts.values().filter(|concept| concept.graph_id == graph_id).count()
	}

	pub fn instance_count(&self, concept_id: Uuid) -> usize {
		self.lock().instances.iter().filter(|instance| instance.concept_id == concept_id).count()
	}

	pub fn relationships(&self, graph_id: &str) -> Vec<Relationship> {
		let inner = self.lock();

		inner
			.relationships
			.iter()
			.filter(|((graph, _, _, _), _)| graph == graph_id)
			.map(|(_, relationship)| relationship.clone())
			.collect()
	}

	pub fn concept_by_label(&self, graph_id: &str, label: &str) -> Option<Concept> {
		let inner = self.lock();
		let key = (graph_id.to_string(), cairn_domain::normalize_label(label));
		let concept_id = inner.labels.get(&key)?;

		inner.concepts.get(concept_id).cloned()
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
		self.inner.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn check_caller(inner: &Inner, caller: &Caller) -> Result<()> {
		if inner.denied_actors.contains(&caller.actor) {
			return Err(Error::PermissionDenied(format!(
				"actor {:?} is not allowed to access this graph",
				caller.actor
			)));
		}

		Ok(())
	}
}

impl GraphStore for MemoryGraphStore {
	fn upsert_concept<'a>(
		&'a self,
		caller: &'a Caller,
		concept: &'a Concept,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut inner = self.lock();

			Self::check_caller(&inner, caller)?;

			let label_key =
				(concept.graph_id.clone(), cairn_domain::normalize_label(&concept.label));

			if let Some(existing) = inner.labels.get(&label_key)
				&& *existing != concept.concept_id
			{
				return Err(Error::Conflict(format!(
					"label {:?} already names concept {existing} in graph {:?}",
					concept.label, concept.graph_id
				)));
			}

			if let Some(previous) = inner.concepts.get(&concept.concept_id) {
				let previous_key =
					(previous.graph_id.clone(), cairn_domain::normalize_label(&previous.label));

				if previous_key != label_key {
					inner.labels.remove(&previous_key);
				}
			}

			inner.labels.insert(label_key, concept.concept_id);
			inner.concepts.insert(concept.concept_id, concept.clone());

			Ok(())
		})
	}

	fn create_instance<'a>(
		&'a self,
		caller: &'a Caller,
		instance: &'a Instance,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut inner = self.lock();

			Self::check_caller(&inner, caller)?;

			if !inner.concepts.contains_key(&instance.concept_id) {
				return Err(Error::NotFound(format!(
					"concept not found; concept_id={}",
					instance.concept_id
				)));
			}

			inner.instances.push(instance.clone());

			Ok(())
		})
	}

	fn upsert_relationship<'a>(
		&'a self,
		caller: &'a Caller,
		graph_id: &'a str,
		relationship: &'a Relationship,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut inner = self.lock();

			Self::check_caller(&inner, caller)?;

			let key = (
				graph_id.to_string(),
				relationship.from_id,
				relationship.to_id,
				relationship.relation.clone(),
			);

			match inner.relationships.get_mut(&key) {
				Some(existing) => {
					existing.confidence = existing.confidence.max(relationship.confidence);
				},
				None => {
					inner.relationships.insert(key, relationship.clone());
				},
			}

			Ok(())
		})
	}

	fn batch_update_fitness<'a>(
		&'a self,
		caller: &'a Caller,
		deltas: &'a [FitnessDelta],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut inner = self.lock();

			Self::check_caller(&inner, caller)?;

			// All-or-nothing, like the transactional engines this stands in for.
			for delta in deltas {
				if !inner.concepts.contains_key(&delta.concept_id) {
					return Err(Error::NotFound(format!(
						"concept not found; concept_id={}",
						delta.concept_id
					)));
				}
			}

			for delta in deltas {
				let Some(concept) = inner.concepts.get_mut(&delta.concept_id) else { continue };

				concept.query_count += delta.count;
				concept.relevance_sum += delta.relevance_sum_delta;
				concept.fitness_score =
					cairn_domain::fitness_score(concept.relevance_sum, concept.query_count);
				concept.final_score =
					cairn_domain::final_score(concept.fitness_score, concept.manual_bias);
			}

			Ok(())
		})
	}

	fn query_by_vector<'a>(
		&'a self,
		caller: &'a Caller,
		graph_id: &'a str,
		embedding: &'a [f32],
		k: usize,
	) -> BoxFuture<'a, Result<Vec<VectorHit>>> {
		Box::pin(async move {
			let inner = self.lock();

			Self::check_caller(&inner, caller)?;

			let mut hits = inner
				.concepts
				.values()
				.filter(|concept| concept.graph_id == graph_id)
				.map(|concept| VectorHit {
					concept_id: concept.concept_id,
					label: concept.label.clone(),
					raw_score: cosine_similarity(embedding, &concept.embedding),
					final_score: concept.final_score,
				})
				.collect::<Vec<_>>();

			hits.sort_by(|left, right| {
				cmp_f32_desc(left.raw_score, right.raw_score)
					.then_with(|| left.concept_id.cmp(&right.concept_id))
			});
			hits.truncate(k);

			Ok(hits)
		})
	}

	fn concept_roster<'a>(
		&'a self,
		caller: &'a Caller,
		graph_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<RosterEntry>>> {
		Box::pin(async move {
			let inner = self.lock();

			Self::check_caller(&inner, caller)?;

			Ok(inner
				.concepts
				.values()
				.filter(|concept| concept.graph_id == graph_id)
				.map(|concept| RosterEntry {
					concept_id: concept.concept_id,
					fitness_score: concept.fitness_score,
					embedding: concept.embedding.clone(),
				})
				.collect())
		})
	}

	fn get_concept<'a>(
		&'a self,
		caller: &'a Caller,
		concept_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Concept>>> {
		Box::pin(async move {
			let inner = self.lock();

			Self::check_caller(&inner, caller)?;

			Ok(inner.concepts.get(&concept_id).cloned())
		})
	}
}
