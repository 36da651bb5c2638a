use time::OffsetDateTime;
use uuid::Uuid;

use cairn_domain::{Concept, Instance, Relationship};
use cairn_storage::{Caller, Error, FitnessDelta, GraphStore, MemoryGraphStore};

const GRAPH: &str = "g1";

fn caller() -> Caller {
	Caller::new("ingest-agent")
}

fn concept(label: &str, embedding: Vec<f32>) -> Concept {
	Concept {
		concept_id: Uuid::new_v4(),
		graph_id: GRAPH.to_string(),
		label: label.to_string(),
		embedding,
		query_count: 0,
		relevance_sum: 0.0,
		fitness_score: 0.0,
		manual_bias: 0.0,
		final_score: 0.0,
		confidence: 1.0,
		flagged_for_review: false,
		created_by: "ingest-agent".to_string(),
		created_at: OffsetDateTime::now_utc(),
	}
}

fn instance(concept_id: Uuid, quote: &str) -> Instance {
	Instance {
		instance_id: Uuid::new_v4(),
		concept_id,
		quote: quote.to_string(),
		source_ref: serde_json::json!({ "document_id": "doc-1" }),
		start_offset: 0,
		end_offset: quote.len(),
		sentence_index: 0,
		created_at: OffsetDateTime::now_utc(),
	}
}

#[tokio::test]
async fn duplicate_label_under_a_different_id_conflicts() {
	let store = MemoryGraphStore::new();
	let caller = caller();
	let first = concept("Agile Governance", vec![1.0, 0.0]);
	let second = concept("  agile   GOVERNANCE ", vec![0.0, 1.0]);

	store.upsert_concept(&caller, &first).await.expect("First upsert failed.");

	let err = store
		.upsert_concept(&caller, &second)
		.await
		.expect_err("Expected a label conflict.");

	assert!(matches!(err, Error::Conflict(_)));
	assert_eq!(store.concept_count(GRAPH), 1);
}

#[tokio::test]
async fn reupserting_the_same_concept_is_not_a_conflict() {
	let store = MemoryGraphStore::new();
	let caller = caller();
	let mut existing = concept("Agile Governance", vec![1.0, 0.0]);

	store.upsert_concept(&caller, &existing).await.expect("First upsert failed.");

	existing.confidence = 0.7;

	store.upsert_concept(&caller, &existing).await.expect("Re-upsert failed.");

	assert_eq!(store.concept_count(GRAPH), 1);
}

#[tokio::test]
async fn relationship_duplicates_keep_the_maximum_confidence() {
	let store = MemoryGraphStore::new();
	let caller = caller();
	let from = concept("Agile Governance", vec![1.0, 0.0]);
	let to = concept("Risk Management", vec![0.0, 1.0]);

	store.upsert_concept(&caller, &from).await.expect("Upsert failed.");
	store.upsert_concept(&caller, &to).await.expect("Upsert failed.");

	for confidence in [0.4_f32, 0.9, 0.6] {
		let relationship = Relationship {
			from_id: from.concept_id,
			to_id: to.concept_id,
			relation: "supports".to_string(),
			confidence,
		};

		store
			.upsert_relationship(&caller, GRAPH, &relationship)
			.await
			.expect("Relationship upsert failed.");
	}

	let relationships = store.relationships(GRAPH);

	assert_eq!(relationships.len(), 1);
	assert_eq!(relationships[0].confidence, 0.9);
}

#[tokio::test]
async fn fitness_batches_update_counters_and_derived_scores() {
	let store = MemoryGraphStore::new();
	let caller = caller();
	let target = concept("Agile Governance", vec![1.0, 0.0]);

	store.upsert_concept(&caller, &target).await.expect("Upsert failed.");
	store.set_manual_bias(target.concept_id, 0.5).expect("Bias update failed.");
	store
		.batch_update_fitness(
			&caller,
			&[FitnessDelta {
				concept_id: target.concept_id,
				count: 10,
				relevance_sum_delta: 3.0,
			}],
		)
		.await
		.expect("Fitness batch failed.");

	let updated = store
		.get_concept(&caller, target.concept_id)
		.await
		.expect("Read failed.")
		.expect("Concept missing.");

	assert_eq!(updated.query_count, 10);
	assert_eq!(updated.relevance_sum, 3.0);
	assert_eq!(updated.fitness_score, 0.3);
	assert_eq!(updated.final_score, 0.8);
	assert_eq!(updated.manual_bias, 0.5);
}

#[tokio::test]
async fn vector_queries_rank_by_similarity_and_carry_final_scores() {
	let store = MemoryGraphStore::new();
	let caller = caller();
	let near = concept("Agile Governance", vec![1.0, 0.0, 0.0]);
	let far = concept("Risk Management", vec![0.0, 1.0, 0.0]);

	store.upsert_concept(&caller, &near).await.expect("Upsert failed.");
	store.upsert_concept(&caller, &far).await.expect("Upsert failed.");
	store.set_manual_bias(near.concept_id, 0.25).expect("Bias update failed.");

	let hits = store
		.query_by_vector(&caller, GRAPH, &[0.9, 0.1, 0.0], 10)
		.await
		.expect("Query failed.");

	assert_eq!(hits.len(), 2);
	assert_eq!(hits[0].concept_id, near.concept_id);
	assert!(hits[0].raw_score > hits[1].raw_score);
	assert_eq!(hits[0].final_score, 0.25);
}

#[tokio::test]
async fn instances_require_an_existing_concept() {
	let store = MemoryGraphStore::new();
	let caller = caller();
	let err = store
		.create_instance(&caller, &instance(Uuid::new_v4(), "orphan quote"))
		.await
		.expect_err("Expected a missing-concept error.");

	assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn denied_actors_get_permission_errors_on_every_call() {
	let store = MemoryGraphStore::new();
	let caller = caller();

	store.deny_actor(&caller.actor);

	let err = store
		.concept_roster(&caller, GRAPH)
		.await
		.expect_err("Expected a permission error.");

	assert!(matches!(err, Error::PermissionDenied(_)));

	let err = store
		.upsert_concept(&caller, &concept("Agile Governance", vec![1.0]))
		.await
		.expect_err("Expected a permission error.");

	assert!(matches!(err, Error::PermissionDenied(_)));
}
