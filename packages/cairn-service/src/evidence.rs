use std::collections::HashMap;

use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::Result;
use cairn_domain::{ConceptCandidate, Instance, Relationship, normalize_label};
use cairn_storage::{Caller, GraphStore};

/// Records a resolved candidate's evidence: one instance per validated quote, plus relationship
/// edges whose endpoints resolved earlier in the same pass. Only reference fields are stored;
/// the source text itself stays with the external source-text collaborator.
pub(crate) async fn record_evidence(
	store: &dyn GraphStore,
	caller: &Caller,
	graph_id: &str,
	concept_id: Uuid,
	candidate: &ConceptCandidate,
	source_ref: &Value,
	resolved_labels: &HashMap<String, Uuid>,
	warnings: &mut Vec<String>,
) -> Result<()> {
	let now = OffsetDateTime::now_utc();

	for quote in &candidate.quotes {
		let instance = Instance {
			instance_id: Uuid::new_v4(),
			concept_id,
			quote: quote.quote.clone(),
			source_ref: source_ref.clone(),
			start_offset: quote.start_offset,
			end_offset: quote.end_offset,
			sentence_index: quote.sentence_index,
			created_at: now,
		};

		store.create_instance(caller, &instance).await?;
	}

	for relationship in &candidate.relationships {
		let target_key = normalize_label(&relationship.target_label);
		let Some(to_id) = resolved_labels.get(&target_key) else {
			let warning = format!(
				"Relationship target {:?} from {:?} is not resolved in this pass; edge dropped.",
				relationship.target_label, candidate.label
			);

			tracing::warn!(%warning);
			warnings.push(warning);

			continue;
		};
		let edge = Relationship {
			from_id: concept_id,
			to_id: *to_id,
			relation: relationship.relation.clone(),
			confidence: relationship.confidence,
		};

		store.upsert_relationship(caller, graph_id, &edge).await?;
	}

	Ok(())
}
