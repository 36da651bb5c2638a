use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

use crate::{
	Error, Result, Service, evidence,
	resolve::{self, CandidateConcept, Decision},
};
use cairn_domain::{ConceptCandidate, normalize_label, parse_candidates};
use cairn_providers::extractor::extraction_messages;
use cairn_storage::Caller;

/// One already-chunked span of source text. Chunking and paragraph indexing happen upstream;
/// `source_ref` carries whatever the source-text collaborator needs to retrieve the span again.
#[derive(Clone, Debug)]
pub struct SourceChunk {
	pub text: String,
	pub source_ref: Value,
}

#[derive(Clone, Debug)]
pub struct IngestRequest {
	pub graph_id: String,
	pub chunks: Vec<SourceChunk>,
}

#[derive(Debug)]
pub struct ResolvedCandidate {
	pub label: String,
	pub concept_id: Uuid,
	pub decision: Decision,
	pub top_similarity: Option<f32>,
}

#[derive(Debug, Default)]
pub struct IngestReport {
	pub resolved: Vec<ResolvedCandidate>,
	pub warnings: Vec<String>,
}

impl Service {
	/// Runs one document's resolution pass: extract candidates per chunk, resolve each in order,
	/// record evidence. The pass roster grows with every resolution, so a concept named in an
	/// early chunk is resolvable against restatements in later chunks of the same document.
	///
	/// A malformed candidate or a double create conflict abandons that candidate alone; config
	/// and permission failures abort the document.
	pub async fn ingest_document(
		&self,
		caller: &Caller,
		request: IngestRequest,
	) -> Result<IngestReport> {
		let mut report = IngestReport::default();
		let mut roster = self.store.concept_roster(caller, &request.graph_id).await?;
		let mut resolved_labels: HashMap<String, Uuid> = HashMap::new();

		for chunk in &request.chunks {
			let messages = extraction_messages(&chunk.text);
			let raw = self
				.providers
				.extractor
				.extract(&self.cfg.providers.llm_extractor, &messages)
				.await
				.map_err(|err| Error::Provider { message: err.to_string() })?;
			let parsed = parse_candidates(&raw, chunk.text.len());

			for warning in &parsed.warnings {
				tracing::warn!(path = %warning.path, message = %warning.message, "Candidate skipped.");
				report.warnings.push(format!("{}: {}", warning.path, warning.message));
			}

			if parsed.concepts.is_empty() {
				continue;
			}

			let embeddings = self.embed_candidates(&parsed.concepts).await?;

			for (candidate, embedding) in parsed.concepts.iter().zip(embeddings) {
				let resolution = resolve::resolve_candidate(
					self.store.as_ref(),
					&self.locks,
					caller,
					&request.graph_id,
					self.cfg.resolution.merge_threshold,
					CandidateConcept {
						label: candidate.label.clone(),
						embedding,
						confidence: candidate.confidence,
						flagged_for_review: candidate.confidence
							< self.cfg.resolution.review_confidence,
					},
					&mut roster,
				)
				.await;
				let resolution = match resolution {
					Ok(resolution) => resolution,
					Err(Error::ResolutionConflict { label }) => {
						let warning =
							format!("Candidate {label:?} lost the create race twice; abandoned.");

						tracing::warn!(%warning);
						report.warnings.push(warning);

						continue;
					},
					Err(other) => return Err(other),
				};

				evidence::record_evidence(
					self.store.as_ref(),
					caller,
					&request.graph_id,
					resolution.concept_id,
					candidate,
					&chunk.source_ref,
					&resolved_labels,
					&mut report.warnings,
				)
				.await?;
				resolved_labels.insert(normalize_label(&candidate.label), resolution.concept_id);
				report.resolved.push(ResolvedCandidate {
					label: candidate.label.clone(),
					concept_id: resolution.concept_id,
					decision: resolution.decision,
					top_similarity: resolution.top_similarity,
				});
			}
		}

		Ok(report)
	}

	/// Embeds every candidate of one chunk in a single provider call. The embedding input is the
	/// label plus its search terms, which is what restatements in later chunks embed against.
	async fn embed_candidates(&self, candidates: &[ConceptCandidate]) -> Result<Vec<Vec<f32>>> {
		let inputs = candidates.iter().map(embedding_input).collect::<Vec<_>>();
		let embeddings = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, &inputs)
			.await
			.map_err(|err| Error::Provider { message: err.to_string() })?;

		if embeddings.len() != candidates.len() {
			return Err(Error::Provider {
				message: format!(
					"Embedding provider returned {} vectors for {} candidates.",
					embeddings.len(),
					candidates.len()
				),
			});
		}

		let expected = self.cfg.providers.embedding.dimensions as usize;

		for embedding in &embeddings {
			if embedding.len() != expected {
				return Err(Error::Config {
					message: format!(
						"Candidate embedding dimension {} does not match the active profile dimension {expected}.",
						embedding.len()
					),
				});
			}
		}

		Ok(embeddings)
	}
}

fn embedding_input(candidate: &ConceptCandidate) -> String {
	if candidate.search_terms.is_empty() {
		return candidate.label.clone();
	}

	format!("{}; {}", candidate.label, candidate.search_terms.join("; "))
}
