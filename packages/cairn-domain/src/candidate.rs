use serde::Deserialize;
use serde_json::Value;

/// A validated concept candidate, ready for resolution. Untyped extractor JSON never crosses
/// this boundary: every entry either becomes one of these or a [`CandidateWarning`].
#[derive(Clone, Debug)]
pub struct ConceptCandidate {
	pub label: String,
	pub search_terms: Vec<String>,
	pub confidence: f32,
	pub quotes: Vec<InstanceCandidate>,
	pub relationships: Vec<RelationshipCandidate>,
}

#[derive(Clone, Debug)]
pub struct InstanceCandidate {
	pub quote: String,
	pub start_offset: usize,
	pub end_offset: usize,
	pub sentence_index: usize,
}

/// Relationship whose target is named by label; endpoints are resolved to concept ids later in
/// the same pass.
#[derive(Clone, Debug)]
pub struct RelationshipCandidate {
	pub target_label: String,
	pub relation: String,
	pub confidence: f32,
}

#[derive(Clone, Debug)]
pub struct CandidateWarning {
	pub path: String,
	pub message: String,
}

#[derive(Debug, Default)]
pub struct ParsedCandidates {
	pub concepts: Vec<ConceptCandidate>,
	pub warnings: Vec<CandidateWarning>,
}

#[derive(Debug, Deserialize)]
struct RawPayload {
	#[serde(default)]
	concepts: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawConcept {
	label: Option<String>,
	#[serde(default)]
	search_terms: Vec<String>,
	confidence: Option<f32>,
	#[serde(default)]
	quotes: Vec<RawQuote>,
	#[serde(default)]
	relationships: Vec<RawRelationship>,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
	text: Option<String>,
	start_offset: Option<i64>,
	end_offset: Option<i64>,
	#[serde(default)]
	sentence_index: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawRelationship {
	target: Option<String>,
	#[serde(rename = "type")]
	relation: Option<String>,
	confidence: Option<f32>,
}

/// Validates one chunk's extractor output. A malformed candidate is skipped with a warning and
/// never aborts the rest of the chunk; a malformed relationship drops only that edge.
pub fn parse_candidates(raw: &Value, source_len: usize) -> ParsedCandidates {
	let mut out = ParsedCandidates::default();
	let payload: RawPayload = match serde_json::from_value(raw.clone()) {
		Ok(payload) => payload,
		Err(err) => {
			out.warnings.push(CandidateWarning {
				path: "concepts".to_string(),
				message: format!("Extractor payload is not a concept list: {err}."),
			});

			return out;
		},
	};

	for (concept_idx, entry) in payload.concepts.iter().enumerate() {
		let path = format!("concepts[{concept_idx}]");

		match validate_concept(entry, source_len, &path, &mut out.warnings) {
			Some(candidate) => out.concepts.push(candidate),
			None => continue,
		}
	}

	out
}

fn validate_concept(
	entry: &Value,
	source_len: usize,
	path: &str,
	warnings: &mut Vec<CandidateWarning>,
) -> Option<ConceptCandidate> {
	let raw: RawConcept = match serde_json::from_value(entry.clone()) {
		Ok(raw) => raw,
		Err(err) => {
			warnings.push(CandidateWarning {
				path: path.to_string(),
				message: format!("Malformed candidate entry: {err}."),
			});

			return None;
		},
	};
	let label = raw.label.as_deref().map(str::trim).unwrap_or_default();

	if label.is_empty() {
		warnings.push(CandidateWarning {
			path: format!("{path}.label"),
			message: "Candidate label must be non-empty.".to_string(),
		});

		return None;
	}

	let confidence = raw.confidence.unwrap_or(1.0);

	if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
		warnings.push(CandidateWarning {
			path: format!("{path}.confidence"),
			message: "Candidate confidence must be in the range 0.0-1.0.".to_string(),
		});

		return None;
	}

	let mut quotes = Vec::with_capacity(raw.quotes.len());

	for (quote_idx, quote) in raw.quotes.iter().enumerate() {
		let quote_path = format!("{path}.quotes[{quote_idx}]");

		// Quote offsets outside the source bounds invalidate the whole candidate; evidence that
		// cannot be traced back to the source must never be committed.
		quotes.push(validate_quote(quote, source_len, &quote_path, warnings)?);
	}

	let mut relationships = Vec::with_capacity(raw.relationships.len());

	for (relation_idx, relationship) in raw.relationships.iter().enumerate() {
		let relation_path = format!("{path}.relationships[{relation_idx}]");

		if let Some(relationship) = validate_relationship(relationship, &relation_path, warnings) {
			relationships.push(relationship);
		}
	}

	Some(ConceptCandidate {
		label: label.to_string(),
		search_terms: raw
			.search_terms
			.iter()
			.map(|term| term.trim().to_string())
			.filter(|term| !term.is_empty())
			.collect(),
		confidence,
		quotes,
		relationships,
	})
}

fn validate_quote(
	quote: &RawQuote,
	source_len: usize,
	path: &str,
	warnings: &mut Vec<CandidateWarning>,
) -> Option<InstanceCandidate> {
	let text = quote.text.as_deref().map(str::trim).unwrap_or_default();

	if text.is_empty() {
		warnings.push(CandidateWarning {
			path: path.to_string(),
			message: "Quote text must be non-empty.".to_string(),
		});

		return None;
	}

	let offsets = usize::try_from(quote.start_offset.unwrap_or(-1))
		.and_then(|start| usize::try_from(quote.end_offset.unwrap_or(-1)).map(|end| (start, end)));
	let (start, end) = match offsets {
		Ok(offsets) => offsets,
		Err(_) => {
			warnings.push(CandidateWarning {
				path: path.to_string(),
				message: "Quote offsets must be non-negative.".to_string(),
			});

			return None;
		},
	};

	if start >= end || end > source_len {
		warnings.push(CandidateWarning {
			path: path.to_string(),
			message: format!(
				"Quote offsets {start}..{end} fall outside the source bounds 0..{source_len}."
			),
		});

		return None;
	}

	let sentence_index = quote.sentence_index.and_then(|idx| usize::try_from(idx).ok()).unwrap_or(0);

	Some(InstanceCandidate {
		quote: text.to_string(),
		start_offset: start,
		end_offset: end,
		sentence_index,
	})
}

fn validate_relationship(
	relationship: &RawRelationship,
	path: &str,
	warnings: &mut Vec<CandidateWarning>,
) -> Option<RelationshipCandidate> {
	let target = relationship.target.as_deref().map(str::trim).unwrap_or_default();

	if target.is_empty() {
		warnings.push(CandidateWarning {
			path: format!("{path}.target"),
			message: "Relationship target must be non-empty.".to_string(),
		});

		return None;
	}

	let relation = relationship.relation.as_deref().map(str::trim).unwrap_or_default();

	if relation.is_empty() {
		warnings.push(CandidateWarning {
			path: format!("{path}.type"),
			message: "Relationship type must be non-empty.".to_string(),
		});

		return None;
	}

	let confidence = relationship.confidence.unwrap_or(1.0);

	if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
		warnings.push(CandidateWarning {
			path: format!("{path}.confidence"),
			message: "Relationship confidence must be in the range 0.0-1.0.".to_string(),
		});

		return None;
	}

	Some(RelationshipCandidate {
		target_label: target.to_string(),
		relation: relation.to_string(),
		confidence,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_payload() -> Value {
		serde_json::json!({
			"concepts": [
				{
					"label": "Agile Governance",
					"search_terms": ["agile", "governance board"],
					"confidence": 0.9,
					"quotes": [
						{ "text": "agile governance is key", "start_offset": 4, "end_offset": 28, "sentence_index": 0 }
					],
					"relationships": [
						{ "target": "Risk Management", "type": "supports", "confidence": 0.8 }
					]
				}
			]
		})
	}

	#[test]
	fn valid_payload_parses_without_warnings() {
		let parsed = parse_candidates(&sample_payload(), 64);

		assert!(parsed.warnings.is_empty());
		assert_eq!(parsed.concepts.len(), 1);

		let concept = &parsed.concepts[0];

		assert_eq!(concept.label, "Agile Governance");
		assert_eq!(concept.search_terms, vec!["agile", "governance board"]);
		assert_eq!(concept.quotes.len(), 1);
		assert_eq!(concept.relationships[0].relation, "supports");
	}

	#[test]
	fn out_of_bounds_quote_skips_the_candidate() {
		let payload = serde_json::json!({
			"concepts": [
				{
					"label": "Agile Governance",
					"quotes": [{ "text": "quote", "start_offset": 10, "end_offset": 99 }]
				},
				{ "label": "Risk Management", "quotes": [] }
			]
		});
		let parsed = parse_candidates(&payload, 32);

		assert_eq!(parsed.concepts.len(), 1);
		assert_eq!(parsed.concepts[0].label, "Risk Management");
		assert_eq!(parsed.warnings.len(), 1);
		assert!(parsed.warnings[0].path.contains("quotes[0]"));
	}

	#[test]
	fn inverted_offsets_are_rejected() {
		let payload = serde_json::json!({
			"concepts": [
				{
					"label": "Agile Governance",
					"quotes": [{ "text": "quote", "start_offset": 20, "end_offset": 10 }]
				}
			]
		});
		let parsed = parse_candidates(&payload, 32);

		assert!(parsed.concepts.is_empty());
		assert_eq!(parsed.warnings.len(), 1);
	}

	#[test]
	fn empty_label_skips_entry_but_not_siblings() {
		let payload = serde_json::json!({
			"concepts": [
				{ "label": "  " },
				{ "label": "Risk Management" }
			]
		});
		let parsed = parse_candidates(&payload, 16);

		assert_eq!(parsed.concepts.len(), 1);
		assert_eq!(parsed.warnings.len(), 1);
		assert!(parsed.warnings[0].path.ends_with(".label"));
	}

	#[test]
	fn malformed_relationship_drops_only_the_edge() {
		let payload = serde_json::json!({
			"concepts": [
				{
					"label": "Agile Governance",
					"relationships": [
						{ "target": "", "type": "supports" },
						{ "target": "Risk Management", "type": "supports", "confidence": 2.0 },
						{ "target": "Risk Management", "type": "supports", "confidence": 0.4 }
					]
				}
			]
		});
		let parsed = parse_candidates(&payload, 16);

		assert_eq!(parsed.concepts.len(), 1);
		assert_eq!(parsed.concepts[0].relationships.len(), 1);
		assert_eq!(parsed.warnings.len(), 2);
	}

	#[test]
	fn non_list_payload_is_a_single_warning() {
		let parsed = parse_candidates(&serde_json::json!({ "concepts": "oops" }), 16);

		assert!(parsed.concepts.is_empty());
		assert_eq!(parsed.warnings.len(), 1);
	}
}
