pub mod candidate;
pub mod concept;
pub mod ranking;
pub mod similarity;

pub use candidate::{
	CandidateWarning, ConceptCandidate, InstanceCandidate, ParsedCandidates,
	RelationshipCandidate, parse_candidates,
};
pub use concept::{
	Concept, Instance, Relationship, final_score, fitness_score, normalize_label,
};
pub use ranking::{boosted_score, cmp_f32_desc, cmp_f64_desc};
pub use similarity::cosine_similarity;
