use uuid::Uuid;

/// Identity attached to every store call. The store decides authorization; this core only
/// surfaces a denial.
#[derive(Clone, Debug)]
pub struct Caller {
	pub actor: String,
}
impl Caller {
	pub fn new(actor: impl Into<String>) -> Self {
		Self { actor: actor.into() }
	}
}

/// Accumulated usage counters for one concept. Transient: exists in memory between a query hit
/// and the next confirmed flush.
#[derive(Clone, Debug, PartialEq)]
pub struct FitnessDelta {
	pub concept_id: Uuid,
	pub count: i64,
	pub relevance_sum_delta: f64,
}

/// Roster row for the similarity scan: everything the matcher needs, nothing more.
#[derive(Clone, Debug)]
pub struct RosterEntry {
	pub concept_id: Uuid,
	pub fitness_score: f64,
	pub embedding: Vec<f32>,
}

/// One raw similarity-ranked hit from `query_by_vector`, carrying the persisted final score so
/// the ranker never issues per-hit reads.
#[derive(Clone, Debug)]
pub struct VectorHit {
	pub concept_id: Uuid,
	pub label: String,
	pub raw_score: f32,
	pub final_score: f64,
}
