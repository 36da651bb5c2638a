/// Cosine similarity between two equal-length vectors. A zero vector on either side scores 0.0;
/// callers are responsible for dimension agreement.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	let mut dot = 0.0_f32;
	let mut norm_a = 0.0_f32;
	let mut norm_b = 0.0_f32;

	for (lhs, rhs) in a.iter().zip(b.iter()) {
		dot += lhs * rhs;
		norm_a += lhs * lhs;
		norm_b += rhs * rhs;
	}

	if norm_a <= 0.0 || norm_b <= 0.0 {
		return 0.0;
	}

	dot / (norm_a.sqrt() * norm_b.sqrt())
}
