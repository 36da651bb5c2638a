use std::cmp::Ordering;

/// Blends raw vector similarity with the usage-driven final score. The `max(0, ...)` floor keeps
/// a very negative manual bias from inverting the ranking: the worst a concept can do is score
/// zero.
pub fn boosted_score(raw_score: f32, final_score: f64) -> f64 {
	f64::from(raw_score) * (1.0 + final_score).max(0.0)
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

pub fn cmp_f64_desc(a: f64, b: f64) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn boost_blends_raw_score_with_final_score() {
		// fitness 0.3 + bias 0.5 at raw 0.9 boosts to 1.62.
		assert!((boosted_score(0.9, 0.8) - 1.62).abs() < 1e-9);
		assert_eq!(boosted_score(0.9, 0.0), 0.9_f32 as f64);
	}

	#[test]
	fn boost_floors_at_zero_for_very_negative_bias() {
		assert_eq!(boosted_score(0.9, -3.0), 0.0);
		assert_eq!(boosted_score(0.9, -1.0), 0.0);
	}

	#[test]
	fn boost_is_monotone_in_final_score() {
		let raw = 0.7_f32;
		let mut previous = f64::NEG_INFINITY;

		for step in -30..=30 {
			let final_score = f64::from(step) * 0.1;
			let boosted = boosted_score(raw, final_score);

			assert!(boosted >= previous, "boost decreased at final_score {final_score}");
			assert!(boosted >= 0.0);

			previous = boosted;
		}
	}

	#[test]
	fn descending_comparators_sink_nan() {
		assert_eq!(cmp_f32_desc(1.0, 0.5), Ordering::Less);
		assert_eq!(cmp_f32_desc(f32::NAN, 0.5), Ordering::Greater);
		assert_eq!(cmp_f64_desc(0.5, 1.0), Ordering::Greater);
	}
}
