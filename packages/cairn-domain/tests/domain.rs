use cairn_domain::{boosted_score, cosine_similarity, final_score, fitness_score};

#[test]
fn usage_scores_compose_into_the_ranking_boost() {
	// Concept with 10 hits averaging 0.3 relevance and a +0.5 curator bias, matched at 0.9.
	let fitness = fitness_score(3.0, 10);
	let final_score = final_score(fitness, 0.5);
	let boosted = boosted_score(0.9, final_score);

	assert_eq!(fitness, 0.3);
	assert_eq!(final_score, 0.8);
	assert!((boosted - 1.62).abs() < 1e-9);
}

#[test]
fn unqueried_concepts_never_poison_the_boost() {
	let fitness = fitness_score(0.0, 0);
	let boosted = boosted_score(0.75, final_score(fitness, 0.0));

	assert_eq!(fitness, 0.0);
	assert!((boosted - 0.75).abs() < 1e-6);
	assert!(boosted.is_finite());
}

#[test]
fn near_duplicate_embeddings_clear_the_default_merge_threshold() {
	let e1 = vec![0.9_f32, 0.1, 0.4, 0.1];
	let e2 = vec![0.8_f32, 0.2, 0.5, 0.2];
	let similarity = cosine_similarity(&e1, &e2);

	assert!(similarity >= 0.75, "expected a merge-grade similarity, got {similarity}");
}
