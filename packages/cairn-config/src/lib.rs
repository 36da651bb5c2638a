mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Graph, LlmProviderConfig, Providers, Resolution, Scoring,
	Search, Service,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.graph.embedding_profile.trim().is_empty() {
		return Err(Error::Validation {
			message: "graph.embedding_profile must be non-empty.".to_string(),
		});
	}
	if !cfg.resolution.merge_threshold.is_finite() {
		return Err(Error::Validation {
			message: "resolution.merge_threshold must be a finite number.".to_string(),
		});
	}
	if cfg.resolution.merge_threshold <= 0.0 || cfg.resolution.merge_threshold > 1.0 {
		return Err(Error::Validation {
			message: "resolution.merge_threshold must be greater than zero and at most 1.0."
				.to_string(),
		});
	}
	if !cfg.resolution.review_confidence.is_finite() {
		return Err(Error::Validation {
			message: "resolution.review_confidence must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.resolution.review_confidence) {
		return Err(Error::Validation {
			message: "resolution.review_confidence must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.scoring.flush_max_pending == 0 {
		return Err(Error::Validation {
			message: "scoring.flush_max_pending must be greater than zero.".to_string(),
		});
	}
	if cfg.scoring.flush_interval_secs == 0 {
		return Err(Error::Validation {
			message: "scoring.flush_interval_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.scoring.channel_capacity == 0 {
		return Err(Error::Validation {
			message: "scoring.channel_capacity must be greater than zero.".to_string(),
		});
	}
	if cfg.scoring.flush_max_attempts == 0 {
		return Err(Error::Validation {
			message: "scoring.flush_max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.search.top_k == 0 {
		return Err(Error::Validation {
			message: "search.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.candidate_k < cfg.search.top_k {
		return Err(Error::Validation {
			message: "search.candidate_k must be at least search.top_k.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if !cfg.providers.llm_extractor.temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.llm_extractor.temperature must be a finite number.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm_extractor", &cfg.providers.llm_extractor.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
