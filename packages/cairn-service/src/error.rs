pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Config error: {message}")]
	Config { message: String },
	#[error("Validation error at {path}: {message}")]
	Validation { path: String, message: String },
	#[error("Resolution conflict: candidate {label:?} lost the create race twice.")]
	ResolutionConflict { label: String },
	#[error("Permission denied: {message}")]
	Permission { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Flush failed after {attempts} attempts: {message}")]
	Flush { attempts: u32, message: String },
}
impl From<cairn_storage::Error> for Error {
	fn from(err: cairn_storage::Error) -> Self {
		match err {
			cairn_storage::Error::PermissionDenied(message) => Self::Permission { message },
			other => Self::Storage { message: other.to_string() },
		}
	}
}
impl From<cairn_config::Error> for Error {
	fn from(err: cairn_config::Error) -> Self {
		Self::Config { message: err.to_string() }
	}
}
