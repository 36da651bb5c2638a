#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Conflict: {0}")]
	Conflict(String),
	#[error("Permission denied: {0}")]
	PermissionDenied(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Unavailable: {0}")]
	Unavailable(String),
}
