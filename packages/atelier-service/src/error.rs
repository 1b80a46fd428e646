pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Generation unavailable: {message}")]
	GenerationUnavailable { message: String },
	#[error("Embedding unavailable: {message}")]
	EmbeddingUnavailable { message: String },
	#[error("Retrieval unavailable: {message}")]
	RetrievalUnavailable { message: String },
	#[error("Malformed routing decision: {message}")]
	MalformedRoutingDecision { message: String },
	#[error("Persistence failure: {message}")]
	PersistenceFailure { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Responder {responder} failed to process the request: {message}")]
	ProcessingFailed { responder: String, message: String },
}

impl From<atelier_storage::Error> for Error {
	fn from(err: atelier_storage::Error) -> Self {
		match err {
			atelier_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			other => Self::PersistenceFailure { message: other.to_string() },
		}
	}
}
