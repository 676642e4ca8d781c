use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
	#[error("request failed: {0}")]
	Network(String),

	#[error("unexpected status {0}")]
	Status(u16),
}

impl From<reqwest::Error> for FetchError {
	fn from(e: reqwest::Error) -> Self {
		match e.status() {
			Some(status) => Self::Status(status.as_u16()),
			None => Self::Network(e.to_string()),
		}
	}
}

#[derive(Debug, Error)]
pub enum ProviderError {
	#[error(transparent)]
	Fetch(#[from] FetchError),

	#[error("invalid endpoint: {0}")]
	Endpoint(#[from] url::ParseError),

	#[error("provider error {code}: {message}")]
	Api { code: i64, message: String },

	#[error("malformed payload: {0}")]
	Malformed(String),
}

#[derive(Debug, Error)]
pub enum SynthesisError {
	#[error("no credential configured")]
	MissingCredential,

	#[error("collaborator unreachable: {0}")]
	Transport(String),

	#[error("collaborator returned no text")]
	EmptyResponse,

	#[error("unparseable response: {0}")]
	Unparseable(String),

	#[error("response contained no nodes")]
	EmptyGraph,
}

impl From<FetchError> for SynthesisError {
	fn from(e: FetchError) -> Self {
		Self::Transport(e.to_string())
	}
}

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("storage unavailable")]
	Unavailable,

	#[error("write rejected for {0}")]
	Rejected(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}
