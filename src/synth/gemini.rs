//! Gemini `generateContent` over REST.

use serde::{Deserialize, Serialize};
use url::Url;

use super::Collaborator;
use crate::error::{FetchError, SynthesisError};

const API_BASE: &str = "https://generativelanguage.googleapis.com/";

#[derive(Clone)]
pub struct GeminiCollaborator {
	client: reqwest::Client,
	api_key: String,
	model: String,
}

impl GeminiCollaborator {
	pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
		Self {
			client: reqwest::Client::new(),
			api_key: api_key.into(),
			model: model.into(),
		}
	}

	fn endpoint(&self) -> Result<Url, SynthesisError> {
		let mut url = Url::parse(API_BASE).map_err(|e| SynthesisError::Transport(e.to_string()))?;
		let method = format!("{}:generateContent", self.model);
		url.path_segments_mut()
			.map_err(|_| SynthesisError::Transport(format!("{API_BASE} cannot take a path")))?
			.pop_if_empty()
			.extend(["v1beta", "models", method.as_str()]);
		url.query_pairs_mut().append_pair("key", &self.api_key);
		Ok(url)
	}
}

#[derive(Serialize)]
struct Request<'a> {
	contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
	parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
	text: &'a str,
}

#[derive(Debug, Deserialize)]
struct Response {
	#[serde(default)]
	candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
	#[serde(default)]
	content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
	#[serde(default)]
	parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
	#[serde(default)]
	text: Option<String>,
}

impl Response {
	/// Text of the first candidate, parts concatenated.
	fn text(self) -> Option<String> {
		let candidate = self.candidates.into_iter().next()?;
		let text: String = candidate
			.content
			.parts
			.into_iter()
			.filter_map(|part| part.text)
			.collect();
		(!text.trim().is_empty()).then_some(text)
	}
}

impl Collaborator for GeminiCollaborator {
	async fn generate(&self, prompt: &str) -> Result<String, SynthesisError> {
		let url = self.endpoint()?;
		log::debug!("POST {}", crate::consumption::redact(&url));
		let body = Request {
			contents: [Content {
				parts: [Part { text: prompt }],
			}],
		};
		let response = self
			.client
			.post(url)
			.json(&body)
			.send()
			.await
			.map_err(FetchError::from)?;
		let status = response.status();
		if !status.is_success() {
			return Err(FetchError::Status(status.as_u16()).into());
		}
		let parsed: Response = response
			.json()
			.await
			.map_err(|e| SynthesisError::Unparseable(e.to_string()))?;
		parsed.text().ok_or(SynthesisError::EmptyResponse)
	}
}
