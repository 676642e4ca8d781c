use url::Url;

use crate::error::{FetchError, ProviderError};

/// Text-over-HTTP GET, the only network access ingestion needs.
pub trait Fetch {
	async fn get_text(&self, url: Url) -> Result<String, FetchError>;
}

/// [`Fetch`] backed by `reqwest` (the browser `fetch` API on wasm).
#[derive(Clone, Default)]
pub struct HttpFetcher {
	client: reqwest::Client,
}

impl Fetch for HttpFetcher {
	async fn get_text(&self, url: Url) -> Result<String, FetchError> {
		log::debug!("GET {}", redact(&url));
		let response = self.client.get(url).send().await?;
		let status = response.status();
		if !status.is_success() {
			return Err(FetchError::Status(status.as_u16()));
		}
		Ok(response.text().await?)
	}
}

/// Builds `base/segment/...?query`, percent-encoding every part.
pub fn endpoint(base: &str, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ProviderError> {
	let mut url = Url::parse(base)?;
	if !segments.is_empty() {
		url.path_segments_mut()
			.map_err(|_| ProviderError::Malformed(format!("{base} cannot take a path")))?
			.pop_if_empty()
			.extend(segments);
	}
	if !query.is_empty() {
		url.query_pairs_mut().extend_pairs(query);
	}
	Ok(url)
}

/// The URL without credential-looking query parameters, for logs.
pub fn redact(url: &Url) -> String {
	let mut shown = url.clone();
	let pairs: Vec<(String, String)> = url
		.query_pairs()
		.map(|(k, v)| {
			let hidden = matches!(k.as_ref(), "api_key" | "key");
			(k.into_owned(), if hidden { "***".into() } else { v.into_owned() })
		})
		.collect();
	if pairs.is_empty() {
		return shown.to_string();
	}
	shown.query_pairs_mut().clear().extend_pairs(pairs);
	shown.to_string()
}
