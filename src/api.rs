// API client module: contains a small blocking HTTP client that talks to
// the trace.moe reverse image search service. It is intentionally small
// and synchronous; the whole program is one request/response cycle.

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{multipart, Client};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use tracing::debug;

const DEFAULT_API_URL: &str = "https://api.trace.moe";

/// Simple API client that holds a reqwest blocking client and the base
/// URL of the search service.
pub struct SearchClient {
    client: Client,
    base_url: String,
}

/// Top-level response shape of `/search`. The service reports quota and
/// processing failures in `error` rather than through the HTTP status.
#[derive(Deserialize, Debug, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Vec<SceneMatch>,
}

/// One candidate match. Only the first element of `result` is ever shown.
#[derive(Deserialize, Debug, Clone)]
pub struct SceneMatch {
    pub similarity: f64,
    /// Absent or null for movies; rendered as episode 0.
    #[serde(default)]
    pub episode: Option<i64>,
    pub from: f64,
    pub to: f64,
    pub anilist: AnilistInfo,
}

/// AniList metadata attached to a match when `anilistInfo` is requested.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct AnilistInfo {
    #[serde(default)]
    pub title: AnimeTitle,
    #[serde(rename = "isAdult", default)]
    pub is_adult: bool,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct AnimeTitle {
    #[serde(default)]
    pub native: Option<String>,
    #[serde(default)]
    pub romaji: Option<String>,
    #[serde(default)]
    pub english: Option<String>,
}

impl SearchResponse {
    /// The first (highest-similarity) match, or an error when the service
    /// returned an empty result set.
    pub fn best_match(&self) -> Result<&SceneMatch> {
        self.result.first().ok_or_else(|| anyhow!("No match found"))
    }
}

impl SearchClient {
    /// Create a SearchClient configured from the environment variable
    /// `TRACE_MOE_API_URL` or fallback to the public trace.moe endpoint.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("TRACE_MOE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("anitrace/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(SearchClient {
            client,
            base_url: base_url.into(),
        })
    }

    /// Search by uploading a local image file as multipart/form-data. The
    /// file is streamed from the open handle into the request body, with
    /// one part named `image` carrying the file's base name.
    pub fn search_by_file(&self, path: &Path) -> Result<SearchResponse> {
        let url = format!("{}/search?anilistInfo", self.base_url);

        let file = File::open(path)
            .with_context(|| format!("Failed to open image file {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();

        let part = multipart::Part::reader(file).file_name(file_name);
        let form = multipart::Form::new().part("image", part);

        debug!("POST {}", url);
        let res = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .context("Failed to send search request")?;
        decode_response(res)
    }

    /// Search by a direct image URL; the service downloads the image
    /// itself, so this is a plain GET with a query parameter.
    pub fn search_by_url(&self, image_url: &str) -> Result<SearchResponse> {
        let url = format!("{}/search?anilistInfo", self.base_url);

        debug!("GET {} url={}", url, image_url);
        let res = self
            .client
            .get(&url)
            .query(&[("url", image_url)])
            .send()
            .context("Failed to send search request")?;
        decode_response(res)
    }
}

fn decode_response(res: reqwest::blocking::Response) -> Result<SearchResponse> {
    let status = res.status();
    let body = res
        .bytes()
        .context("Failed to read search response body")?;
    debug!("search response: {} ({} bytes)", status, body.len());

    if !status.is_success() {
        anyhow::bail!(
            "Search failed: {} - {}",
            status,
            String::from_utf8_lossy(&body)
        );
    }

    let parsed: SearchResponse =
        serde_json::from_slice(&body).context("Failed to parse search response JSON")?;
    if let Some(err) = parsed.error.as_deref().filter(|e| !e.is_empty()) {
        anyhow::bail!("Search failed: {}", err);
    }
    Ok(parsed)
}
