use crate::pokemon::{PageResponse, Pokemon, PokemonDetail};
use async_trait::async_trait;
use image::RgbaImage;
use reqwest::{StatusCode, Url};

#[derive(Debug)]
pub enum ApiError {
    NetworkError(String),
    DecodeError(String),
    NotFoundError(String),
    ImageError(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            ApiError::DecodeError(msg) => write!(f, "Decode error: {}", msg),
            ApiError::NotFoundError(what) => write!(f, "Not found: {}", what),
            ApiError::ImageError(msg) => write!(f, "Image error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::DecodeError(err.to_string())
        } else {
            ApiError::NetworkError(err.to_string())
        }
    }
}

impl From<image::ImageError> for ApiError {
    fn from(err: image::ImageError) -> Self {
        ApiError::ImageError(err.to_string())
    }
}

/// Remote source of Pokémon data. Failures propagate immediately; no retries.
#[async_trait]
pub trait PokeApi: Send + Sync {
    async fn fetch_page(&self, limit: u32, offset: u32) -> Result<PageResponse, ApiError>;

    async fn fetch_detail(&self, name: &str) -> Result<PokemonDetail, ApiError>;

    /// Downloads and decodes a sprite image.
    async fn fetch_sprite(&self, url: &str) -> Result<RgbaImage, ApiError>;
}

/// PokéAPI client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPokeApi {
    client: reqwest::Client,
    api_url: String,
}

impl HttpPokeApi {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `api_url` with `segments` appended, each percent-encoded as a single segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.api_url).map_err(|e| {
            tracing::error!("Invalid API url {}: {}", self.api_url, e);
            ApiError::NetworkError(format!("invalid API url {}: {}", self.api_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| ApiError::NetworkError(format!("API url cannot be a base: {}", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: &str, what: &str) -> Result<reqwest::Response, ApiError> {
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!("Failed to make HTTP request to {}: {}", url, e);
            ApiError::NetworkError(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("{} returned 404", url);
            return Err(ApiError::NotFoundError(what.to_string()));
        }
        if !status.is_success() {
            let error_msg = format!("API request failed with status: {}", status);
            tracing::error!("{}", error_msg);
            return Err(ApiError::NetworkError(error_msg));
        }

        Ok(response)
    }
}

#[async_trait]
impl PokeApi for HttpPokeApi {
    async fn fetch_page(&self, limit: u32, offset: u32) -> Result<PageResponse, ApiError> {
        let mut url = self.endpoint(&["pokemon"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        let response = self.get(url.as_str(), "pokemon page").await?;

        let page = response.json::<PageResponse>().await.map_err(|e| {
            tracing::error!("Failed to parse JSON response from {}: {}", url, e);
            ApiError::DecodeError(format!("JSON parsing failed: {}", e))
        })?;

        tracing::debug!(
            "Fetched page offset={} with {} results (count {})",
            offset,
            page.results.len(),
            page.count
        );
        Ok(page)
    }

    async fn fetch_detail(&self, name: &str) -> Result<PokemonDetail, ApiError> {
        let segment = name.to_lowercase();
        let url = self.endpoint(&["pokemon", segment.as_str()])?;
        let response = self.get(url.as_str(), name).await?;

        let pokemon = response.json::<Pokemon>().await.map_err(|e| {
            tracing::error!("Failed to parse JSON response from {}: {}", url, e);
            ApiError::DecodeError(format!("JSON parsing failed: {}", e))
        })?;

        tracing::debug!("Successfully fetched Pokemon: {} (ID: {})", pokemon.name, pokemon.id);
        Ok(PokemonDetail::from(pokemon))
    }

    async fn fetch_sprite(&self, url: &str) -> Result<RgbaImage, ApiError> {
        let response = self.get(url, url).await?;
        let bytes = response.bytes().await?;

        let image = image::load_from_memory(&bytes).map_err(|e| {
            tracing::error!("Failed to decode sprite {}: {}", url, e);
            ApiError::from(e)
        })?;

        Ok(image.to_rgba8())
    }
}
