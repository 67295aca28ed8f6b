use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::api_types::{ApiGeneration, ApiPokemon, ApiPokemonList, ApiSpecies, ApiType};
use super::PokeApi;
use crate::config::PokeApiConfig;
use crate::error::{Error, Result};

/// HTTP client for PokeAPI
#[derive(Clone)]
pub struct PokeApiClient {
  http: reqwest::Client,
  base_url: Url,
}

impl PokeApiClient {
  pub fn new(config: &PokeApiConfig) -> Result<Self> {
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| Error::Config(format!("Invalid PokeAPI URL {}: {}", config.base_url, e)))?;
    if base_url.cannot_be_a_base() {
      return Err(Error::Config(format!(
        "PokeAPI URL {} cannot be used as a base URL",
        config.base_url
      )));
    }

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(concat!("pokecache/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Self { http, base_url })
  }

  /// Build `<base>/<segments...>`, percent-encoding each segment.
  fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base_url.clone();
    // The base was checked in `new`, so path segments are always available
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  fn list_url(&self, limit: usize, offset: usize) -> Url {
    let mut url = self.endpoint(&["pokemon"]);
    url
      .query_pairs_mut()
      .append_pair("limit", &limit.to_string())
      .append_pair("offset", &offset.to_string());
    url
  }

  async fn send(&self, url: &str) -> Result<reqwest::Response> {
    debug!(url, "GET");
    self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| Error::upstream(url, e))
  }

  async fn read_body(url: &str, response: reqwest::Response) -> Result<Vec<u8>> {
    let status = response.status();
    if !status.is_success() {
      return Err(Error::upstream(url, format!("HTTP {}", status)));
    }

    let body = response
      .bytes()
      .await
      .map_err(|e| Error::upstream(url, e))?;
    Ok(body.to_vec())
  }

  fn decode<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body)
      .map_err(|e| Error::upstream(url, format!("Failed to parse response: {}", e)))
  }

  async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
    let response = self.send(url).await?;
    let body = Self::read_body(url, response).await?;
    Self::decode(url, &body)
  }
}

#[async_trait]
impl PokeApi for PokeApiClient {
  async fn fetch_list(&self, limit: usize, offset: usize) -> Result<ApiPokemonList> {
    self.get_json(self.list_url(limit, offset).as_str()).await
  }

  async fn fetch_detail(&self, id_or_name: &str) -> Result<ApiPokemon> {
    let url = self.endpoint(&["pokemon", id_or_name]);
    let response = self.send(url.as_str()).await?;

    if response.status() == StatusCode::NOT_FOUND {
      return Err(Error::pokemon_not_found(id_or_name));
    }

    let body = Self::read_body(url.as_str(), response).await?;
    Self::decode(url.as_str(), &body)
  }

  async fn fetch_species(&self, id_or_name: &str) -> Result<ApiSpecies> {
    let url = self.endpoint(&["pokemon-species", id_or_name]);
    self.get_json(url.as_str()).await
  }

  async fn fetch_type(&self, url: &str) -> Result<ApiType> {
    self.get_json(url).await
  }

  async fn fetch_generation(&self, url: &str) -> Result<ApiGeneration> {
    self.get_json(url).await
  }

  async fn fetch_binary(&self, url: &str) -> Result<Vec<u8>> {
    let response = self.send(url).await?;
    Self::read_body(url, response).await
  }
}
