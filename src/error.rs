//! Error types for the aggregation and cache layer.

use thiserror::Error;

/// Errors surfaced by the upstream client, the cache tiers and the pokemon service.
#[derive(Error, Debug)]
pub enum Error {
  /// The identifier does not exist upstream. Never retried.
  #[error("{resource} \"{id}\" not found")]
  NotFound { resource: &'static str, id: String },

  /// Transport, status or decoding failure from an upstream call.
  #[error("PokeAPI error for {url}: {message}")]
  Upstream { url: String, message: String },

  /// Both the first attempt and its retry failed.
  #[error("Could not process data for Pokemon {id}: {first}; retry failed: {retry}")]
  Aggregation {
    id: String,
    first: Box<Error>,
    retry: Box<Error>,
  },

  /// A cache tier could not be read or written.
  #[error("Cache unavailable: {0}")]
  CacheUnavailable(String),

  #[error("Configuration error: {0}")]
  Config(String),
}

impl Error {
  pub fn pokemon_not_found(id: impl Into<String>) -> Self {
    Self::NotFound {
      resource: "Pokemon",
      id: id.into(),
    }
  }

  pub fn upstream(url: impl Into<String>, message: impl ToString) -> Self {
    Self::Upstream {
      url: url.into(),
      message: message.to_string(),
    }
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::NotFound { .. })
  }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_aggregation_message_names_both_causes() {
    let err = Error::Aggregation {
      id: "pikachu".to_string(),
      first: Box::new(Error::upstream("http://x/pokemon/pikachu", "502 Bad Gateway")),
      retry: Box::new(Error::upstream("http://x/pokemon/pikachu", "timed out")),
    };

    let message = err.to_string();
    assert!(message.contains("pikachu"));
    assert!(message.contains("502 Bad Gateway"));
    assert!(message.contains("timed out"));
  }

  #[test]
  fn test_not_found_detection() {
    assert!(Error::pokemon_not_found("missingno").is_not_found());
    assert!(!Error::upstream("u", "boom").is_not_found());
    assert!(!Error::CacheUnavailable("down".into()).is_not_found());
  }
}
