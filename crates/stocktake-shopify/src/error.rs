//! Error type for `stocktake-shopify`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Transport failure, timeout, or an undecodable response body. A
  /// product or collection missing its required identity fields
  /// (`id`, `handle`, `title`) also lands here: the wire types make
  /// those mandatory, so a malformed record fails decoding.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("unexpected status {status} fetching {url}")]
  UnexpectedStatus {
    status: reqwest::StatusCode,
    url:    String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
