use super::{ClientError, error_message, http_client};
use crate::config::MetadataConfig;
use crate::constants::USER_AGENT;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::debug;
use url::Url;

const SERVICE: &str = "OMDb";

/// One lookup strategy against the secondary provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieQuery {
    ImdbId(String),
    TitleYear { title: String, year: String },
    Title(String),
}

impl fmt::Display for MovieQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImdbId(id) => write!(f, "imdb id {id}"),
            Self::TitleYear { title, year } => write!(f, "\"{title}\" ({year})"),
            Self::Title(title) => write!(f, "\"{title}\""),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OmdbRating {
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Secondary provider record. Every field is raw text; `"N/A"` marks a
/// missing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OmdbMovie {
    pub title: Option<String>,
    pub year: Option<String>,
    pub rated: Option<String>,
    pub released: Option<String>,
    pub runtime: Option<String>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub actors: Option<String>,
    pub plot: Option<String>,
    pub awards: Option<String>,
    pub poster: Option<String>,
    pub ratings: Vec<OmdbRating>,
    pub metascore: Option<String>,
    #[serde(rename = "imdbRating")]
    pub imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes")]
    pub imdb_votes: Option<String>,
    #[serde(rename = "imdbID")]
    pub imdb_id: Option<String>,
    #[serde(rename = "DVD")]
    pub dvd: Option<String>,
    pub box_office: Option<String>,
    pub website: Option<String>,
}

/// Source of secondary movie records.
#[async_trait]
pub trait SecondaryProvider: Send + Sync {
    /// `Ok(None)` is a soft not-found; the caller may try another query.
    async fn lookup(&self, query: &MovieQuery) -> Result<Option<OmdbMovie>, ClientError>;
}

#[derive(Clone)]
pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OmdbClient {
    #[must_use]
    pub fn new(config: &MetadataConfig) -> Self {
        Self {
            client: http_client(USER_AGENT, config.request_timeout_seconds),
            base_url: config.omdb_base_url.clone(),
            api_key: config.omdb_api_key.clone().filter(|k| !k.is_empty()),
        }
    }

    fn url(&self, api_key: &str, query: &MovieQuery) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url).map_err(|source| ClientError::Url {
            service: SERVICE,
            source,
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("apikey", api_key).append_pair("plot", "full");
            match query {
                MovieQuery::ImdbId(id) => pairs.append_pair("i", id),
                MovieQuery::TitleYear { title, year } => {
                    pairs.append_pair("t", title).append_pair("y", year)
                }
                MovieQuery::Title(title) => pairs.append_pair("t", title),
            };
        }
        Ok(url)
    }
}

/// Splits an OMDb answer into a record or a soft not-found.
fn parse_response(body: Value) -> Result<Option<OmdbMovie>, ClientError> {
    match body.get("Response").and_then(Value::as_str) {
        Some(r) if r.eq_ignore_ascii_case("false") => {
            debug!(
                error = body.get("Error").and_then(serde_json::Value::as_str).unwrap_or(""),
                "OMDb returned no result"
            );
            Ok(None)
        }
        Some(_) => serde_json::from_value(body)
            .map(Some)
            .map_err(|e| ClientError::invalid(SERVICE, e.to_string())),
        None => Err(ClientError::invalid(SERVICE, "missing Response field")),
    }
}

#[async_trait]
impl SecondaryProvider for OmdbClient {
    async fn lookup(&self, query: &MovieQuery) -> Result<Option<OmdbMovie>, ClientError> {
        let api_key = self.api_key.as_deref().ok_or(ClientError::NotConfigured {
            service: SERVICE,
            setting: "metadata.omdb_api_key",
        })?;
        let url = self.url(api_key, query)?;

        debug!("Querying OMDb by {}", query);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::network(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let (_, message) = error_message(response).await;
            return Err(ClientError::Status {
                service: SERVICE,
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ClientError::network(SERVICE, e))?;
        parse_response(body)
    }
}
