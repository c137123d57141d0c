use super::{ClientError, error_message, http_client};
use crate::config::MetadataConfig;
use crate::constants::{USER_AGENT, providers::TMDB_IMAGE_BASE};
use crate::models::PrimaryMovie;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

const SERVICE: &str = "TMDB";

/// Source of primary movie records.
#[async_trait]
pub trait PrimaryProvider: Send + Sync {
    /// `Ok(None)` when the provider has no movie with that id.
    async fn movie(&self, tmdb_id: i64) -> Result<Option<PrimaryMovie>, ClientError>;
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: i64,
    title: String,
    original_title: Option<String>,
    release_date: Option<String>,
    imdb_id: Option<String>,
    overview: Option<String>,
    tagline: Option<String>,
    runtime: Option<i64>,
    vote_average: Option<f64>,
    vote_count: Option<u64>,
    budget: Option<u64>,
    revenue: Option<u64>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    poster_path: Option<String>,
    homepage: Option<String>,
    external_ids: Option<TmdbExternalIds>,
}

#[derive(Debug, Deserialize)]
struct TmdbExternalIds {
    imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    name: String,
}

/// TMDB reports unknown values as empty strings and zeroes.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<TmdbMovie> for PrimaryMovie {
    fn from(m: TmdbMovie) -> Self {
        let release_date = present(m.release_date);
        Self {
            tmdb_id: m.id,
            year: release_date
                .as_deref()
                .and_then(|d| d.get(..4))
                .map(String::from),
            title: m.title,
            original_title: present(m.original_title),
            release_date,
            imdb_id: present(m.imdb_id)
                .or_else(|| m.external_ids.and_then(|ids| present(ids.imdb_id))),
            overview: present(m.overview),
            tagline: present(m.tagline),
            runtime: m.runtime.filter(|r| *r > 0),
            rating: m.vote_average.filter(|r| *r > 0.0),
            vote_count: m.vote_count.filter(|c| *c > 0),
            budget: m.budget.filter(|b| *b > 0),
            revenue: m.revenue.filter(|r| *r > 0),
            genres: m.genres.into_iter().map(|g| g.name).collect(),
            poster_url: present(m.poster_path).map(|p| format!("{TMDB_IMAGE_BASE}{p}")),
            homepage: present(m.homepage),
        }
    }
}

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl TmdbClient {
    #[must_use]
    pub fn new(config: &MetadataConfig) -> Self {
        Self {
            client: http_client(USER_AGENT, config.request_timeout_seconds),
            base_url: config.tmdb_base_url.trim_end_matches('/').to_string(),
            api_key: config.tmdb_api_key.clone().filter(|k| !k.is_empty()),
        }
    }
}

#[async_trait]
impl PrimaryProvider for TmdbClient {
    async fn movie(&self, tmdb_id: i64) -> Result<Option<PrimaryMovie>, ClientError> {
        let api_key = self.api_key.as_deref().ok_or(ClientError::NotConfigured {
            service: SERVICE,
            setting: "metadata.tmdb_api_key",
        })?;

        let mut url = Url::parse(&format!("{}/movie/{tmdb_id}", self.base_url))
            .map_err(|source| ClientError::Url {
                service: SERVICE,
                source,
            })?;
        url.query_pairs_mut()
            .append_pair("api_key", api_key)
            .append_pair("append_to_response", "external_ids");

        debug!("Fetching TMDB movie {}", tmdb_id);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::network(SERVICE, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let movie: TmdbMovie = response
                    .json()
                    .await
                    .map_err(|e| ClientError::network(SERVICE, e))?;
                Ok(Some(movie.into()))
            }
            status => {
                let (_, message) = error_message(response).await;
                Err(ClientError::Status {
                    service: SERVICE,
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmdb_movie_normalizes_empty_values() {
        let raw: TmdbMovie = serde_json::from_value(serde_json::json!({
            "id": 18079,
            "title": "Samurai Cop",
            "original_title": "Samurai Cop",
            "release_date": "1991-03-01",
            "imdb_id": "",
            "external_ids": { "imdb_id": "tt0130236" },
            "overview": "",
            "runtime": 96,
            "vote_average": 4.6,
            "vote_count": 0,
            "budget": 0,
            "genres": [{ "id": 28, "name": "Action" }, { "id": 80, "name": "Crime" }],
            "poster_path": "/samurai.jpg",
            "homepage": ""
        }))
        .unwrap();

        let movie = PrimaryMovie::from(raw);
        assert_eq!(movie.year.as_deref(), Some("1991"));
        assert_eq!(movie.imdb_id.as_deref(), Some("tt0130236"));
        assert_eq!(movie.overview, None);
        assert_eq!(movie.vote_count, None);
        assert_eq!(movie.budget, None);
        assert_eq!(movie.homepage, None);
        assert_eq!(movie.genres, vec!["Action", "Crime"]);
        assert_eq!(
            movie.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/samurai.jpg")
        );
    }

    #[tokio::test]
    async fn missing_api_key_is_a_configuration_error() {
        let client = TmdbClient::new(&MetadataConfig {
            tmdb_api_key: None,
            ..MetadataConfig::default()
        });
        let err = client.movie(18079).await.unwrap_err();
        assert!(err.is_configuration());
    }
}
