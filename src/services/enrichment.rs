//! Enrichment of primary movie records with secondary provider data.
//!
//! The secondary provider is queried with the most specific key available
//! (IMDb id, then title and year, then title alone) and the first record it
//! returns is merged in. Nothing the secondary provider does can fail an
//! enrichment: errors and missing credentials degrade to primary-only output.

use crate::clients::ClientError;
use crate::clients::omdb::{MovieQuery, OmdbClient, OmdbMovie, SecondaryProvider};
use crate::clients::tmdb::{PrimaryProvider, TmdbClient};
use crate::config::MetadataConfig;
use crate::constants::providers::{NOT_AVAILABLE, ROTTEN_TOMATOES_BASE};
use crate::models::{EnrichedMovie, EnrichmentSource, PrimaryMovie};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, info, warn};

const ROTTEN_TOMATOES: &str = "Rotten Tomatoes";

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("no movie with TMDB id {0}")]
    NotFound(i64),

    #[error("{0}")]
    Configuration(ClientError),

    #[error(transparent)]
    Primary(ClientError),
}

impl From<ClientError> for EnrichmentError {
    fn from(err: ClientError) -> Self {
        if err.is_configuration() {
            Self::Configuration(err)
        } else {
            Self::Primary(err)
        }
    }
}

pub struct EnrichmentService {
    primary: Arc<dyn PrimaryProvider>,
    secondary: Arc<dyn SecondaryProvider>,
}

impl EnrichmentService {
    #[must_use]
    pub fn new(primary: Arc<dyn PrimaryProvider>, secondary: Arc<dyn SecondaryProvider>) -> Self {
        Self { primary, secondary }
    }

    #[must_use]
    pub fn from_config(config: &MetadataConfig) -> Self {
        Self::new(
            Arc::new(TmdbClient::new(config)),
            Arc::new(OmdbClient::new(config)),
        )
    }

    /// Fetches the primary record for `tmdb_id` and enriches it.
    ///
    /// Only primary failures are errors; see [`Self::enrich`].
    pub async fn movie_details(&self, tmdb_id: i64) -> Result<EnrichedMovie, EnrichmentError> {
        let movie = self
            .primary
            .movie(tmdb_id)
            .await?
            .ok_or(EnrichmentError::NotFound(tmdb_id))?;
        Ok(self.enrich(movie).await)
    }

    /// Adds whatever the secondary provider knows about `movie`.
    pub async fn enrich(&self, movie: PrimaryMovie) -> EnrichedMovie {
        let mut error_note = None;
        let mut found = None;

        for query in queries_for(&movie) {
            match self.secondary.lookup(&query).await {
                Ok(Some(record)) => {
                    debug!(tmdb_id = movie.tmdb_id, %query, "Secondary provider matched");
                    found = Some(record);
                    break;
                }
                Ok(None) => debug!(tmdb_id = movie.tmdb_id, %query, "No secondary match"),
                Err(e) => {
                    warn!(tmdb_id = movie.tmdb_id, error = %e, "Secondary lookup failed");
                    error_note = Some(e.to_string());
                    break;
                }
            }
        }

        let enriched = match found {
            Some(record) => merge(movie, &record),
            None => EnrichedMovie {
                enrichment_error: error_note,
                ..EnrichedMovie::primary_only(movie)
            },
        };

        let source = match enriched.enrichment_source {
            EnrichmentSource::PrimaryOnly => "primary_only",
            EnrichmentSource::PrimaryAndSecondary => "primary_and_secondary",
        };
        metrics::counter!("enrichment_requests_total", "source" => source).increment(1);
        info!(
            tmdb_id = enriched.movie.tmdb_id,
            source,
            fields = enriched.enriched_fields.len(),
            "Enrichment finished"
        );

        enriched
    }
}

/// Lookup tiers that apply to `movie`, most specific first.
#[must_use]
pub fn queries_for(movie: &PrimaryMovie) -> Vec<MovieQuery> {
    let mut queries = Vec::with_capacity(3);
    let title = Some(movie.title.trim()).filter(|t| !t.is_empty());

    if let Some(imdb_id) = movie.imdb_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        queries.push(MovieQuery::ImdbId(imdb_id.to_string()));
    }
    if let (Some(title), Some(year)) = (title, movie.year.as_deref().filter(|y| !y.is_empty())) {
        queries.push(MovieQuery::TitleYear {
            title: title.to_string(),
            year: year.to_string(),
        });
    }
    if let Some(title) = title {
        queries.push(MovieQuery::Title(title.to_string()));
    }

    queries
}

/// A real value from the secondary provider, or `None` for blanks and `N/A`.
fn present(value: Option<&String>) -> Option<&str> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && *s != NOT_AVAILABLE)
}

/// Rotten Tomatoes URL slug: lowercase, apostrophes dropped, other
/// separators collapsed to `_`.
#[must_use]
pub fn rotten_tomatoes_slug(title: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("Invalid regex"));

    let lowered = title.to_lowercase().replace(['\'', '\u{2019}'], "");
    re.replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Minutes from an OMDb runtime such as `"96 min"`.
#[must_use]
pub fn parse_runtime(runtime: &str) -> Option<i64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^\s*(\d+)\s*min").expect("Invalid regex"));

    re.captures(runtime)?.get(1)?.as_str().parse().ok()
}

/// Merges a secondary record into a primary one.
///
/// Secondary-exclusive fields are added; rating, vote count and runtime
/// prefer the secondary value when it has one; everything else stays primary.
#[must_use]
pub fn merge(movie: PrimaryMovie, secondary: &OmdbMovie) -> EnrichedMovie {
    let mut enriched = EnrichedMovie {
        enrichment_source: EnrichmentSource::PrimaryAndSecondary,
        ..EnrichedMovie::primary_only(movie)
    };
    let mut fields: Vec<String> = Vec::new();

    if let Some(rating) = secondary
        .ratings
        .iter()
        .find(|r| r.source == ROTTEN_TOMATOES)
        .and_then(|r| present(Some(&r.value)))
    {
        enriched.rotten_tomatoes_rating = Some(rating.to_string());
        let title = present(secondary.title.as_ref()).unwrap_or(&enriched.movie.title);
        let slug = rotten_tomatoes_slug(title);
        if !slug.is_empty() {
            enriched.rotten_tomatoes_url = Some(format!("{ROTTEN_TOMATOES_BASE}{slug}"));
        }
        fields.push("Ratings".to_string());
    }

    if let Some(score) = present(secondary.metascore.as_ref()).and_then(|s| s.parse().ok()) {
        enriched.metascore = Some(score);
        fields.push("Metascore".to_string());
    }

    let exclusive_text = [
        ("Rated", &secondary.rated, &mut enriched.content_rating),
        ("Awards", &secondary.awards, &mut enriched.awards),
        ("DVD", &secondary.dvd, &mut enriched.dvd_release),
        ("Website", &secondary.website, &mut enriched.website),
        ("BoxOffice", &secondary.box_office, &mut enriched.box_office),
    ];
    for (name, source, target) in exclusive_text {
        if let Some(value) = present(source.as_ref()) {
            *target = Some(value.to_string());
            fields.push(name.to_string());
        }
    }

    if let Some(plot) = present(secondary.plot.as_ref())
        && enriched.movie.overview.as_deref().map(str::trim) != Some(plot)
    {
        enriched.enhanced_plot = Some(plot.to_string());
        fields.push("Plot".to_string());
    }

    if let Some(rating) = present(secondary.imdb_rating.as_ref()).and_then(|r| r.parse().ok()) {
        enriched.movie.rating = Some(rating);
        fields.push("imdbRating".to_string());
    }

    if let Some(votes) =
        present(secondary.imdb_votes.as_ref()).and_then(|v| v.replace(',', "").parse().ok())
    {
        enriched.movie.vote_count = Some(votes);
        fields.push("imdbVotes".to_string());
    }

    if let Some(runtime) = present(secondary.runtime.as_ref()).and_then(parse_runtime) {
        enriched.movie.runtime = Some(runtime);
        fields.push("Runtime".to_string());
    }

    enriched.enriched_fields = fields;
    enriched
}
