use serde::{Deserialize, Serialize};

/// Movie details as reported by the primary metadata provider (TMDB).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimaryMovie {
    pub tmdb_id: i64,
    pub title: String,
    pub original_title: Option<String>,
    pub year: Option<String>,
    pub release_date: Option<String>,
    pub imdb_id: Option<String>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub runtime: Option<i64>,
    pub rating: Option<f64>,
    pub vote_count: Option<u64>,
    pub budget: Option<u64>,
    pub revenue: Option<u64>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub poster_url: Option<String>,
    pub homepage: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentSource {
    #[default]
    PrimaryOnly,
    PrimaryAndSecondary,
}

/// Primary record plus whatever the secondary provider could add.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichedMovie {
    #[serde(flatten)]
    pub movie: PrimaryMovie,

    pub rotten_tomatoes_rating: Option<String>,
    pub rotten_tomatoes_url: Option<String>,
    pub metascore: Option<u32>,
    pub content_rating: Option<String>,
    pub awards: Option<String>,
    pub dvd_release: Option<String>,
    pub website: Option<String>,
    /// Secondary plot, kept only when it differs from the primary overview.
    pub enhanced_plot: Option<String>,
    pub box_office: Option<String>,

    pub enrichment_source: EnrichmentSource,
    /// Secondary field names that contributed a value.
    #[serde(default)]
    pub enriched_fields: Vec<String>,
    pub enrichment_error: Option<String>,
}

impl EnrichedMovie {
    /// Wraps a primary record with no secondary contribution.
    #[must_use]
    pub fn primary_only(movie: PrimaryMovie) -> Self {
        Self {
            movie,
            ..Self::default()
        }
    }
}
