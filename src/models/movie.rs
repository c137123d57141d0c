use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Movie {
    pub title: String,
    pub slug: Option<String>,
    /// Kept as text: the catalog has entries like "1991" and "1989-1991".
    pub release_year: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<i64>,
    pub overview: Option<String>,
    pub runtime_minutes: Option<i64>,
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    /// Actor names, mirrored remotely by the actors' `related_movies_actor`.
    pub movie_actors: Vec<String>,
    pub movie_directors: Vec<String>,
    pub poster_url: Option<String>,
}

impl Movie {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}
