use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Actor {
    pub name: String,
    pub slug: Option<String>,
    pub tmdb_id: Option<i64>,
    pub biography: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub deathday: Option<NaiveDate>,
    pub place_of_birth: Option<String>,
    pub known_for: Vec<String>,
    /// Movie titles. Computed by the CMS from each movie's `movie_actors`.
    pub related_movies: Vec<String>,
}
