use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Director {
    pub name: String,
    pub slug: Option<String>,
    pub tmdb_id: Option<i64>,
    pub biography: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub related_movies: Vec<String>,
}
