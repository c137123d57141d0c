use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A screening session ("experiment") in which one or more movies were shown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experiment {
    pub title: String,
    pub experiment_date: Option<NaiveDate>,
    pub host: Option<String>,
    pub notes: Option<String>,
    /// Remote post ids of the movies shown.
    pub movies: Vec<i64>,
}
