use super::{EntitySchema, FieldKind, FieldMapping, FieldValue, RefEncoding, Relationship, SyncEntity};
use crate::domain::EntityKind;
use crate::models::{Actor, Director, Experiment, Movie};

const fn names_of(target: EntityKind, inverse: &'static str) -> FieldKind {
    FieldKind::Relationship(Relationship {
        target,
        encoding: RefEncoding::Names,
        inverse: Some(inverse),
    })
}

fn text(value: Option<&String>) -> Option<FieldValue> {
    value.cloned().map(FieldValue::Text)
}

fn list(values: &[String]) -> Option<FieldValue> {
    Some(FieldValue::TextList(values.to_vec()))
}

impl SyncEntity for Movie {
    const KIND: EntityKind = EntityKind::Movie;

    fn schema() -> EntitySchema<Self> {
        EntitySchema {
            kind: EntityKind::Movie,
            rest_base: super::rest_base(EntityKind::Movie),
            fields: vec![
                FieldMapping::root(
                    "title",
                    "title",
                    |m: &Self| Some(FieldValue::Text(m.title.clone())),
                    |m: &mut Self, v| {
                        if let Some(title) = v.into_text() {
                            m.title = title;
                        }
                    },
                ),
                FieldMapping::root(
                    "slug",
                    "slug",
                    |m: &Self| text(m.slug.as_ref()),
                    |m: &mut Self, v| m.slug = v.into_text(),
                ),
                FieldMapping::meta(
                    "release_year",
                    "movie_year",
                    FieldKind::TEXT,
                    |m: &Self| text(m.release_year.as_ref()),
                    |m: &mut Self, v| m.release_year = v.into_text(),
                ),
                FieldMapping::meta(
                    "release_date",
                    "movie_release_date",
                    FieldKind::Date,
                    |m: &Self| m.release_date.map(FieldValue::Date),
                    |m: &mut Self, v| m.release_date = v.as_date(),
                ),
                FieldMapping::meta(
                    "imdb_id",
                    "movie_imdb_id",
                    FieldKind::TEXT,
                    |m: &Self| text(m.imdb_id.as_ref()),
                    |m: &mut Self, v| m.imdb_id = v.into_text(),
                ),
                FieldMapping::meta(
                    "tmdb_id",
                    "movie_tmdb_id",
                    FieldKind::INTEGER,
                    |m: &Self| m.tmdb_id.map(FieldValue::Integer),
                    |m: &mut Self, v| m.tmdb_id = v.as_integer(),
                ),
                FieldMapping::meta(
                    "overview",
                    "movie_overview",
                    FieldKind::TEXT,
                    |m: &Self| text(m.overview.as_ref()),
                    |m: &mut Self, v| m.overview = v.into_text(),
                ),
                FieldMapping::meta(
                    "runtime_minutes",
                    "movie_runtime",
                    FieldKind::INTEGER,
                    |m: &Self| m.runtime_minutes.map(FieldValue::Integer),
                    |m: &mut Self, v| m.runtime_minutes = v.as_integer(),
                ),
                FieldMapping::meta(
                    "rating",
                    "movie_rating",
                    FieldKind::NUMBER,
                    |m: &Self| m.rating.map(FieldValue::Number),
                    |m: &mut Self, v| m.rating = v.as_number(),
                ),
                FieldMapping::meta(
                    "genres",
                    "movie_genres",
                    FieldKind::RepeatableText,
                    |m: &Self| list(&m.genres),
                    |m: &mut Self, v| m.genres = v.into_text_list().unwrap_or_default(),
                ),
                FieldMapping::meta(
                    "movie_actors",
                    "movie_actors",
                    names_of(EntityKind::Actor, "related_movies_actor"),
                    |m: &Self| list(&m.movie_actors),
                    |m: &mut Self, v| m.movie_actors = v.into_text_list().unwrap_or_default(),
                ),
                FieldMapping::meta(
                    "movie_directors",
                    "movie_directors",
                    names_of(EntityKind::Director, "related_movies_director"),
                    |m: &Self| list(&m.movie_directors),
                    |m: &mut Self, v| m.movie_directors = v.into_text_list().unwrap_or_default(),
                ),
                FieldMapping::meta(
                    "poster_url",
                    "movie_poster_url",
                    FieldKind::TEXT,
                    |m: &Self| text(m.poster_url.as_ref()),
                    |m: &mut Self, v| m.poster_url = v.into_text(),
                ),
            ],
        }
    }

    fn display_title(&self) -> &str {
        &self.title
    }
}

impl SyncEntity for Actor {
    const KIND: EntityKind = EntityKind::Actor;

    fn schema() -> EntitySchema<Self> {
        EntitySchema {
            kind: EntityKind::Actor,
            rest_base: super::rest_base(EntityKind::Actor),
            fields: vec![
                FieldMapping::root(
                    "name",
                    "title",
                    |a: &Self| Some(FieldValue::Text(a.name.clone())),
                    |a: &mut Self, v| {
                        if let Some(name) = v.into_text() {
                            a.name = name;
                        }
                    },
                ),
                FieldMapping::root(
                    "slug",
                    "slug",
                    |a: &Self| text(a.slug.as_ref()),
                    |a: &mut Self, v| a.slug = v.into_text(),
                ),
                FieldMapping::meta(
                    "tmdb_id",
                    "actor_tmdb_id",
                    FieldKind::INTEGER,
                    |a: &Self| a.tmdb_id.map(FieldValue::Integer),
                    |a: &mut Self, v| a.tmdb_id = v.as_integer(),
                ),
                FieldMapping::meta(
                    "biography",
                    "actor_biography",
                    FieldKind::TEXT,
                    |a: &Self| text(a.biography.as_ref()),
                    |a: &mut Self, v| a.biography = v.into_text(),
                ),
                FieldMapping::meta(
                    "birthday",
                    "actor_birthday",
                    FieldKind::Date,
                    |a: &Self| a.birthday.map(FieldValue::Date),
                    |a: &mut Self, v| a.birthday = v.as_date(),
                ),
                FieldMapping::meta(
                    "deathday",
                    "actor_deathday",
                    FieldKind::Date,
                    |a: &Self| a.deathday.map(FieldValue::Date),
                    |a: &mut Self, v| a.deathday = v.as_date(),
                ),
                // The CMS field was created with a trailing underscore.
                FieldMapping::meta(
                    "place_of_birth",
                    "actor_place_of_birth_",
                    FieldKind::TEXT,
                    |a: &Self| text(a.place_of_birth.as_ref()),
                    |a: &mut Self, v| a.place_of_birth = v.into_text(),
                ),
                FieldMapping::meta(
                    "known_for",
                    "actor_known_for",
                    FieldKind::RepeatableText,
                    |a: &Self| list(&a.known_for),
                    |a: &mut Self, v| a.known_for = v.into_text_list().unwrap_or_default(),
                ),
                FieldMapping::meta(
                    "related_movies",
                    "related_movies_actor",
                    names_of(EntityKind::Movie, "movie_actors"),
                    |a: &Self| list(&a.related_movies),
                    |a: &mut Self, v| a.related_movies = v.into_text_list().unwrap_or_default(),
                ),
            ],
        }
    }

    fn display_title(&self) -> &str {
        &self.name
    }
}

impl SyncEntity for Director {
    const KIND: EntityKind = EntityKind::Director;

    fn schema() -> EntitySchema<Self> {
        EntitySchema {
            kind: EntityKind::Director,
            rest_base: super::rest_base(EntityKind::Director),
            fields: vec![
                FieldMapping::root(
                    "name",
                    "title",
                    |d: &Self| Some(FieldValue::Text(d.name.clone())),
                    |d: &mut Self, v| {
                        if let Some(name) = v.into_text() {
                            d.name = name;
                        }
                    },
                ),
                FieldMapping::root(
                    "slug",
                    "slug",
                    |d: &Self| text(d.slug.as_ref()),
                    |d: &mut Self, v| d.slug = v.into_text(),
                ),
                FieldMapping::meta(
                    "tmdb_id",
                    "director_tmdb_id",
                    FieldKind::INTEGER,
                    |d: &Self| d.tmdb_id.map(FieldValue::Integer),
                    |d: &mut Self, v| d.tmdb_id = v.as_integer(),
                ),
                FieldMapping::meta(
                    "biography",
                    "director_biography",
                    FieldKind::TEXT,
                    |d: &Self| text(d.biography.as_ref()),
                    |d: &mut Self, v| d.biography = v.into_text(),
                ),
                FieldMapping::meta(
                    "birthday",
                    "director_birthday",
                    FieldKind::Date,
                    |d: &Self| d.birthday.map(FieldValue::Date),
                    |d: &mut Self, v| d.birthday = v.as_date(),
                ),
                FieldMapping::meta(
                    "related_movies",
                    "related_movies_director",
                    names_of(EntityKind::Movie, "movie_directors"),
                    |d: &Self| list(&d.related_movies),
                    |d: &mut Self, v| d.related_movies = v.into_text_list().unwrap_or_default(),
                ),
            ],
        }
    }

    fn display_title(&self) -> &str {
        &self.name
    }
}

impl SyncEntity for Experiment {
    const KIND: EntityKind = EntityKind::Experiment;

    fn schema() -> EntitySchema<Self> {
        EntitySchema {
            kind: EntityKind::Experiment,
            rest_base: super::rest_base(EntityKind::Experiment),
            fields: vec![
                FieldMapping::root(
                    "title",
                    "title",
                    |e: &Self| Some(FieldValue::Text(e.title.clone())),
                    |e: &mut Self, v| {
                        if let Some(title) = v.into_text() {
                            e.title = title;
                        }
                    },
                ),
                FieldMapping::meta(
                    "experiment_date",
                    "experiment_date",
                    FieldKind::Date,
                    |e: &Self| e.experiment_date.map(FieldValue::Date),
                    |e: &mut Self, v| e.experiment_date = v.as_date(),
                ),
                FieldMapping::meta(
                    "host",
                    "experiment_host",
                    FieldKind::TEXT,
                    |e: &Self| text(e.host.as_ref()),
                    |e: &mut Self, v| e.host = v.into_text(),
                ),
                FieldMapping::meta(
                    "notes",
                    "experiment_notes",
                    FieldKind::TEXT,
                    |e: &Self| text(e.notes.as_ref()),
                    |e: &mut Self, v| e.notes = v.into_text(),
                ),
                FieldMapping::meta(
                    "movies",
                    "experiment_movies",
                    FieldKind::Relationship(Relationship {
                        target: EntityKind::Movie,
                        encoding: RefEncoding::RemoteIds,
                        inverse: Some("related_experiments"),
                    }),
                    |e: &Self| Some(FieldValue::IdList(e.movies.clone())),
                    |e: &mut Self, v| e.movies = v.into_id_list().unwrap_or_default(),
                ),
            ],
        }
    }

    fn display_title(&self) -> &str {
        &self.title
    }
}
