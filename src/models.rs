use serde::{Deserialize, Serialize};

use crate::{
    entities::{actor, movie},
    error::AppError,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Actor {
    pub id: i64,
    pub name: String,
}

impl From<actor::Model> for Actor {
    fn from(m: actor::Model) -> Self {
        Self { id: m.id, name: m.name }
    }
}

/// Movie as returned by the write endpoints: the actor ids are echoed exactly as
/// they were submitted, unresolved.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub year: String,
    pub director: String,
    pub description: String,
    pub actor_ids: Vec<i64>,
}

/// Movie as returned by the read endpoints, with linked actors resolved.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieWithActors {
    pub id: i64,
    pub title: String,
    pub year: Option<String>,
    pub director: String,
    pub description: String,
    pub actors: Vec<Actor>,
}

impl MovieWithActors {
    pub fn from_model(m: movie::Model, actors: Vec<Actor>) -> Self {
        Self {
            id: m.id,
            title: m.title,
            year: m.year,
            director: m.director.unwrap_or_default(),
            description: m.description.unwrap_or_default(),
            actors,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewActor {
    pub name: String,
}

impl NewActor {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
        Ok(())
    }
}

/// Body of `POST /movies` and `PUT /movies/{id}`.
#[derive(Clone, Debug, Deserialize)]
pub struct MovieInput {
    pub title: String,
    pub year: String,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub actor_ids: Vec<i64>,
}

impl MovieInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }
        Ok(())
    }

    pub fn into_movie(self, id: i64) -> Movie {
        Movie {
            id,
            title: self.title,
            year: self.year,
            director: self.director,
            description: self.description,
            actor_ids: self.actor_ids,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_input_defaults_optional_fields() {
        let input: MovieInput =
            serde_json::from_str(r#"{"title":"Cast Away","year":"2000"}"#).unwrap();
        assert_eq!(input.director, "");
        assert_eq!(input.description, "");
        assert!(input.actor_ids.is_empty());
    }

    #[test]
    fn write_response_echoes_year_verbatim() {
        let input: MovieInput =
            serde_json::from_str(r#"{"title":"Cast Away","year":"circa 2000"}"#).unwrap();
        let movie = input.into_movie(7);
        assert_eq!(movie.year, "circa 2000");
        assert_eq!(serde_json::to_value(&movie).unwrap()["year"], "circa 2000");
    }

    #[test]
    fn movie_input_requires_year_as_text() {
        assert!(serde_json::from_str::<MovieInput>(r#"{"title":"Cast Away"}"#).is_err());
        assert!(
            serde_json::from_str::<MovieInput>(r#"{"title":"Cast Away","year":2000}"#).is_err()
        );
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(NewActor { name: "  ".into() }.validate().is_err());
        assert!(NewActor { name: "Tom Hanks".into() }.validate().is_ok());
    }

    #[test]
    fn legacy_null_columns_read_as_empty_text() {
        let m = movie::Model {
            id: 3,
            title: "Heat".into(),
            year: None,
            director: None,
            description: None,
        };
        let out = MovieWithActors::from_model(m, vec![]);
        assert_eq!(out.director, "");
        assert_eq!(out.description, "");
        assert_eq!(out.year, None);
    }
}
