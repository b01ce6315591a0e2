use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, Path, State},
    http::request::Parts,
    routing::get,
};

use crate::{
    error::{AppError, AppResult},
    models::{Actor, Message, Movie, MovieInput, MovieWithActors, NewActor},
    repo::{ActorRepo, MovieRepo},
};

#[derive(Clone)]
pub struct AppState {
    pub actors: ActorRepo,
    pub movies: MovieRepo,
}

/// JSON body whose decode failures surface as [`AppError::Validation`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ValidJson<T>(pub T);

/// Integer `{movie_id}` path segment.
pub struct MovieId(pub i64);

impl<S> FromRequestParts<S> for MovieId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state).await?;
        Ok(Self(id))
    }
}

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/actors", get(list_actors).post(create_actor))
        .route("/movies", get(list_movies).post(create_movie).delete(delete_all_movies))
        .route("/movies/{movie_id}", get(get_movie).put(update_movie).delete(delete_movie))
}

async fn create_actor(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<NewActor>,
) -> AppResult<Json<Actor>> {
    req.validate()?;
    Ok(Json(state.actors.create(&req.name).await?))
}

async fn list_actors(State(state): State<AppState>) -> AppResult<Json<Vec<Actor>>> {
    Ok(Json(state.actors.list().await?))
}

async fn create_movie(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<MovieInput>,
) -> AppResult<Json<Movie>> {
    req.validate()?;
    Ok(Json(state.movies.create(req).await?))
}

async fn update_movie(
    State(state): State<AppState>,
    MovieId(movie_id): MovieId,
    ValidJson(req): ValidJson<MovieInput>,
) -> AppResult<Json<Movie>> {
    req.validate()?;
    Ok(Json(state.movies.update(movie_id, req).await?))
}

async fn list_movies(State(state): State<AppState>) -> AppResult<Json<Vec<MovieWithActors>>> {
    Ok(Json(state.movies.list().await?))
}

async fn get_movie(
    State(state): State<AppState>,
    MovieId(movie_id): MovieId,
) -> AppResult<Json<MovieWithActors>> {
    state
        .movies
        .get(movie_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Movie not found".into()))
}

async fn delete_movie(
    State(state): State<AppState>,
    MovieId(movie_id): MovieId,
) -> AppResult<Json<Message>> {
    state.movies.delete(movie_id).await?;
    Ok(Json(Message::new(format!("Movie with id={movie_id} deleted successfully"))))
}

async fn delete_all_movies(State(state): State<AppState>) -> AppResult<Json<Message>> {
    state.movies.delete_all().await?;
    Ok(Json(Message::new("All movies deleted successfully")))
}
