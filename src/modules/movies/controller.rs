use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use serde_json::{Value, json};
use tracing::instrument;

use greenlight_core::AppError;
use greenlight_models::{CreateMovieDto, MovieFilters, UpdateMovieDto};

use super::service::MovieService;
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

/// Path ids must be positive integers; anything else is treated as not found.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::not_found(anyhow!("the requested resource could not be found")))
}

/// `GET /v1/movies`
#[instrument(skip(state))]
pub async fn list_movies(
    State(state): State<AppState>,
    ValidatedQuery(filters): ValidatedQuery<MovieFilters>,
) -> Result<Json<Value>, AppError> {
    let (movies, metadata) = MovieService::list_movies(&state.models, filters).await?;
    Ok(Json(json!({ "movies": movies, "metadata": metadata })))
}

/// `POST /v1/movies`
#[instrument(skip(state, dto))]
pub async fn create_movie(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateMovieDto>,
) -> Result<impl IntoResponse, AppError> {
    let movie = MovieService::create_movie(&state.models, dto).await?;

    let mut headers = HeaderMap::new();
    let location = format!("/v1/movies/{}", movie.id);
    if let Ok(value) = HeaderValue::from_str(&location) {
        headers.insert(header::LOCATION, value);
    }

    Ok((StatusCode::CREATED, headers, Json(json!({ "movie": movie }))))
}

/// `GET /v1/movies/{id}`
#[instrument(skip(state))]
pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let movie = MovieService::get_movie(&state.models, parse_id(&id)?).await?;
    Ok(Json(json!({ "movie": movie })))
}

/// `PATCH /v1/movies/{id}`
#[instrument(skip(state, dto))]
pub async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateMovieDto>,
) -> Result<Json<Value>, AppError> {
    let movie = MovieService::update_movie(&state.models, parse_id(&id)?, dto).await?;
    Ok(Json(json!({ "movie": movie })))
}

/// `DELETE /v1/movies/{id}`
#[instrument(skip(state))]
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    MovieService::delete_movie(&state.models, parse_id(&id)?).await?;
    Ok(Json(json!({ "message": "movie successfully deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(parse_id("0").is_err());
        assert!(parse_id("-3").is_err());
        assert!(parse_id("abc").is_err());
    }
}
