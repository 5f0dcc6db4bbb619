use tracing::{info, instrument};

use greenlight_core::AppError;
use greenlight_db::{Models, with_deadline};
use greenlight_models::{CreateMovieDto, Metadata, Movie, MovieFilters, UpdateMovieDto};

pub struct MovieService;

impl MovieService {
    #[instrument(skip(models, dto), fields(title = %dto.title))]
    pub async fn create_movie(models: &Models, dto: CreateMovieDto) -> Result<Movie, AppError> {
        let movie = with_deadline(models.movies.insert(&dto)).await?;
        info!(movie_id = movie.id, "movie created");
        Ok(movie)
    }

    #[instrument(skip(models))]
    pub async fn get_movie(models: &Models, id: i64) -> Result<Movie, AppError> {
        Ok(with_deadline(models.movies.get(id)).await?)
    }

    /// Applies the present fields of `dto` on top of the stored record. The
    /// write only lands if nobody else bumped the version in between.
    #[instrument(skip(models, dto))]
    pub async fn update_movie(
        models: &Models,
        id: i64,
        dto: UpdateMovieDto,
    ) -> Result<Movie, AppError> {
        let mut movie = with_deadline(models.movies.get(id)).await?;
        dto.apply(&mut movie);

        let movie = with_deadline(models.movies.update(&movie)).await?;
        info!(movie_id = movie.id, version = movie.version, "movie updated");
        Ok(movie)
    }

    #[instrument(skip(models))]
    pub async fn delete_movie(models: &Models, id: i64) -> Result<(), AppError> {
        with_deadline(models.movies.delete(id)).await?;
        info!(movie_id = id, "movie deleted");
        Ok(())
    }

    #[instrument(skip(models))]
    pub async fn list_movies(
        models: &Models,
        filters: MovieFilters,
    ) -> Result<(Vec<Movie>, Metadata), AppError> {
        Ok(with_deadline(models.movies.get_all(&filters)).await?)
    }
}
