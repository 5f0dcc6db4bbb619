//! PostgreSQL implementation of the repository traits.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, PgPool};

use greenlight_models::{
    CreateMovieDto, Metadata, Movie, MovieFilters, Permissions, Token, TokenScope, User,
};

use crate::error::{Result, StoreError};
use crate::repositories::{
    MovieRepository, NewUser, PermissionRepository, TokenRepository, UserRepository,
};

const USER_COLUMNS: &str = "id, created_at, name, email, password_hash, activated, version";
const MOVIE_COLUMNS: &str = "id, created_at, title, year, runtime, genres, version";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, activated) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.activated)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn get(&self, id: i64) -> Result<User> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::RecordNotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::RecordNotFound)
    }

    async fn update(&self, user: &User) -> Result<User> {
        let query = format!(
            "UPDATE users \
             SET name = $1, email = $2, password_hash = $3, activated = $4, version = version + 1 \
             WHERE id = $5 AND version = $6 \
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.activated)
            .bind(user.id)
            .bind(user.version)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::EditConflict)
    }

    async fn get_for_token(&self, scope: TokenScope, hash: &[u8]) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT users.id, users.created_at, users.name, users.email,
                   users.password_hash, users.activated, users.version
            FROM users
            INNER JOIN tokens ON users.id = tokens.user_id
            WHERE tokens.hash = $1
              AND tokens.scope = $2
              AND tokens.expiry > $3
            "#,
        )
        .bind(hash)
        .bind(scope.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::RecordNotFound)?;

        Ok(user)
    }
}

#[async_trait]
impl TokenRepository for PgStore {
    async fn insert(&self, token: &Token) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tokens (hash, user_id, expiry, scope)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&token.hash)
        .bind(token.user_id)
        .bind(token.expiry)
        .bind(token.scope.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_all_for_user(&self, scope: TokenScope, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM tokens WHERE scope = $1 AND user_id = $2")
            .bind(scope.as_str())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl PermissionRepository for PgStore {
    async fn get_all_for_user(&self, user_id: i64) -> Result<Permissions> {
        let codes: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT permissions.code
            FROM permissions
            INNER JOIN users_permissions ON users_permissions.permission_id = permissions.id
            WHERE users_permissions.user_id = $1
            ORDER BY permissions.code
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Permissions::from(codes))
    }

    async fn add_for_user(&self, user_id: i64, codes: &[&str]) -> Result<()> {
        let codes: Vec<String> = codes.iter().map(|code| code.to_string()).collect();

        sqlx::query(
            r#"
            INSERT INTO users_permissions (user_id, permission_id)
            SELECT $1, permissions.id FROM permissions WHERE permissions.code = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(codes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(FromRow)]
struct MovieWithTotal {
    total: i64,
    #[sqlx(flatten)]
    movie: Movie,
}

/// Maps a safelisted sort column onto a literal column name so no request
/// text is ever spliced into SQL.
fn order_column(filters: &MovieFilters) -> &'static str {
    match filters.sort_column() {
        "title" => "title",
        "year" => "year",
        "runtime" => "runtime",
        _ => "id",
    }
}

#[async_trait]
impl MovieRepository for PgStore {
    async fn insert(&self, movie: &CreateMovieDto) -> Result<Movie> {
        let query = format!(
            "INSERT INTO movies (title, year, runtime, genres) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {MOVIE_COLUMNS}"
        );

        let movie = sqlx::query_as::<_, Movie>(&query)
            .bind(&movie.title)
            .bind(movie.year)
            .bind(movie.runtime)
            .bind(&movie.genres)
            .fetch_one(&self.pool)
            .await?;

        Ok(movie)
    }

    async fn get(&self, id: i64) -> Result<Movie> {
        let query = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1");

        sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::RecordNotFound)
    }

    async fn update(&self, movie: &Movie) -> Result<Movie> {
        let query = format!(
            "UPDATE movies \
             SET title = $1, year = $2, runtime = $3, genres = $4, version = version + 1 \
             WHERE id = $5 AND version = $6 \
             RETURNING {MOVIE_COLUMNS}"
        );

        sqlx::query_as::<_, Movie>(&query)
            .bind(&movie.title)
            .bind(movie.year)
            .bind(movie.runtime)
            .bind(&movie.genres)
            .bind(movie.id)
            .bind(movie.version)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::EditConflict)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RecordNotFound);
        }
        Ok(())
    }

    async fn get_all(&self, filters: &MovieFilters) -> Result<(Vec<Movie>, Metadata)> {
        let direction = if filters.sort_descending() { "DESC" } else { "ASC" };
        let query = format!(
            "SELECT count(*) OVER() AS total, {MOVIE_COLUMNS} \
             FROM movies \
             WHERE (to_tsvector('simple', title) @@ plainto_tsquery('simple', $1) OR $1 = '') \
             AND (genres @> $2 OR $2 = '{{}}') \
             ORDER BY {column} {direction}, id ASC \
             LIMIT $3 OFFSET $4",
            column = order_column(filters),
        );

        let rows = sqlx::query_as::<_, MovieWithTotal>(&query)
            .bind(filters.title.as_deref().unwrap_or_default())
            .bind(filters.genre_list())
            .bind(i64::from(filters.limit()))
            .bind(i64::from(filters.offset()))
            .fetch_all(&self.pool)
            .await?;

        let total = rows.first().map_or(0, |row| row.total);
        let movies = rows.into_iter().map(|row| row.movie).collect();
        let metadata = Metadata::calculate(
            u64::try_from(total).unwrap_or_default(),
            filters.page,
            filters.page_size,
        );

        Ok((movies, metadata))
    }
}
