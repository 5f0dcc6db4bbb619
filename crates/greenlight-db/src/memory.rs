//! In-process implementation of the repository traits.
//!
//! Mirrors the PostgreSQL semantics the pipeline depends on: unique emails,
//! optimistic versioning, expiry-aware token lookup and the movie list
//! filters. Nothing survives a restart.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use greenlight_models::{
    CreateMovieDto, Metadata, Movie, MovieFilters, Permissions, Token, TokenScope, User,
};

use crate::error::{Result, StoreError};
use crate::repositories::{
    MovieRepository, NewUser, PermissionRepository, TokenRepository, UserRepository,
};

struct StoredToken {
    user_id: i64,
    expiry: DateTime<Utc>,
    scope: TokenScope,
}

#[derive(Default)]
struct StoreData {
    users: BTreeMap<i64, User>,
    tokens: HashMap<Vec<u8>, StoredToken>,
    permissions: HashMap<i64, BTreeSet<String>>,
    movies: BTreeMap<i64, Movie>,
    next_user_id: i64,
    next_movie_id: i64,
}

impl StoreData {
    fn next_user_id(&mut self) -> i64 {
        self.next_user_id += 1;
        self.next_user_id
    }

    fn next_movie_id(&mut self) -> i64 {
        self.next_movie_id += 1;
        self.next_movie_id
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(user.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tokens held for `user_id` in `scope`, expired ones included.
    pub async fn token_count(&self, scope: TokenScope, user_id: i64) -> usize {
        let data = self.data.lock().await;
        data.tokens
            .values()
            .filter(|token| token.scope == scope && token.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut data = self.data.lock().await;
        if data.email_taken(&user.email, None) {
            return Err(StoreError::DuplicateEmail);
        }

        let user = User {
            id: data.next_user_id(),
            created_at: Utc::now(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            activated: user.activated,
            version: 1,
        };
        data.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get(&self, id: i64) -> Result<User> {
        let data = self.data.lock().await;
        data.users.get(&id).cloned().ok_or(StoreError::RecordNotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User> {
        let data = self.data.lock().await;
        data.users
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or(StoreError::RecordNotFound)
    }

    async fn update(&self, user: &User) -> Result<User> {
        let mut data = self.data.lock().await;
        if data.email_taken(&user.email, Some(user.id)) {
            return Err(StoreError::DuplicateEmail);
        }

        let stored = data
            .users
            .get_mut(&user.id)
            .filter(|stored| stored.version == user.version)
            .ok_or(StoreError::EditConflict)?;

        *stored = User {
            version: user.version + 1,
            ..user.clone()
        };
        Ok(stored.clone())
    }

    async fn get_for_token(&self, scope: TokenScope, hash: &[u8]) -> Result<User> {
        let data = self.data.lock().await;
        let now = Utc::now();

        data.tokens
            .get(hash)
            .filter(|token| token.scope == scope && token.expiry > now)
            .and_then(|token| data.users.get(&token.user_id))
            .cloned()
            .ok_or(StoreError::RecordNotFound)
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn insert(&self, token: &Token) -> Result<()> {
        let mut data = self.data.lock().await;
        data.tokens.insert(
            token.hash.clone(),
            StoredToken {
                user_id: token.user_id,
                expiry: token.expiry,
                scope: token.scope,
            },
        );
        Ok(())
    }

    async fn delete_all_for_user(&self, scope: TokenScope, user_id: i64) -> Result<()> {
        let mut data = self.data.lock().await;
        data.tokens
            .retain(|_, token| !(token.scope == scope && token.user_id == user_id));
        Ok(())
    }
}

#[async_trait]
impl PermissionRepository for MemoryStore {
    async fn get_all_for_user(&self, user_id: i64) -> Result<Permissions> {
        let data = self.data.lock().await;
        Ok(data
            .permissions
            .get(&user_id)
            .map(|codes| codes.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_for_user(&self, user_id: i64, codes: &[&str]) -> Result<()> {
        let mut data = self.data.lock().await;
        data.permissions
            .entry(user_id)
            .or_default()
            .extend(codes.iter().map(|code| code.to_string()));
        Ok(())
    }
}

fn title_matches(title: &str, query: Option<&str>) -> bool {
    let Some(query) = query.filter(|query| !query.trim().is_empty()) else {
        return true;
    };
    let words: BTreeSet<String> = title.split_whitespace().map(str::to_lowercase).collect();
    query
        .split_whitespace()
        .all(|word| words.contains(&word.to_lowercase()))
}

fn compare_movies(a: &Movie, b: &Movie, column: &str) -> std::cmp::Ordering {
    match column {
        "title" => a.title.cmp(&b.title),
        "year" => a.year.cmp(&b.year),
        "runtime" => a.runtime.cmp(&b.runtime),
        _ => a.id.cmp(&b.id),
    }
}

#[async_trait]
impl MovieRepository for MemoryStore {
    async fn insert(&self, movie: &CreateMovieDto) -> Result<Movie> {
        let mut data = self.data.lock().await;
        let movie = Movie {
            id: data.next_movie_id(),
            created_at: Utc::now(),
            title: movie.title.clone(),
            year: movie.year,
            runtime: movie.runtime,
            genres: movie.genres.clone(),
            version: 1,
        };
        data.movies.insert(movie.id, movie.clone());
        Ok(movie)
    }

    async fn get(&self, id: i64) -> Result<Movie> {
        let data = self.data.lock().await;
        data.movies.get(&id).cloned().ok_or(StoreError::RecordNotFound)
    }

    async fn update(&self, movie: &Movie) -> Result<Movie> {
        let mut data = self.data.lock().await;
        let stored = data
            .movies
            .get_mut(&movie.id)
            .filter(|stored| stored.version == movie.version)
            .ok_or(StoreError::EditConflict)?;

        *stored = Movie {
            version: movie.version + 1,
            ..movie.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut data = self.data.lock().await;
        data.movies
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::RecordNotFound)
    }

    async fn get_all(&self, filters: &MovieFilters) -> Result<(Vec<Movie>, Metadata)> {
        let data = self.data.lock().await;
        let genres = filters.genre_list();

        let mut matching: Vec<Movie> = data
            .movies
            .values()
            .filter(|movie| title_matches(&movie.title, filters.title.as_deref()))
            .filter(|movie| genres.iter().all(|genre| movie.genres.contains(genre)))
            .cloned()
            .collect();

        let column = filters.sort_column();
        matching.sort_by(|a, b| {
            let ordering = compare_movies(a, b, column);
            let ordering = if filters.sort_descending() {
                ordering.reverse()
            } else {
                ordering
            };
            ordering.then(a.id.cmp(&b.id))
        });

        let total = matching.len() as u64;
        let movies = matching
            .into_iter()
            .skip(filters.offset() as usize)
            .take(filters.limit() as usize)
            .collect();

        Ok((
            movies,
            Metadata::calculate(total, filters.page, filters.page_size),
        ))
    }
}
