//! In-memory news API for testing and offline use.
//!
//! Mirrors the server's observable behavior closely enough for the client:
//! tokens are issued at signup/login, mutating calls check them, stories are
//! listed newest first, and error statuses follow the hosted API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entities::{NewStory, Story, StoryUpdate, UserUpdate};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{ApiError, ApiResult, AuthResponse, FavoriteAction, NewsApi, UserRecord};

#[derive(Debug, Clone)]
struct Account {
    name: String,
    password: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Favorited story ids, oldest first.
    favorites: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    /// token -> username
    tokens: HashMap<String, String>,
    /// Newest first.
    stories: Vec<Story>,
}

impl State {
    fn authorize(&self, token: &str) -> ApiResult<String> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| ApiError::from_status(401, "Invalid token"))
    }

    fn authorize_as(&self, token: &str, username: &str) -> ApiResult<()> {
        if self.authorize(token)? == username {
            Ok(())
        } else {
            Err(ApiError::from_status(
                403,
                "You are not authorized to access this resource",
            ))
        }
    }

    fn account(&self, username: &str) -> ApiResult<&Account> {
        self.accounts
            .get(username)
            .ok_or_else(|| ApiError::NotFound(format!("No user with username '{username}'")))
    }

    fn story_index(&self, story_id: &str) -> ApiResult<usize> {
        self.stories
            .iter()
            .position(|s| s.id() == story_id)
            .ok_or_else(|| ApiError::NotFound(format!("No story with ID '{story_id}'")))
    }

    fn record(&self, username: &str) -> ApiResult<UserRecord> {
        let account = self.account(username)?;
        let favorites = account
            .favorites
            .iter()
            .filter_map(|id| self.stories.iter().find(|s| s.id() == id))
            .cloned()
            .collect();
        let stories = self
            .stories
            .iter()
            .filter(|s| s.username == username)
            .cloned()
            .collect();

        Ok(UserRecord {
            username: username.to_string(),
            name: account.name.clone(),
            created_at: account.created_at,
            updated_at: account.updated_at,
            favorites,
            stories,
        })
    }

    fn issue_token(&mut self, username: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), username.to_string());
        token
    }
}

/// In-memory implementation of [`NewsApi`].
#[derive(Debug, Default)]
pub struct MemoryNewsApi {
    state: RwLock<State>,
    requests: AtomicUsize,
}

impl MemoryNewsApi {
    /// Creates an empty in-memory API.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of endpoint calls served so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Invalidates a token, as the server does when it expires.
    pub async fn revoke_token(&self, token: &str) {
        self.state.write().await.tokens.remove(token);
    }

    fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl NewsApi for MemoryNewsApi {
    async fn list_stories(&self) -> ApiResult<Vec<Story>> {
        self.record_request();
        Ok(self.state.read().await.stories.clone())
    }

    async fn create_story(&self, token: &str, story: &NewStory) -> ApiResult<Story> {
        self.record_request();
        let mut state = self.state.write().await;
        let username = state.authorize(token)?;

        let story = Story::new(
            Uuid::new_v4().to_string(),
            username,
            story.clone(),
            Utc::now(),
        );
        state.stories.insert(0, story.clone());
        Ok(story)
    }

    async fn delete_story(&self, token: &str, story_id: &str) -> ApiResult<()> {
        self.record_request();
        let mut state = self.state.write().await;
        let index = state.story_index(story_id)?;
        let poster = state.stories[index].username.clone();
        state.authorize_as(token, &poster)?;

        state.stories.remove(index);
        for account in state.accounts.values_mut() {
            account.favorites.retain(|id| id != story_id);
        }
        Ok(())
    }

    async fn update_story(
        &self,
        token: &str,
        story_id: &str,
        update: &StoryUpdate,
    ) -> ApiResult<Story> {
        self.record_request();
        let mut state = self.state.write().await;
        let index = state.story_index(story_id)?;
        let poster = state.stories[index].username.clone();
        state.authorize_as(token, &poster)?;

        let story = &mut state.stories[index];
        if let Some(author) = &update.author {
            story.author.clone_from(author);
        }
        if let Some(title) = &update.title {
            story.title.clone_from(title);
        }
        if let Some(url) = &update.url {
            story.url.clone_from(url);
        }
        story.updated_at = Utc::now();
        Ok(story.clone())
    }

    async fn signup(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> ApiResult<AuthResponse> {
        self.record_request();
        let mut state = self.state.write().await;
        if state.accounts.contains_key(username) {
            return Err(ApiError::from_status(
                409,
                format!("There is already a user with username '{username}'."),
            ));
        }

        let now = Utc::now();
        state.accounts.insert(
            username.to_string(),
            Account {
                name: name.to_string(),
                password: password.to_string(),
                created_at: now,
                updated_at: now,
                favorites: Vec::new(),
            },
        );
        let token = state.issue_token(username);
        let user = state.record(username)?;
        Ok(AuthResponse { token, user })
    }

    async fn login(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
        self.record_request();
        let mut state = self.state.write().await;
        let valid = state
            .accounts
            .get(username)
            .is_some_and(|a| a.password == password);
        if !valid {
            return Err(ApiError::from_status(401, "Invalid username or password"));
        }

        let token = state.issue_token(username);
        let user = state.record(username)?;
        Ok(AuthResponse { token, user })
    }

    async fn get_user(&self, token: &str, username: &str) -> ApiResult<UserRecord> {
        self.record_request();
        let state = self.state.read().await;
        state.authorize(token)?;
        state.record(username)
    }

    async fn update_user(
        &self,
        token: &str,
        username: &str,
        update: &UserUpdate,
    ) -> ApiResult<UserRecord> {
        self.record_request();
        let mut state = self.state.write().await;
        state.authorize_as(token, username)?;

        let account = state
            .accounts
            .get_mut(username)
            .ok_or_else(|| ApiError::NotFound(format!("No user with username '{username}'")))?;
        if let Some(name) = &update.name {
            account.name.clone_from(name);
        }
        if let Some(password) = &update.password {
            account.password.clone_from(password);
        }
        account.updated_at = Utc::now();
        state.record(username)
    }

    async fn delete_user(&self, token: &str, username: &str) -> ApiResult<()> {
        self.record_request();
        let mut state = self.state.write().await;
        state.authorize_as(token, username)?;

        state.accounts.remove(username);
        state.tokens.retain(|_, owner| owner != username);
        state.stories.retain(|s| s.username != username);
        Ok(())
    }

    async fn toggle_favorite(
        &self,
        token: &str,
        username: &str,
        story_id: &str,
        action: FavoriteAction,
    ) -> ApiResult<UserRecord> {
        self.record_request();
        let mut state = self.state.write().await;
        state.authorize_as(token, username)?;
        state.story_index(story_id)?;

        let account = state
            .accounts
            .get_mut(username)
            .ok_or_else(|| ApiError::NotFound(format!("No user with username '{username}'")))?;
        match action {
            FavoriteAction::Add => {
                if !account.favorites.iter().any(|id| id == story_id) {
                    account.favorites.push(story_id.to_string());
                }
            }
            FavoriteAction::Remove => account.favorites.retain(|id| id != story_id),
        }
        state.record(username)
    }
}
