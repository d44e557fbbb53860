//! Response bodies returned by the news API.

use chrono::{DateTime, Utc};
use entities::{Story, User};
use serde::{Deserialize, Serialize};

/// A user record as returned by the server. Carries no token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub favorites: Vec<Story>,
    #[serde(default)]
    pub stories: Vec<Story>,
}

impl UserRecord {
    /// Builds an anonymous client-side user, favorites and own stories
    /// included.
    pub fn into_user(self) -> User {
        User::new(self.username, self.name, self.created_at, self.updated_at)
            .with_stories(self.favorites, self.stories)
    }
}

/// `{"stories": [...]}`
#[derive(Debug, Clone, Deserialize)]
pub struct StoriesResponse {
    pub stories: Vec<Story>,
}

/// `{"story": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct StoryResponse {
    pub story: Story,
}

/// `{"user": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub user: UserRecord,
}

/// `{"token": "...", "user": {...}}` returned by signup and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserRecord,
}
