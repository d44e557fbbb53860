//! User-related entity definitions.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Story;

/// A user of the news API, as seen by the client.
///
/// `favorites` and `own_stories` are value copies of stories; they are only
/// ever replaced from server responses or adjusted after a confirmed
/// story submission/removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique username.
    pub username: String,
    /// Display name.
    pub name: String,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
    /// Authentication token, absent until login or signup succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_token: Option<String>,
    /// Favorited stories in server order.
    #[serde(default)]
    pub favorites: Vec<Story>,
    /// Stories posted by this user.
    #[serde(default)]
    pub own_stories: Vec<Story>,
}

impl User {
    /// Creates an anonymous user with empty collections.
    pub fn new(
        username: impl Into<String>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            username: username.into(),
            name: name.into(),
            created_at,
            updated_at,
            login_token: None,
            favorites: Vec::new(),
            own_stories: Vec::new(),
        }
    }

    /// Attaches a login token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.login_token = Some(token.into());
        self
    }

    /// Sets the favorite and own-story collections.
    pub fn with_stories(mut self, favorites: Vec<Story>, own_stories: Vec<Story>) -> Self {
        self.favorites = favorites;
        self.own_stories = own_stories;
        self
    }

    /// Returns true if a token is attached.
    pub fn is_authenticated(&self) -> bool {
        self.login_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Returns the token, or an empty string for an anonymous user.
    pub fn token(&self) -> &str {
        self.login_token.as_deref().unwrap_or_default()
    }

    /// Builds the set of favorited story ids from the current favorites.
    pub fn favorite_ids(&self) -> HashSet<&str> {
        self.favorites.iter().map(Story::id).collect()
    }

    /// Returns true if the story is among the favorites.
    pub fn is_favorite(&self, story_id: &str) -> bool {
        self.favorite_ids().contains(story_id)
    }

    /// Returns true if the user posted the story.
    pub fn is_own_story(&self, story_id: &str) -> bool {
        self.own_stories.iter().any(|s| s.id() == story_id)
    }
}

/// Partial user update. Only fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserUpdate {
    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.password.is_none()
    }
}
