//! Request bodies sent to the news API.

use entities::{NewStory, StoryUpdate, UserUpdate};
use serde::Serialize;

/// Body carrying only a token (deletes and favorite toggles).
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest<'a> {
    pub token: &'a str,
}

/// Body for `POST /stories`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateStoryRequest<'a> {
    pub token: &'a str,
    pub story: &'a NewStory,
}

/// Body for `PATCH /stories/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateStoryRequest<'a> {
    pub token: &'a str,
    pub story: &'a StoryUpdate,
}

/// Body for `PATCH /users/{username}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateUserRequest<'a> {
    pub token: &'a str,
    pub user: &'a UserUpdate,
}

/// Credentials wrapped as `{"user": {...}}` for signup and login.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialsRequest<'a> {
    pub user: Credentials<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

impl<'a> CredentialsRequest<'a> {
    /// Signup body: username, password and display name.
    pub fn signup(username: &'a str, password: &'a str, name: &'a str) -> Self {
        Self {
            user: Credentials {
                username,
                password,
                name: Some(name),
            },
        }
    }

    /// Login body: username and password only.
    pub fn login(username: &'a str, password: &'a str) -> Self {
        Self {
            user: Credentials {
                username,
                password,
                name: None,
            },
        }
    }
}
