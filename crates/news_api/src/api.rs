//! Transport trait for the news API.

use async_trait::async_trait;
use entities::{NewStory, Story, StoryUpdate, UserUpdate};

use crate::{ApiResult, AuthResponse, UserRecord};

/// Whether a favorite toggle creates or deletes the association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FavoriteAction {
    /// `POST /users/{username}/favorites/{storyId}`
    Add,
    /// `DELETE /users/{username}/favorites/{storyId}`
    Remove,
}

impl std::fmt::Display for FavoriteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FavoriteAction::Add => write!(f, "add"),
            FavoriteAction::Remove => write!(f, "remove"),
        }
    }
}

/// One method per endpoint of the news API.
///
/// Implementations perform exactly one round trip per call and return the
/// server's records unchanged; reconciling client state is the job of
/// [`crate::NewsClient`].
#[async_trait]
pub trait NewsApi: Send + Sync {
    // =========================================================================
    // Stories
    // =========================================================================

    /// `GET /stories` (no authentication).
    async fn list_stories(&self) -> ApiResult<Vec<Story>>;

    /// `POST /stories`
    async fn create_story(&self, token: &str, story: &NewStory) -> ApiResult<Story>;

    /// `DELETE /stories/{id}`
    async fn delete_story(&self, token: &str, story_id: &str) -> ApiResult<()>;

    /// `PATCH /stories/{id}`
    async fn update_story(
        &self,
        token: &str,
        story_id: &str,
        update: &StoryUpdate,
    ) -> ApiResult<Story>;

    // =========================================================================
    // Accounts
    // =========================================================================

    /// `POST /signup`
    async fn signup(&self, username: &str, password: &str, name: &str)
        -> ApiResult<AuthResponse>;

    /// `POST /login`
    async fn login(&self, username: &str, password: &str) -> ApiResult<AuthResponse>;

    /// `GET /users/{username}?token=...`
    async fn get_user(&self, token: &str, username: &str) -> ApiResult<UserRecord>;

    /// `PATCH /users/{username}`
    async fn update_user(
        &self,
        token: &str,
        username: &str,
        update: &UserUpdate,
    ) -> ApiResult<UserRecord>;

    /// `DELETE /users/{username}`
    async fn delete_user(&self, token: &str, username: &str) -> ApiResult<()>;

    /// `POST` or `DELETE /users/{username}/favorites/{storyId}`
    async fn toggle_favorite(
        &self,
        token: &str,
        username: &str,
        story_id: &str,
        action: FavoriteAction,
    ) -> ApiResult<UserRecord>;
}
