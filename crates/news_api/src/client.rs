//! Session/domain model operations on top of a [`NewsApi`].
//!
//! Every operation performs its round trip(s) and then reconciles the
//! caller's client-side copies with the server's answer. Favorites are never
//! patched locally: after a toggle the full user record is fetched again.

use std::sync::Arc;

use entities::{NewStory, Story, StoryList, StoryUpdate, User, UserUpdate};
use tracing::{debug, info};

use crate::{ApiResult, FavoriteAction, NewsApi};

/// Domain model client for users, stories and the story list.
#[derive(Clone)]
pub struct NewsClient {
    api: Arc<dyn NewsApi>,
}

impl NewsClient {
    /// Creates a client over the given transport.
    pub fn new(api: Arc<dyn NewsApi>) -> Self {
        Self { api }
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Creates an account and returns the authenticated user.
    pub async fn signup(&self, username: &str, password: &str, name: &str) -> ApiResult<User> {
        let response = self.api.signup(username, password, name).await?;
        info!(username = %username, "Signed up");
        Ok(response.user.into_user().with_token(response.token))
    }

    /// Logs in and returns the user with favorites and own stories attached.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<User> {
        let response = self.api.login(username, password).await?;
        info!(username = %username, "Logged in");
        Ok(response.user.into_user().with_token(response.token))
    }

    /// Restores a user from a persisted token and username.
    ///
    /// Returns `Ok(None)` without touching the network when either value is
    /// missing or empty. A rejected token comes back as
    /// [`crate::ApiError::Auth`]; callers should treat it as "not logged in".
    pub async fn get_logged_in_user(
        &self,
        token: Option<&str>,
        username: Option<&str>,
    ) -> ApiResult<Option<User>> {
        let (Some(token), Some(username)) = (
            token.filter(|t| !t.is_empty()),
            username.filter(|u| !u.is_empty()),
        ) else {
            debug!("No persisted session identity");
            return Ok(None);
        };

        let record = self.api.get_user(token, username).await?;
        Ok(Some(record.into_user().with_token(token)))
    }

    /// Re-fetches the user record and replaces name, timestamps, favorites
    /// and own stories in place.
    pub async fn retrieve_details(&self, user: &mut User) -> ApiResult<()> {
        let record = self.api.get_user(user.token(), &user.username).await?;
        user.name = record.name;
        user.created_at = record.created_at;
        user.updated_at = record.updated_at;
        user.favorites = record.favorites;
        user.own_stories = record.stories;
        Ok(())
    }

    /// Adds a story to the user's favorites.
    pub async fn add_favorite(&self, user: &mut User, story_id: &str) -> ApiResult<()> {
        self.toggle_favorite(user, story_id, FavoriteAction::Add)
            .await
    }

    /// Removes a story from the user's favorites.
    pub async fn remove_favorite(&self, user: &mut User, story_id: &str) -> ApiResult<()> {
        self.toggle_favorite(user, story_id, FavoriteAction::Remove)
            .await
    }

    async fn toggle_favorite(
        &self,
        user: &mut User,
        story_id: &str,
        action: FavoriteAction,
    ) -> ApiResult<()> {
        debug!(username = %user.username, story_id = %story_id, %action, "Toggling favorite");
        self.api
            .toggle_favorite(user.token(), &user.username, story_id, action)
            .await?;
        self.retrieve_details(user).await
    }

    /// Applies a partial profile update and refreshes the local name.
    pub async fn update_user(&self, user: &mut User, update: &UserUpdate) -> ApiResult<()> {
        let record = self
            .api
            .update_user(user.token(), &user.username, update)
            .await?;
        user.name = record.name;
        user.updated_at = record.updated_at;
        Ok(())
    }

    /// Deletes the account. The user value is consumed.
    pub async fn remove_user(&self, user: User) -> ApiResult<()> {
        self.api.delete_user(user.token(), &user.username).await?;
        info!(username = %user.username, "Deleted account");
        Ok(())
    }

    // =========================================================================
    // Stories
    // =========================================================================

    /// Fetches every story and wraps them in a fresh list.
    pub async fn get_stories(&self) -> ApiResult<StoryList> {
        let stories = self.api.list_stories().await?;
        debug!(count = stories.len(), "Fetched stories");
        Ok(StoryList::new(stories))
    }

    /// Posts a story and puts it at the front of both the list and the
    /// user's own stories.
    pub async fn add_story(
        &self,
        list: &mut StoryList,
        user: &mut User,
        story: &NewStory,
    ) -> ApiResult<Story> {
        let story = self.api.create_story(user.token(), story).await?;
        list.insert_front(story.clone());
        user.own_stories.insert(0, story.clone());
        info!(story_id = %story.id(), "Submitted story");
        Ok(story)
    }

    /// Deletes a story and drops it from both the list and the user's own
    /// stories.
    pub async fn remove_story(
        &self,
        list: &mut StoryList,
        user: &mut User,
        story_id: &str,
    ) -> ApiResult<()> {
        self.api.delete_story(user.token(), story_id).await?;
        list.remove_by_id(story_id);
        user.own_stories.retain(|s| s.id() != story_id);
        info!(story_id = %story_id, "Removed story");
        Ok(())
    }

    /// Applies a partial story update and refreshes the story in place.
    pub async fn update_story(
        &self,
        story: &mut Story,
        user: &User,
        update: &StoryUpdate,
    ) -> ApiResult<()> {
        let updated = self
            .api
            .update_story(user.token(), story.id(), update)
            .await?;
        story.apply_update(&updated);
        Ok(())
    }
}

impl std::fmt::Debug for NewsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsClient").finish_non_exhaustive()
    }
}
