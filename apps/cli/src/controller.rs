//! View-sync controller
//!
//! Owns the explicit session context (current user and story list), keeps the
//! persisted session identity in step with logins and logouts, and funnels
//! every mutation through [`NewsClient`] so local state only changes after the
//! server has confirmed it.

use std::sync::Arc;

use entities::{NewStory, Story, StoryList, StoryUpdate, User, UserUpdate};
use news_api::{ApiError, NewsClient};
use session_store::{SessionError, SessionIdentity, SessionStore};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::InFlight;

/// Everything the front-end currently shows.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Logged-in user, if any
    pub current_user: Option<User>,
    /// The "all stories" view
    pub story_list: StoryList,
}

impl SessionContext {
    /// The logged-in user, if it is still `username`.
    fn user_named(&mut self, username: &str) -> Option<&mut User> {
        self.current_user
            .as_mut()
            .filter(|user| user.username == username)
    }
}

/// Controller errors
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session storage error: {0}")]
    Session(#[from] SessionError),

    #[error("You need to log in first")]
    NotLoggedIn,

    #[error("An operation on {0} is already in progress")]
    Busy(String),

    #[error("Story not found: {0}")]
    StoryNotFound(String),

    #[error("Nothing to update")]
    EmptyUpdate,
}

impl ControllerError {
    /// The message to show to a user; server messages pass through.
    pub fn user_message(&self) -> String {
        match self {
            ControllerError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Result type for controller operations
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Connects user actions to the domain model and the session store.
pub struct Controller {
    client: NewsClient,
    store: Arc<dyn SessionStore>,
    context: RwLock<SessionContext>,
    in_flight: InFlight,
}

impl Controller {
    /// Creates a controller with an anonymous, empty context.
    pub fn new(client: NewsClient, store: Arc<dyn SessionStore>) -> Self {
        Self {
            client,
            store,
            context: RwLock::new(SessionContext::default()),
            in_flight: InFlight::new(),
        }
    }

    /// Restores the persisted session, if any, and loads the story list.
    ///
    /// A missing, unreadable or rejected identity leaves the controller
    /// anonymous; only a failure to load stories is returned.
    pub async fn init(&self) -> ControllerResult<()> {
        let user = match SessionIdentity::load_parts(self.store.as_ref()) {
            Ok((token, username)) => {
                match self
                    .client
                    .get_logged_in_user(token.as_deref(), username.as_deref())
                    .await
                {
                    Ok(user) => user,
                    Err(e) => {
                        warn!(error = %e, "Could not restore session, continuing anonymously");
                        None
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Could not read session store, continuing anonymously");
                None
            }
        };

        if let Some(user) = &user {
            info!(username = %user.username, "Restored session");
        }
        self.context.write().await.current_user = user;
        self.refresh_stories().await
    }

    /// Logs in, persists the identity and reloads stories.
    pub async fn login(&self, username: &str, password: &str) -> ControllerResult<User> {
        let _guard = self.in_flight.claim(format!("user:{username}"))?;
        let user = self.client.login(username, password).await?;
        self.start_session(user).await
    }

    /// Creates an account, persists the identity and reloads stories.
    pub async fn signup(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> ControllerResult<User> {
        let _guard = self.in_flight.claim(format!("user:{username}"))?;
        let user = self.client.signup(username, password, name).await?;
        self.start_session(user).await
    }

    async fn start_session(&self, user: User) -> ControllerResult<User> {
        SessionIdentity::new(user.token(), &user.username).persist(self.store.as_ref())?;
        self.context.write().await.current_user = Some(user.clone());
        self.refresh_stories().await?;
        Ok(user)
    }

    /// Forgets the persisted identity and resets all in-memory state.
    pub async fn logout(&self) -> ControllerResult<()> {
        *self.context.write().await = SessionContext::default();
        SessionIdentity::forget(self.store.as_ref())?;
        info!("Logged out");
        Ok(())
    }

    /// Replaces the story list with a fresh copy from the server.
    pub async fn refresh_stories(&self) -> ControllerResult<()> {
        let list = self.client.get_stories().await?;
        self.context.write().await.story_list = list;
        Ok(())
    }

    /// Returns a snapshot of the current context.
    pub async fn context(&self) -> SessionContext {
        self.context.read().await.clone()
    }

    /// Returns the logged-in user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.context.read().await.current_user.clone()
    }

    async fn require_user(&self) -> ControllerResult<User> {
        self.current_user()
            .await
            .ok_or(ControllerError::NotLoggedIn)
    }

    /// Applies a confirmed change to the live user unless the session
    /// changed meanwhile. Only the touched fields are written, so concurrent
    /// operations on other entities are not overwritten.
    async fn update_current_user<F>(&self, username: &str, apply: F)
    where
        F: FnOnce(&mut User),
    {
        match self.context.write().await.user_named(username) {
            Some(current) => apply(current),
            None => debug!(username = %username, "Session changed, dropping user update"),
        }
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Flips the favorite marker of a story and returns the new marker.
    ///
    /// The marker reported is read from the reconciled favorites after the
    /// server confirmed the change, never guessed beforehand.
    pub async fn toggle_favorite(&self, story_id: &str) -> ControllerResult<bool> {
        let currently = self.require_user().await?.is_favorite(story_id);
        self.set_favorite(story_id, !currently).await
    }

    /// Adds or removes a favorite and returns whether the story is a favorite
    /// afterwards.
    pub async fn set_favorite(&self, story_id: &str, favorite: bool) -> ControllerResult<bool> {
        let _guard = self.in_flight.claim(format!("story:{story_id}"))?;
        let mut user = self.require_user().await?;

        if favorite {
            self.client.add_favorite(&mut user, story_id).await?;
        } else {
            self.client.remove_favorite(&mut user, story_id).await?;
        }

        let reconciled = user
            .favorites
            .iter()
            .find(|story| story.id() == story_id)
            .cloned();
        let is_favorite = reconciled.is_some();
        self.update_current_user(&user.username, |current| {
            current.favorites.retain(|story| story.id() != story_id);
            current.favorites.extend(reconciled);
        })
        .await;
        Ok(is_favorite)
    }

    // =========================================================================
    // Stories
    // =========================================================================

    /// Submits a story; it appears first in the list and in own stories.
    pub async fn submit_story(&self, story: &NewStory) -> ControllerResult<Story> {
        let mut user = self.require_user().await?;
        let _guard = self.in_flight.claim(format!("submit:{}", user.username))?;

        // Only the new story is merged into the live context afterwards.
        let mut submitted = StoryList::default();
        let story = self
            .client
            .add_story(&mut submitted, &mut user, story)
            .await?;

        let mut context = self.context.write().await;
        context.story_list.insert_front(story.clone());
        if let Some(current) = context.user_named(&user.username) {
            current.own_stories.insert(0, story.clone());
        }
        Ok(story)
    }

    /// Edits a story and applies the server's copy wherever the story is
    /// shown: the list, own stories and favorites.
    pub async fn update_story(
        &self,
        story_id: &str,
        update: &StoryUpdate,
    ) -> ControllerResult<Story> {
        if update.is_empty() {
            return Err(ControllerError::EmptyUpdate);
        }
        let _guard = self.in_flight.claim(format!("story:{story_id}"))?;
        let user = self.require_user().await?;
        let mut story = {
            let context = self.context.read().await;
            context
                .story_list
                .get(story_id)
                .or_else(|| user.own_stories.iter().find(|s| s.id() == story_id))
                .cloned()
                .ok_or_else(|| ControllerError::StoryNotFound(story_id.to_string()))?
        };

        self.client.update_story(&mut story, &user, update).await?;

        let mut context = self.context.write().await;
        if let Some(listed) = context.story_list.get_mut(story_id) {
            listed.apply_update(&story);
        }
        if let Some(current) = context.user_named(&user.username) {
            current
                .own_stories
                .iter_mut()
                .chain(current.favorites.iter_mut())
                .filter(|s| s.id() == story_id)
                .for_each(|s| s.apply_update(&story));
        }
        Ok(story)
    }

    /// Deletes one of the user's own stories.
    ///
    /// Stories posted by someone else are rejected before any request is
    /// sent. A favorited story is unfavorited first; the story list is
    /// reloaded afterwards.
    pub async fn delete_story(&self, story_id: &str) -> ControllerResult<()> {
        let _guard = self.in_flight.claim(format!("story:{story_id}"))?;
        let mut user = self.require_user().await?;
        if !user.is_own_story(story_id) {
            return Err(ControllerError::StoryNotFound(story_id.to_string()));
        }

        if user.is_favorite(story_id) {
            self.client.remove_favorite(&mut user, story_id).await?;
            self.update_current_user(&user.username, |current| {
                current.favorites.retain(|s| s.id() != story_id);
            })
            .await;
        }

        let mut removed = StoryList::default();
        self.client
            .remove_story(&mut removed, &mut user, story_id)
            .await?;

        {
            let mut context = self.context.write().await;
            context.story_list.remove_by_id(story_id);
            if let Some(current) = context.user_named(&user.username) {
                current.own_stories.retain(|s| s.id() != story_id);
            }
        }
        self.refresh_stories().await
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Applies a partial profile update.
    pub async fn update_profile(&self, update: &UserUpdate) -> ControllerResult<User> {
        if update.is_empty() {
            return Err(ControllerError::EmptyUpdate);
        }
        let mut user = self.require_user().await?;
        let _guard = self.in_flight.claim(format!("user:{}", user.username))?;

        self.client.update_user(&mut user, update).await?;
        self.update_current_user(&user.username, |current| {
            current.name.clone_from(&user.name);
            current.updated_at = user.updated_at;
        })
        .await;
        Ok(user)
    }

    /// Deletes the account and logs out.
    pub async fn delete_account(&self) -> ControllerResult<()> {
        let user = self.require_user().await?;
        let _guard = self.in_flight.claim(format!("user:{}", user.username))?;

        self.client.remove_user(user).await?;
        self.logout().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use news_api::{ApiResult, AuthResponse, FavoriteAction, MemoryNewsApi, NewsApi, UserRecord};
    use session_store::{keys, MemorySessionStore};

    use super::*;

    /// In-memory server whose story creation is slow.
    struct SlowSubmit {
        inner: Arc<MemoryNewsApi>,
        delay: Duration,
    }

    #[async_trait]
    impl NewsApi for SlowSubmit {
        async fn list_stories(&self) -> ApiResult<Vec<Story>> {
            self.inner.list_stories().await
        }

        async fn create_story(&self, token: &str, story: &NewStory) -> ApiResult<Story> {
            tokio::time::sleep(self.delay).await;
            self.inner.create_story(token, story).await
        }

        async fn delete_story(&self, token: &str, story_id: &str) -> ApiResult<()> {
            self.inner.delete_story(token, story_id).await
        }

        async fn update_story(
            &self,
            token: &str,
            story_id: &str,
            update: &StoryUpdate,
        ) -> ApiResult<Story> {
            self.inner.update_story(token, story_id, update).await
        }

        async fn signup(
            &self,
            username: &str,
            password: &str,
            name: &str,
        ) -> ApiResult<AuthResponse> {
            self.inner.signup(username, password, name).await
        }

        async fn login(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
            self.inner.login(username, password).await
        }

        async fn get_user(&self, token: &str, username: &str) -> ApiResult<UserRecord> {
            self.inner.get_user(token, username).await
        }

        async fn update_user(
            &self,
            token: &str,
            username: &str,
            update: &UserUpdate,
        ) -> ApiResult<UserRecord> {
            self.inner.update_user(token, username, update).await
        }

        async fn delete_user(&self, token: &str, username: &str) -> ApiResult<()> {
            self.inner.delete_user(token, username).await
        }

        async fn toggle_favorite(
            &self,
            token: &str,
            username: &str,
            story_id: &str,
            action: FavoriteAction,
        ) -> ApiResult<UserRecord> {
            self.inner
                .toggle_favorite(token, username, story_id, action)
                .await
        }
    }

    struct Harness {
        api: Arc<MemoryNewsApi>,
        store: Arc<MemorySessionStore>,
        controller: Controller,
    }

    fn harness() -> Harness {
        let api = Arc::new(MemoryNewsApi::new());
        let store = Arc::new(MemorySessionStore::new());
        let controller = Controller::new(NewsClient::new(api.clone()), store.clone());
        Harness {
            api,
            store,
            controller,
        }
    }

    fn new_story(title: &str) -> NewStory {
        NewStory::new("Ada Lovelace", title, "https://example.com/notes")
    }

    #[tokio::test]
    async fn test_init_without_identity_is_anonymous() {
        let h = harness();
        h.controller.init().await.unwrap();

        assert!(h.controller.current_user().await.is_none());
        // Only the story list was fetched.
        assert_eq!(h.api.request_count(), 1);
    }

    #[tokio::test]
    async fn test_login_persists_identity_and_logout_clears_it() {
        let h = harness();
        h.api.signup("ada", "pw", "Ada").await.unwrap();

        let user = h.controller.login("ada", "pw").await.unwrap();
        assert_eq!(
            h.store.get(keys::TOKEN).unwrap().as_deref(),
            Some(user.token())
        );
        assert_eq!(h.store.get(keys::USERNAME).unwrap().as_deref(), Some("ada"));

        h.controller.logout().await.unwrap();
        assert!(!h.store.exists(keys::TOKEN).unwrap());
        assert!(!h.store.exists(keys::USERNAME).unwrap());
        assert!(h.controller.current_user().await.is_none());

        let (token, username) = SessionIdentity::load_parts(h.store.as_ref()).unwrap();
        let restored = NewsClient::new(h.api.clone())
            .get_logged_in_user(token.as_deref(), username.as_deref())
            .await
            .unwrap();
        assert!(restored.is_none());
    }

    #[tokio::test]
    async fn test_init_restores_persisted_session() {
        let h = harness();
        h.controller.signup("ada", "pw", "Ada").await.unwrap();
        h.controller.submit_story(&new_story("Mine")).await.unwrap();

        let fresh = Controller::new(NewsClient::new(h.api.clone()), h.store.clone());
        fresh.init().await.unwrap();

        let context = fresh.context().await;
        let user = context.current_user.unwrap();
        assert_eq!(user.username, "ada");
        assert_eq!(user.own_stories.len(), 1);
        assert_eq!(context.story_list.len(), 1);
    }

    #[tokio::test]
    async fn test_init_with_stale_token_falls_back_to_anonymous() {
        let h = harness();
        let user = h.controller.signup("ada", "pw", "Ada").await.unwrap();
        h.api.revoke_token(user.token()).await;

        let fresh = Controller::new(NewsClient::new(h.api.clone()), h.store.clone());
        fresh.init().await.unwrap();

        assert!(fresh.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_signup_duplicate_surfaces_server_message() {
        let h = harness();
        h.controller.signup("ada", "pw", "Ada").await.unwrap();

        let err = h.controller.signup("ada", "pw", "Ada").await.unwrap_err();
        assert!(err.user_message().contains("already a user"));
    }

    #[tokio::test]
    async fn test_mutations_require_login() {
        let h = harness();
        h.controller.init().await.unwrap();

        assert!(matches!(
            h.controller.submit_story(&new_story("Nope")).await,
            Err(ControllerError::NotLoggedIn)
        ));
        assert!(matches!(
            h.controller.toggle_favorite("s1").await,
            Err(ControllerError::NotLoggedIn)
        ));
    }

    #[tokio::test]
    async fn test_toggle_favorite_confirms_before_flipping() {
        let h = harness();
        h.controller.signup("ada", "pw", "Ada").await.unwrap();
        let story = h.controller.submit_story(&new_story("Notes")).await.unwrap();

        assert!(h.controller.toggle_favorite(story.id()).await.unwrap());
        let user = h.controller.current_user().await.unwrap();
        assert!(user.is_favorite(story.id()));

        assert!(!h.controller.toggle_favorite(story.id()).await.unwrap());
        let user = h.controller.current_user().await.unwrap();
        assert!(user.favorites.is_empty());
    }

    #[tokio::test]
    async fn test_failed_favorite_leaves_marker_unchanged() {
        let h = harness();
        h.controller.signup("ada", "pw", "Ada").await.unwrap();

        assert!(h.controller.toggle_favorite("missing").await.is_err());
        let user = h.controller.current_user().await.unwrap();
        assert!(!user.is_favorite("missing"));
    }

    #[tokio::test]
    async fn test_duplicate_in_flight_operation_is_rejected() {
        let h = harness();
        h.controller.signup("ada", "pw", "Ada").await.unwrap();
        let story = h.controller.submit_story(&new_story("Notes")).await.unwrap();

        let _guard = h
            .controller
            .in_flight
            .claim(format!("story:{}", story.id()))
            .unwrap();
        let err = h.controller.toggle_favorite(story.id()).await.unwrap_err();
        assert!(matches!(err, ControllerError::Busy(_)));
    }

    #[tokio::test]
    async fn test_submit_story_updates_both_views() {
        let h = harness();
        h.controller.signup("ada", "pw", "Ada").await.unwrap();
        h.controller.submit_story(&new_story("First")).await.unwrap();
        let story = h.controller.submit_story(&new_story("Second")).await.unwrap();

        let context = h.controller.context().await;
        assert_eq!(context.story_list.stories()[0].id(), story.id());
        assert_eq!(context.current_user.unwrap().own_stories[0].id(), story.id());
    }

    #[tokio::test]
    async fn test_delete_favorited_story() {
        let h = harness();
        h.controller.signup("ada", "pw", "Ada").await.unwrap();
        let story = h.controller.submit_story(&new_story("Doomed")).await.unwrap();
        h.controller.set_favorite(story.id(), true).await.unwrap();

        h.controller.delete_story(story.id()).await.unwrap();

        let context = h.controller.context().await;
        let user = context.current_user.unwrap();
        assert!(context.story_list.get(story.id()).is_none());
        assert!(!user.is_own_story(story.id()));
        assert!(!user.is_favorite(story.id()));
    }

    #[tokio::test]
    async fn test_update_story_reconciles_copies() {
        let h = harness();
        h.controller.signup("ada", "pw", "Ada").await.unwrap();
        let story = h.controller.submit_story(&new_story("Draft")).await.unwrap();
        h.controller.set_favorite(story.id(), true).await.unwrap();

        let updated = h
            .controller
            .update_story(story.id(), &StoryUpdate::default().with_title("Final"))
            .await
            .unwrap();
        assert_eq!(updated.title, "Final");

        let context = h.controller.context().await;
        assert_eq!(context.story_list.get(story.id()).unwrap().title, "Final");
        let user = context.current_user.unwrap();
        assert_eq!(user.own_stories[0].title, "Final");
        assert_eq!(user.favorites[0].title, "Final");
    }

    #[tokio::test]
    async fn test_empty_updates_are_rejected_locally() {
        let h = harness();
        h.controller.signup("ada", "pw", "Ada").await.unwrap();
        let story = h.controller.submit_story(&new_story("Draft")).await.unwrap();
        let requests = h.api.request_count();

        let err = h
            .controller
            .update_story(story.id(), &StoryUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::EmptyUpdate));

        let err = h
            .controller
            .update_profile(&UserUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::EmptyUpdate));
        assert_eq!(h.api.request_count(), requests);
    }

    #[tokio::test]
    async fn test_delete_story_posted_by_someone_else_sends_nothing() {
        let h = harness();
        let bob = h.api.signup("bob", "pw", "Bob").await.unwrap();
        let story = h
            .api
            .create_story(&bob.token, &new_story("Bob's"))
            .await
            .unwrap();

        let ada = h.controller.signup("ada", "pw", "Ada").await.unwrap();
        h.controller.set_favorite(story.id(), true).await.unwrap();
        let requests = h.api.request_count();

        let err = h.controller.delete_story(story.id()).await.unwrap_err();
        assert!(matches!(err, ControllerError::StoryNotFound(_)));
        assert_eq!(h.api.request_count(), requests);

        let local = h.controller.current_user().await.unwrap();
        assert!(local.is_favorite(story.id()));
        let server = h.api.get_user(ada.token(), "ada").await.unwrap();
        assert!(server.favorites.iter().any(|s| s.id() == story.id()));
        assert!(h.controller.context().await.story_list.get(story.id()).is_some());
    }

    #[tokio::test]
    async fn test_delete_during_slow_submit_keeps_both_results() {
        let inner = Arc::new(MemoryNewsApi::new());
        let api = Arc::new(SlowSubmit {
            inner: inner.clone(),
            delay: Duration::from_millis(200),
        });
        let controller = Controller::new(NewsClient::new(api), Arc::new(MemorySessionStore::new()));
        controller.signup("ada", "pw", "Ada").await.unwrap();
        let old = controller.submit_story(&new_story("Old")).await.unwrap();

        let new_input = new_story("New");
        let (submitted, deleted) = tokio::join!(
            controller.submit_story(&new_input),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                controller.delete_story(old.id()).await
            }
        );
        let new = submitted.unwrap();
        deleted.unwrap();

        let context = controller.context().await;
        assert!(context.story_list.get(old.id()).is_none());
        assert!(context.story_list.get(new.id()).is_some());
        let user = context.current_user.unwrap();
        assert!(!user.is_own_story(old.id()));
        assert!(user.is_own_story(new.id()));

        let server: Vec<String> = inner
            .list_stories()
            .await
            .unwrap()
            .iter()
            .map(|s| s.id().to_string())
            .collect();
        assert_eq!(server, vec![new.id().to_string()]);
    }

    #[tokio::test]
    async fn test_update_unknown_story() {
        let h = harness();
        h.controller.signup("ada", "pw", "Ada").await.unwrap();

        let err = h
            .controller
            .update_story("missing", &StoryUpdate::default().with_title("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::StoryNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_profile_and_delete_account() {
        let h = harness();
        h.controller.signup("ada", "pw", "Ada").await.unwrap();

        let user = h
            .controller
            .update_profile(&UserUpdate::default().with_name("Countess"))
            .await
            .unwrap();
        assert_eq!(user.name, "Countess");
        assert_eq!(h.controller.current_user().await.unwrap().name, "Countess");

        h.controller.delete_account().await.unwrap();
        assert!(h.controller.current_user().await.is_none());
        assert!(!h.store.exists(keys::TOKEN).unwrap());
        assert!(h.api.login("ada", "pw").await.is_err());
    }
}
