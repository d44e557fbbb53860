//! reqwest-backed implementation of [`NewsApi`].

use std::time::Duration;

use async_trait::async_trait;
use entities::{NewStory, Story, StoryUpdate, UserUpdate};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ErrorEnvelope;
use crate::{
    ApiError, ApiResult, AuthResponse, CreateStoryRequest, CredentialsRequest, FavoriteAction,
    NewsApi, StoriesResponse, StoryResponse, TokenRequest, UpdateStoryRequest, UpdateUserRequest,
    UserRecord, UserResponse,
};

/// Default base URL of the hosted API.
pub const DEFAULT_BASE_URL: &str = "https://hack-or-snooze-v3.herokuapp.com";

const USER_AGENT: &str = concat!("snooze/", env!("CARGO_PKG_VERSION"));

/// News API client speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpNewsApi {
    /// Base URL, without a trailing slash
    base_url: Url,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpNewsApi {
    /// Creates a client for the given base URL without a request timeout.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Self::build(base_url, None)
    }

    /// Creates a client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        Self::build(base_url, Some(timeout))
    }

    fn build(base_url: &str, timeout: Option<Duration>) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ApiError::Configuration(e.to_string()))?;

        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::Configuration(format!("Invalid base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Configuration(format!(
                "Base URL cannot carry a path: {base_url}"
            )));
        }

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Configuration(format!("Invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a request and decodes the JSON response body.
    async fn call<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        query: Option<(&str, &str)>,
        body: Option<&B>,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!(method = %method, path = %url.path(), "Calling news API");

        let mut request = self.http_client.request(method.clone(), url);
        if let Some(query) = query {
            request = request.query(&[query]);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = ErrorEnvelope::message_from(&bytes).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
            debug!(method = %method, status = status.as_u16(), %message, "News API call failed");
            return Err(ApiError::from_status(status.as_u16(), message));
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Responses whose body is not needed by the client.
#[derive(serde::Deserialize)]
struct Ignored {}

impl FavoriteAction {
    fn method(self) -> Method {
        match self {
            FavoriteAction::Add => Method::POST,
            FavoriteAction::Remove => Method::DELETE,
        }
    }
}

#[async_trait]
impl NewsApi for HttpNewsApi {
    async fn list_stories(&self) -> ApiResult<Vec<Story>> {
        let response: StoriesResponse = self
            .call::<(), _>(Method::GET, &["stories"], None, None)
            .await?;
        Ok(response.stories)
    }

    async fn create_story(&self, token: &str, story: &NewStory) -> ApiResult<Story> {
        let body = CreateStoryRequest { token, story };
        let response: StoryResponse = self
            .call(Method::POST, &["stories"], None, Some(&body))
            .await?;
        Ok(response.story)
    }

    async fn delete_story(&self, token: &str, story_id: &str) -> ApiResult<()> {
        let body = TokenRequest { token };
        let _: Ignored = self
            .call(Method::DELETE, &["stories", story_id], None, Some(&body))
            .await?;
        Ok(())
    }

    async fn update_story(
        &self,
        token: &str,
        story_id: &str,
        update: &StoryUpdate,
    ) -> ApiResult<Story> {
        let body = UpdateStoryRequest {
            token,
            story: update,
        };
        let response: StoryResponse = self
            .call(Method::PATCH, &["stories", story_id], None, Some(&body))
            .await?;
        Ok(response.story)
    }

    async fn signup(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> ApiResult<AuthResponse> {
        let body = CredentialsRequest::signup(username, password, name);
        self.call(Method::POST, &["signup"], None, Some(&body)).await
    }

    async fn login(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
        let body = CredentialsRequest::login(username, password);
        self.call(Method::POST, &["login"], None, Some(&body)).await
    }

    async fn get_user(&self, token: &str, username: &str) -> ApiResult<UserRecord> {
        let response: UserResponse = self
            .call::<(), _>(
                Method::GET,
                &["users", username],
                Some(("token", token)),
                None,
            )
            .await?;
        Ok(response.user)
    }

    async fn update_user(
        &self,
        token: &str,
        username: &str,
        update: &UserUpdate,
    ) -> ApiResult<UserRecord> {
        let body = UpdateUserRequest {
            token,
            user: update,
        };
        let response: UserResponse = self
            .call(Method::PATCH, &["users", username], None, Some(&body))
            .await?;
        Ok(response.user)
    }

    async fn delete_user(&self, token: &str, username: &str) -> ApiResult<()> {
        let body = TokenRequest { token };
        let _: Ignored = self
            .call(Method::DELETE, &["users", username], None, Some(&body))
            .await?;
        Ok(())
    }

    async fn toggle_favorite(
        &self,
        token: &str,
        username: &str,
        story_id: &str,
        action: FavoriteAction,
    ) -> ApiResult<UserRecord> {
        let body = TokenRequest { token };
        let response: UserResponse = self
            .call(
                action.method(),
                &["users", username, "favorites", story_id],
                None,
                Some(&body),
            )
            .await?;
        Ok(response.user)
    }
}
