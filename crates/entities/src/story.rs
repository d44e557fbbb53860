//! Story-related entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::host_name;

/// A story posted to the news API.
///
/// The identifier is assigned by the server and cannot be changed afterwards,
/// so it is only exposed through [`Story::id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Server-assigned identifier.
    story_id: String,
    /// Author credited for the story.
    pub author: String,
    /// Story title.
    pub title: String,
    /// Link to the story.
    pub url: String,
    /// Username of the poster.
    pub username: String,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Story {
    /// Creates a story from a server-assigned id and submitted fields.
    pub fn new(
        story_id: impl Into<String>,
        username: impl Into<String>,
        story: NewStory,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            story_id: story_id.into(),
            author: story.author,
            title: story.title,
            url: story.url,
            username: username.into(),
            created_at,
            updated_at: created_at,
        }
    }

    /// Returns the server-assigned identifier.
    pub fn id(&self) -> &str {
        &self.story_id
    }

    /// Returns the host the story links to.
    pub fn host_name(&self) -> &str {
        host_name(&self.url)
    }

    /// Copies the fields a story update may change from `other`.
    ///
    /// The identifier, poster and creation time are left untouched.
    pub fn apply_update(&mut self, other: &Story) {
        self.author.clone_from(&other.author);
        self.title.clone_from(&other.title);
        self.url.clone_from(&other.url);
        self.updated_at = other.updated_at;
    }
}

/// Fields submitted when posting a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStory {
    /// Author credited for the story.
    pub author: String,
    /// Story title.
    pub title: String,
    /// Link to the story.
    pub url: String,
}

impl NewStory {
    /// Creates a new story payload.
    pub fn new(
        author: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Partial story update. Only fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl StoryUpdate {
    /// Sets the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.author.is_none() && self.title.is_none() && self.url.is_none()
    }
}

/// The "all stories" view: an ordered list of stories as returned by the
/// server, plus local insertions and removals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryList {
    stories: Vec<Story>,
}

impl StoryList {
    /// Wraps an ordered list of stories.
    pub fn new(stories: Vec<Story>) -> Self {
        Self { stories }
    }

    /// Returns the stories in display order.
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    /// Finds a story by id.
    pub fn get(&self, story_id: &str) -> Option<&Story> {
        self.stories.iter().find(|s| s.id() == story_id)
    }

    /// Finds a story by id for in-place updates.
    pub fn get_mut(&mut self, story_id: &str) -> Option<&mut Story> {
        self.stories.iter_mut().find(|s| s.id() == story_id)
    }

    /// Inserts a story at the front of the list.
    pub fn insert_front(&mut self, story: Story) {
        self.stories.insert(0, story);
    }

    /// Removes every story with the given id.
    pub fn remove_by_id(&mut self, story_id: &str) {
        self.stories.retain(|s| s.id() != story_id);
    }

    /// Number of stories.
    pub fn len(&self) -> usize {
        self.stories.len()
    }

    /// Returns true if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }
}

impl From<Vec<Story>> for StoryList {
    fn from(stories: Vec<Story>) -> Self {
        Self::new(stories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(id: &str) -> Story {
        Story::new(
            id,
            "alice",
            NewStory::new("Author", format!("Title {id}"), "https://www.example.com/a"),
            Utc::now(),
        )
    }

    #[test]
    fn test_story_deserializes_camel_case() {
        let json = r#"{
            "storyId": "5e3f",
            "author": "Ada",
            "title": "Notes",
            "url": "https://example.com/notes",
            "username": "ada",
            "createdAt": "2019-11-07T19:44:37.316Z",
            "updatedAt": "2019-11-07T19:44:37.316Z"
        }"#;

        let story: Story = serde_json::from_str(json).unwrap();
        assert_eq!(story.id(), "5e3f");
        assert_eq!(story.username, "ada");
        assert_eq!(story.host_name(), "example.com");
    }

    #[test]
    fn test_apply_update_keeps_identity() {
        let mut original = story("1");
        let mut changed = story("other");
        changed.title = "New title".to_string();
        changed.username = "mallory".to_string();

        original.apply_update(&changed);

        assert_eq!(original.id(), "1");
        assert_eq!(original.title, "New title");
        assert_eq!(original.username, "alice");
    }

    #[test]
    fn test_story_update_serializes_only_set_fields() {
        let update = StoryUpdate::default().with_title("Only title");
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, serde_json::json!({ "title": "Only title" }));
        assert!(StoryUpdate::default().is_empty());
    }

    #[test]
    fn test_story_list_insert_and_remove() {
        let mut list = StoryList::new(vec![story("1"), story("2")]);

        list.insert_front(story("3"));
        assert_eq!(list.stories()[0].id(), "3");
        assert_eq!(list.len(), 3);

        list.remove_by_id("2");
        assert!(list.get("2").is_none());
        assert_eq!(list.len(), 2);

        list.remove_by_id("missing");
        assert_eq!(list.len(), 2);
    }
}
