//! Plain-text views of stories and the user profile

use std::fmt::Write;

use entities::{Story, StoryList, User};

/// Marker for a favorited story.
pub const FAVORITE: &str = "★";
/// Marker for a story that is not a favorite.
pub const NOT_FAVORITE: &str = "☆";
/// Marker shown on the user's own stories, which may be deleted.
pub const TRASH: &str = "🗑";

pub const NO_FAVORITES: &str = "No favorites added!";
pub const NO_OWN_STORIES: &str = "No stories added by user yet!";
pub const NO_STORIES: &str = "No stories yet.";

/// Favorite marker for a story, given the current user (if any).
pub fn favorite_marker(story: &Story, user: Option<&User>) -> &'static str {
    if user.is_some_and(|u| u.is_favorite(story.id())) {
        FAVORITE
    } else {
        NOT_FAVORITE
    }
}

/// Renders one story on a single line.
pub fn story_line(story: &Story, user: Option<&User>, deletable: bool) -> String {
    let mut line = String::new();
    if deletable {
        line.push_str(TRASH);
        line.push(' ');
    }
    let _ = write!(
        line,
        "{} {} ({}) by {} posted by {} [{}]",
        favorite_marker(story, user),
        story.title,
        story.host_name(),
        story.author,
        story.username,
        story.id(),
    );
    line
}

fn lines(stories: &[Story], user: Option<&User>, deletable: bool, empty: &str) -> String {
    if stories.is_empty() {
        return empty.to_string();
    }

    stories
        .iter()
        .map(|story| story_line(story, user, deletable))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The "all stories" view.
pub fn all_stories(list: &StoryList, user: Option<&User>) -> String {
    lines(list.stories(), user, false, NO_STORIES)
}

/// The favorites view.
pub fn favorites(user: &User) -> String {
    lines(&user.favorites, Some(user), false, NO_FAVORITES)
}

/// The "my stories" view; own stories carry the trash marker.
pub fn own_stories(user: &User) -> String {
    lines(&user.own_stories, Some(user), true, NO_OWN_STORIES)
}

/// The profile view.
pub fn profile(user: &User) -> String {
    format!(
        "Name: {}\nUsername: {}\nAccount Created: {}",
        user.name,
        user.username,
        user.created_at.format("%Y-%m-%d"),
    )
}
