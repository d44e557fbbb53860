//! Command line surface

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use entities::{host_name, NewStory, StoryUpdate, UserUpdate};
use news_api::{HttpNewsApi, MemoryNewsApi, NewsApi, NewsClient};
use session_store::{FileSessionStore, KeyringSessionStore, MemorySessionStore, SessionStore};
use tracing::debug;

use crate::render;
use crate::{CliConfig, Controller, ControllerError, ControllerResult, SessionBackend};

/// Browse and post stories on Hack-or-Snooze
#[derive(Debug, Parser)]
#[command(name = "snooze", version, about)]
pub struct Cli {
    /// News API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Where to keep the login token between runs
    #[arg(long, global = true, value_enum)]
    pub session_backend: Option<SessionBackend>,

    /// Session file for the file backend
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    /// Use an in-process API and session store instead of the network
    #[arg(long, global = true)]
    pub memory: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Applies command line overrides on top of the loaded configuration.
    pub fn apply_to(&self, config: &mut CliConfig) {
        if let Some(url) = &self.base_url {
            config.base_url.clone_from(url);
        }
        if let Some(backend) = self.session_backend {
            config.session_backend = backend;
        }
        if let Some(path) = &self.session_file {
            config.session_file.clone_from(path);
        }
        if self.memory {
            config.session_backend = SessionBackend::Memory;
        }
    }
}

#[derive(Debug, Args)]
pub struct Credentials {
    #[arg(long, short)]
    pub username: String,

    #[arg(long, short, env = "SNOOZE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List all stories
    Stories,
    /// Create an account and log in
    Signup {
        #[command(flatten)]
        credentials: Credentials,
        /// Display name
        #[arg(long, short)]
        name: String,
    },
    /// Log in
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Log out and forget the stored session
    Logout,
    /// Show the logged-in user's profile
    Profile,
    /// List favorited stories
    Favorites,
    /// List stories you posted
    Mine,
    /// Post a story
    Submit {
        #[arg(long)]
        author: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        url: String,
    },
    /// Edit one of your stories
    UpdateStory {
        story_id: String,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
    /// Delete one of your stories
    DeleteStory { story_id: String },
    /// Add a story to your favorites
    Favorite { story_id: String },
    /// Remove a story from your favorites
    Unfavorite { story_id: String },
    /// Flip a story's favorite marker
    ToggleFavorite { story_id: String },
    /// Change your display name or password
    UpdateProfile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete your account
    DeleteAccount,
    /// Print the host a story URL points to
    Host { url: String },
}

impl Command {
    /// Whether the persisted session and story list must be loaded first.
    fn needs_init(&self) -> bool {
        !matches!(
            self,
            Command::Signup { .. } | Command::Login { .. } | Command::Logout | Command::Host { .. }
        )
    }
}

/// Builds the controller for the configured backends.
pub fn build_controller(config: &CliConfig, memory: bool) -> anyhow::Result<Controller> {
    let api: Arc<dyn NewsApi> = if memory {
        Arc::new(MemoryNewsApi::new())
    } else {
        let api = match config.request_timeout() {
            Some(timeout) => HttpNewsApi::with_timeout(&config.base_url, timeout)?,
            None => HttpNewsApi::new(&config.base_url)?,
        };
        Arc::new(api)
    };

    let backend = if memory {
        SessionBackend::Memory
    } else {
        config.session_backend
    };
    let store: Arc<dyn SessionStore> = match backend {
        SessionBackend::File => Arc::new(FileSessionStore::new(&config.session_file)),
        SessionBackend::Keyring => Arc::new(KeyringSessionStore::new()),
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
    };

    debug!(
        base_url = %config.base_url,
        backend = ?backend,
        memory,
        "Built controller"
    );
    Ok(Controller::new(NewsClient::new(api), store))
}

/// Runs one command and returns the text to print.
pub async fn execute(controller: &Controller, command: Command) -> ControllerResult<String> {
    if command.needs_init() {
        controller.init().await?;
    }

    let output = match command {
        Command::Stories => {
            let context = controller.context().await;
            render::all_stories(&context.story_list, context.current_user.as_ref())
        }
        Command::Signup { credentials, name } => {
            let user = controller
                .signup(&credentials.username, &credentials.password, &name)
                .await?;
            format!("Signed up and logged in as {}", user.username)
        }
        Command::Login { credentials } => {
            let user = controller
                .login(&credentials.username, &credentials.password)
                .await?;
            format!("Logged in as {}", user.username)
        }
        Command::Logout => {
            controller.logout().await?;
            "Logged out".to_string()
        }
        Command::Profile => render::profile(&logged_in(controller).await?),
        Command::Favorites => render::favorites(&logged_in(controller).await?),
        Command::Mine => render::own_stories(&logged_in(controller).await?),
        Command::Submit { author, title, url } => {
            let story = controller
                .submit_story(&NewStory::new(author, title, url))
                .await?;
            let user = controller.current_user().await;
            render::story_line(&story, user.as_ref(), true)
        }
        Command::UpdateStory {
            story_id,
            author,
            title,
            url,
        } => {
            let update = StoryUpdate { author, title, url };
            let story = controller.update_story(&story_id, &update).await?;
            let user = controller.current_user().await;
            render::story_line(&story, user.as_ref(), true)
        }
        Command::DeleteStory { story_id } => {
            controller.delete_story(&story_id).await?;
            format!("Deleted story {story_id}")
        }
        Command::Favorite { story_id } => {
            favorite_output(&story_id, controller.set_favorite(&story_id, true).await?)
        }
        Command::Unfavorite { story_id } => {
            favorite_output(&story_id, controller.set_favorite(&story_id, false).await?)
        }
        Command::ToggleFavorite { story_id } => {
            favorite_output(&story_id, controller.toggle_favorite(&story_id).await?)
        }
        Command::UpdateProfile { name, password } => {
            let user = controller
                .update_profile(&UserUpdate { name, password })
                .await?;
            render::profile(&user)
        }
        Command::DeleteAccount => {
            controller.delete_account().await?;
            "Account deleted".to_string()
        }
        Command::Host { url } => host_name(&url).to_string(),
    };

    Ok(output)
}

async fn logged_in(controller: &Controller) -> ControllerResult<entities::User> {
    controller
        .current_user()
        .await
        .ok_or(ControllerError::NotLoggedIn)
}

fn favorite_output(story_id: &str, is_favorite: bool) -> String {
    let marker = if is_favorite {
        render::FAVORITE
    } else {
        render::NOT_FAVORITE
    };
    format!("{marker} {story_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> Controller {
        build_controller(&CliConfig::default(), true).unwrap()
    }

    fn signup(username: &str) -> Command {
        Command::Signup {
            credentials: Credentials {
                username: username.to_string(),
                password: "pw".to_string(),
            },
            name: "Ada".to_string(),
        }
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "snooze",
            "submit",
            "--author",
            "Ada",
            "--title",
            "Notes",
            "--url",
            "https://example.com",
            "--memory",
        ])
        .unwrap();

        assert!(cli.memory);
        assert!(matches!(cli.command, Command::Submit { .. }));

        let mut config = CliConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config.session_backend, SessionBackend::Memory);
    }

    #[test]
    fn test_cli_session_backend_flag() {
        let cli = Cli::try_parse_from(["snooze", "--session-backend", "keyring", "stories"]).unwrap();
        let mut config = CliConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config.session_backend, SessionBackend::Keyring);
    }

    #[tokio::test]
    async fn test_host_command_needs_no_session() {
        let output = execute(
            &controller(),
            Command::Host {
                url: "https://www.example.com/a".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(output, "example.com");
    }

    #[tokio::test]
    async fn test_profile_requires_login() {
        let err = execute(&controller(), Command::Profile).await.unwrap_err();
        assert_eq!(err.user_message(), "You need to log in first");
    }

    #[tokio::test]
    async fn test_update_profile_without_flags_is_rejected() {
        let controller = controller();
        execute(&controller, signup("ada")).await.unwrap();

        let err = execute(
            &controller,
            Command::UpdateProfile {
                name: None,
                password: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.user_message(), "Nothing to update");
    }

    #[tokio::test]
    async fn test_submit_and_favorite_flow() {
        let controller = controller();
        execute(&controller, signup("ada")).await.unwrap();

        let line = execute(
            &controller,
            Command::Submit {
                author: "Ada".to_string(),
                title: "Notes".to_string(),
                url: "https://www.example.com/notes".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(line.contains("Notes (example.com)"));

        let story_id = controller.context().await.story_list.stories()[0]
            .id()
            .to_string();
        let output = execute(
            &controller,
            Command::ToggleFavorite {
                story_id: story_id.clone(),
            },
        )
        .await
        .unwrap();
        assert_eq!(output, format!("★ {story_id}"));

        let favorites = execute(&controller, Command::Favorites).await.unwrap();
        assert!(favorites.contains(&story_id));

        let output = execute(&controller, Command::Logout).await.unwrap();
        assert_eq!(output, "Logged out");
        assert!(controller.current_user().await.is_none());
    }
}
