use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod auth;
pub mod crew;
pub mod schedule;
pub mod slot;

use crate::calendar::EventPublisher;
use crate::calendar::slot::{DEFAULT_DURATION_MINUTES, DEFAULT_TIMEZONE};
use crate::core::AppConfig;
use crate::google::{CredentialStore, GoogleAuthorizer, GoogleCalendar};

#[derive(Subcommand)]
enum Command {
    /// Find a slot and create the event with a Meet link
    Schedule {
        #[arg(long, default_value = "Project Meeting with auto find slot")]
        summary: String,

        #[arg(long)]
        description: Option<String>,

        /// Email address to invite, can be repeated
        #[arg(long = "attendee")]
        attendees: Vec<String>,

        /// Meeting length in minutes
        #[arg(long, default_value_t = DEFAULT_DURATION_MINUTES)]
        duration: u32,

        #[arg(long, default_value = DEFAULT_TIMEZONE)]
        timezone: String,

        #[command(flatten)]
        credentials: CredentialArgs,
    },
    /// Let the scheduling agents find a slot and create the event
    Crew {
        #[arg(long, default_value = "Project Kickoff Meeting")]
        summary: String,

        #[arg(long)]
        description: Option<String>,

        /// Email address to invite, can be repeated
        #[arg(long = "attendee")]
        attendees: Vec<String>,

        #[command(flatten)]
        credentials: CredentialArgs,
    },
    /// Print the next proposed slot as JSON
    FindSlot {
        #[arg(long, default_value_t = DEFAULT_DURATION_MINUTES)]
        duration: u32,

        #[arg(long, default_value = DEFAULT_TIMEZONE)]
        timezone: String,
    },
    /// Authorize calendar access and cache the credential
    Auth {
        #[command(flatten)]
        credentials: CredentialArgs,
    },
}

#[derive(clap::Args)]
struct CredentialArgs {
    /// Path to the OAuth client secret file
    #[arg(long)]
    client_secret: Option<PathBuf>,

    /// Path to the cached credential
    #[arg(long)]
    token: Option<PathBuf>,

    /// Print the consent URL without opening a browser
    #[arg(long, action, default_value = "false")]
    no_browser: bool,
}

impl CredentialArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(path) = &self.client_secret {
            config.client_secret_path = path.clone();
        }
        if let Some(path) = &self.token {
            config.token_path = path.clone();
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

/// Wire up the publisher against Google with the configured paths.
pub fn publisher(config: &AppConfig, open_browser: bool) -> EventPublisher {
    EventPublisher::new(
        CredentialStore::new(&config.token_path),
        Box::new(GoogleAuthorizer::new(&config.client_secret_path).open_browser(open_browser)),
        Box::new(GoogleCalendar::new(&config.calendar_api_url)),
        &config.calendar_id,
    )
}

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Cli::parse();
    let mut config = AppConfig::default();

    // Handle each sub command
    match args.command {
        Some(Command::Schedule {
            summary,
            description,
            attendees,
            duration,
            timezone,
            credentials,
        }) => {
            credentials.apply(&mut config);
            schedule::run(
                &config,
                &summary,
                description.as_deref(),
                &attendees,
                duration,
                &timezone,
                !credentials.no_browser,
            )
            .await?;
        }
        Some(Command::Crew {
            summary,
            description,
            attendees,
            credentials,
        }) => {
            credentials.apply(&mut config);
            crew::run(
                &config,
                &summary,
                description.as_deref(),
                &attendees,
                !credentials.no_browser,
            )
            .await?;
        }
        Some(Command::FindSlot { duration, timezone }) => {
            slot::run(duration, &timezone)?;
        }
        Some(Command::Auth { credentials }) => {
            credentials.apply(&mut config);
            auth::run(&config, !credentials.no_browser).await?;
        }
        None => {}
    }

    Ok(())
}
