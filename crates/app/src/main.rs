use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use clap::Parser;
use services::{AppServices, Clock, Command, LogNotifier, ReminderTask};
use tracker_core::progress::UnitFilter;
use tracker_core::reminder::ReminderSettings;
use tracker_core::state::TrackerState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod db;
mod render;

use cli::{Cli, Commands};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "study_tracker=info,services=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn reminder_settings(cli: &Cli) -> Result<ReminderSettings, tracker_core::Error> {
    let settings = ReminderSettings::new(
        Duration::minutes(cli.gap_minutes),
        Duration::minutes(cli.poll_minutes),
        Duration::seconds(cli.initial_delay_secs),
    )?;
    Ok(settings)
}

async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let settings = reminder_settings(&cli)?;

    // Open + migrate SQLite here so the library crates stay free of path handling.
    let db_url = db::normalize_sqlite_url(&cli.db);
    db::prepare_sqlite_file(&db_url)?;
    let services =
        AppServices::new_sqlite(&db_url, Clock::system(), Arc::new(LogNotifier), settings)
            .await
            .with_context(|| format!("open database {db_url}"))?;
    tracing::debug!(%db_url, "database ready");

    let tracker = services.tracker();
    let mut state = TrackerState::new();
    tracker.refresh(&mut state).await?;

    let command = match cli.command {
        Commands::List {
            subject,
            status,
            query,
        } => {
            state.set_filter(UnitFilter {
                subject,
                status: status.map(Into::into),
                query,
            });
            print!("{}", render::units(&state));
            return Ok(());
        }
        Commands::Subjects => {
            for subject in state.subjects() {
                println!("{subject}");
            }
            return Ok(());
        }
        Commands::Remind { watch: false } => {
            let outcome = services.reminders().check_once().await?;
            println!("{}", render::reminder(&outcome));
            return Ok(());
        }
        Commands::Remind { watch: true } => {
            let task = ReminderTask::spawn(services.reminders());
            tokio::signal::ctrl_c()
                .await
                .context("wait for interrupt")?;
            task.stop().await?;
            return Ok(());
        }
        Commands::Add {
            subject,
            name,
            topics,
        } => {
            let mut draft = state.begin_add();
            draft.subject = subject;
            draft.name = name;
            draft.topics = topics;
            Command::CreateUnit(draft)
        }
        Commands::Edit {
            id,
            subject,
            name,
            topics,
        } => {
            let mut draft = state.begin_edit(id)?;
            if let Some(subject) = subject {
                draft.subject = subject;
            }
            if let Some(name) = name {
                draft.name = name;
            }
            if !topics.is_empty() {
                draft.topics = topics;
            }
            Command::EditUnit { unit_id: id, draft }
        }
        Commands::Toggle { id, topic } => {
            let topic_index = topic.checked_sub(1).context("topic numbers start at 1")?;
            Command::ToggleTopic {
                unit_id: id,
                topic_index,
            }
        }
        Commands::Delete { id } => Command::DeleteUnit(id),
    };

    let outcome = tracker.dispatch(&mut state, command).await?;
    println!("{}", render::outcome(&outcome));
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err:#}");
        std::process::exit(2);
    }
}
