//! CLI command definitions and dispatch.

use std::path::PathBuf;
use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use uniexp_admin::config::{Settings, StoreBackend};
use uniexp_admin::database::{connect_store, create_pool, run_migrations, DatabaseConfig};
use uniexp_admin::services::{LinkKind, NewQuest, QuestTemplate, Rewards, ServiceFactory, Sheet};

/// UniEXP administrative dashboard core
#[derive(Debug, Parser)]
#[command(name = "uniexp-admin", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (extension optional)
    #[arg(short, long, default_value = "config")]
    pub config: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending migrations to the Postgres store
    Migrate,
    /// Print the effective configuration
    ShowConfig,
    /// Check that the store is reachable
    Health,
    /// Print the attendance view of an event on every change until Ctrl-C
    WatchAttendance { event_id: String },
    /// Export the attendees of an event to .xlsx
    ExportAttendees {
        event_id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export the verified participants of an event to .xlsx
    ExportParticipants {
        event_id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export the feedback of an event to .xlsx
    ExportFeedback {
        event_id: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print an organiser's dashboard statistics
    Dashboard { organiser_id: String },
    /// Add a quest to an event and fan it out to every participant
    AddQuest {
        event_id: String,
        #[arg(long)]
        points: u32,
        #[arg(long)]
        diamonds: u32,
        #[command(subcommand)]
        quest: QuestArgs,
    },
    /// Finish the fan-out of an existing quest
    ReconcileQuest { event_id: String, quest_id: String },
    /// Mark a registration as attended
    VerifyAttendance { student_id: String, registration_id: String },
    /// Issue a deep link for an event, merchandise item or quest
    Link { kind: String, id: String },
    /// Resolve a deep-link token back to its id
    ResolveLink { kind: String, token: String },
}

#[derive(Debug, Subcommand)]
pub enum QuestArgs {
    EarlyBird {
        #[arg(long)]
        max_early_bird: u32,
    },
    Qna {
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: String,
    },
    Networking {
        #[arg(long)]
        completion_num: u32,
    },
}

impl From<&QuestArgs> for QuestTemplate {
    fn from(args: &QuestArgs) -> Self {
        match args {
            QuestArgs::EarlyBird { max_early_bird } => QuestTemplate::EarlyBird {
                max_early_bird: *max_early_bird,
            },
            QuestArgs::Qna { question, answer } => QuestTemplate::QnA {
                question: question.clone(),
                correct_answer: answer.clone(),
            },
            QuestArgs::Networking { completion_num } => QuestTemplate::Networking {
                completion_num: *completion_num,
            },
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, settings: Settings) -> anyhow::Result<()> {
        match &self.command {
            Commands::Migrate => return migrate(&settings).await,
            Commands::ShowConfig => {
                let mut shown = settings.clone();
                shown.links.secret = "********".to_string();
                println!("{}", toml::to_string_pretty(&shown)?);
                return Ok(());
            }
            _ => {}
        }

        let store = connect_store(&settings.store).await?;
        let services = ServiceFactory::new(store, &settings)?;

        match &self.command {
            Commands::Migrate | Commands::ShowConfig => Ok(()),
            Commands::Health => {
                let status = services.health_check().await;
                print_json(&status)?;
                anyhow::ensure!(status.is_healthy(), "store is not reachable");
                Ok(())
            }
            Commands::WatchAttendance { event_id } => {
                let mut view = services.aggregation.watch_attendance(event_id).await?;
                loop {
                    tokio::select! {
                        next = view.next() => match next {
                            Some(snapshot) => {
                                let snapshot = snapshot?;
                                println!(
                                    "attended {} / absent {} / unmatched records {}",
                                    snapshot.matched_count(),
                                    snapshot.unmatched_count(),
                                    snapshot.missing.len()
                                );
                            }
                            None => break,
                        },
                        _ = tokio::signal::ctrl_c() => break,
                    }
                }
                view.close();
                Ok(())
            }
            Commands::ExportAttendees { event_id, output } => {
                let view = services.aggregation.attendance_view(event_id).await?;
                let path = output
                    .clone()
                    .unwrap_or_else(|| services.export.default_path(&format!("attendees-{}", event_id)));
                let saved = services.export.save(&Sheet::attendees(&view.matched), path)?;
                println!("{} attendees written to {}", view.matched_count(), saved.display());
                Ok(())
            }
            Commands::ExportParticipants { event_id, output } => {
                let view = services.aggregation.participants_view(event_id).await?;
                let path = output
                    .clone()
                    .unwrap_or_else(|| services.export.default_path(&format!("participants-{}", event_id)));
                let saved = services.export.save(&Sheet::participants(&view.matched), path)?;
                println!("{} participants written to {}", view.matched_count(), saved.display());
                Ok(())
            }
            Commands::ExportFeedback { event_id, output } => {
                let view = services.aggregation.feedback_view(event_id).await?;
                let path = output
                    .clone()
                    .unwrap_or_else(|| services.export.default_path(&format!("feedback-{}", event_id)));
                let saved = services.export.save(&Sheet::feedback(&view.rows), path)?;
                println!("{} feedback entries written to {}", view.count(), saved.display());
                Ok(())
            }
            Commands::Dashboard { organiser_id } => {
                let stats = services.statistics.dashboard(organiser_id, Utc::now()).await?;
                print_json(&stats)
            }
            Commands::AddQuest {
                event_id,
                points,
                diamonds,
                quest,
            } => {
                let quest = NewQuest::new(
                    quest.into(),
                    Rewards {
                        points: *points,
                        diamonds: *diamonds,
                    },
                );
                let report = services.quests.create_quest(event_id, &quest).await?;
                print_json(&report)?;
                report.ensure_complete()?;
                Ok(())
            }
            Commands::ReconcileQuest { event_id, quest_id } => {
                let report = services.quests.reconcile(event_id, quest_id).await?;
                print_json(&report)?;
                report.ensure_complete()?;
                Ok(())
            }
            Commands::VerifyAttendance {
                student_id,
                registration_id,
            } => {
                let outcome = services.attendance.verify_attendance(student_id, registration_id).await?;
                println!("{}", outcome.message());
                Ok(())
            }
            Commands::Link { kind, id } => {
                let kind: LinkKind = kind.parse()?;
                println!("{}", services.links.link_for(kind, id)?);
                Ok(())
            }
            Commands::ResolveLink { kind, token } => {
                let kind: LinkKind = kind.parse()?;
                println!("{}", services.links.resolve(kind, token)?);
                Ok(())
            }
        }
    }
}

async fn migrate(settings: &Settings) -> anyhow::Result<()> {
    if settings.store.backend != StoreBackend::Postgres {
        println!("The in-memory store has no migrations.");
        return Ok(());
    }

    let pool = create_pool(&DatabaseConfig::from(&settings.store))
        .await
        .context("Failed to connect to the document store")?;
    run_migrations(&pool).await?;
    println!("Migrations applied.");
    Ok(())
}
