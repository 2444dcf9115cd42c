use std::{fs, path::PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use client_core::{
    calendar::MonthCursor, config::normalize_base_url, execute_mutation, load_settings_from,
    login_and_store, AudioClip, ClientSettings, HttpBackend, Settlement, TaskApi, TaskBoard,
    TaskDraft, VoiceApi, VoiceSession,
};
use shared::domain::{parse_due_date, TaskId, TaskPriority, TaskStatus};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(name = "taskdeck", about = "Kanban task board and assistant client")]
struct Cli {
    /// TOML settings file; `taskdeck.toml` in the working directory is used when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    token_path: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Tasks of one column, or all tasks.
    List {
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    Board,
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "media")]
        priority: TaskPriority,
        /// YYYY-MM-DD, defaults to today.
        #[arg(long)]
        due: Option<String>,
        #[arg(long, default_value = "entrada")]
        status: TaskStatus,
    },
    /// Moves a task onto a column id or onto another task's column.
    Move { id: String, target: String },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<TaskPriority>,
        #[arg(long)]
        due: Option<String>,
    },
    Delete { id: String },
    /// Sends a text command, or an audio file with `--audio`.
    Say {
        text: Option<String>,
        #[arg(long)]
        audio: Option<PathBuf>,
        #[arg(long)]
        voice_id: Option<String>,
        /// Writes the spoken reply, if any, to this file.
        #[arg(long)]
        save_audio: Option<PathBuf>,
    },
    Calendar {
        /// YYYY-MM, defaults to the current month.
        #[arg(long)]
        month: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    let tokens = settings
        .token_store()
        .ok_or_else(|| anyhow!("no token location; pass --token-path"))?;
    let backend = client_core::connect(&settings).context("failed to set up backend client")?;
    info!(api = backend.base_url(), "taskdeck cli");

    match cli.command {
        Command::Login { email, password } => {
            let login = login_and_store(&backend, &tokens, &email, &password).await?;
            let name = login
                .user
                .and_then(|u| u.name)
                .unwrap_or_else(|| email.clone());
            println!("logged in as {name}; token saved to {}", tokens.path().display());
        }
        Command::Logout => {
            if tokens.clear()? {
                println!("logged out");
            } else {
                println!("no saved token");
            }
        }
        Command::List { status } => {
            let board = load_board(&backend, &settings).await?;
            let today = Local::now().date_naive();
            match status {
                Some(status) => print!("{}", render::column(&board, status, today)),
                None => {
                    for status in TaskStatus::ALL {
                        print!("{}", render::column(&board, status, today));
                    }
                }
            }
        }
        Command::Board => {
            let board = load_board(&backend, &settings).await?;
            print!("{}", render::board(&board, Local::now().date_naive()));
        }
        Command::Add {
            title,
            description,
            priority,
            due,
            status,
        } => {
            let mut board = load_board(&backend, &settings).await?;
            let now = Utc::now();
            let due_date = match due {
                Some(raw) => parse_due_date(&raw)?,
                None => Local::now().date_naive(),
            };
            let draft = TaskDraft {
                title,
                description,
                status,
                priority,
                due_date,
            };
            let local_id = board
                .create_task(draft, now)
                .ok_or_else(|| anyhow!("task title must not be empty"))?;
            // No local store survives the process, so the create always goes out.
            let mutation = board
                .begin_remote_create(&local_id)
                .ok_or_else(|| anyhow!("created task vanished"))?;
            let settlement = settle(&backend, &mut board, mutation).await?;
            if let Settlement::Created { task_id, .. } = settlement {
                println!("created task {task_id}");
            }
        }
        Command::Move { id, target } => {
            let mut board = load_board(&backend, &settings).await?;
            let task_id = TaskId::new(id);
            if board.task(&task_id).is_none() {
                bail!("no task with id {task_id}");
            }
            board.drag_started(task_id.clone());
            match board.drop_task(&task_id, Some(&target)) {
                Some(mutation) => {
                    settle(&backend, &mut board, mutation).await?;
                    let status = board
                        .store()
                        .status_of(&task_id)
                        .map(TaskStatus::label)
                        .unwrap_or("?");
                    println!("moved task {task_id} to {status}");
                }
                None => println!("task {task_id} stays where it is"),
            }
        }
        Command::Edit {
            id,
            title,
            description,
            priority,
            due,
        } => {
            let mut board = load_board(&backend, &settings).await?;
            let task_id = TaskId::new(id);
            let mut task = board
                .task(&task_id)
                .cloned()
                .ok_or_else(|| anyhow!("no task with id {task_id}"))?;
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(description) = description {
                task.description = Some(description).filter(|d| !d.trim().is_empty());
            }
            if let Some(priority) = priority {
                task.priority = priority;
            }
            if let Some(due) = due {
                task.due_date = parse_due_date(&due)?;
            }
            let mutation = board.begin_update(task)?;
            settle(&backend, &mut board, mutation).await?;
            println!("updated task {task_id}");
        }
        Command::Delete { id } => {
            let mut board = load_board(&backend, &settings).await?;
            let task_id = TaskId::new(id);
            let mutation = board
                .begin_delete(&task_id)
                .ok_or_else(|| anyhow!("no task with id {task_id}"))?;
            settle(&backend, &mut board, mutation).await?;
            println!("deleted task {task_id}");
        }
        Command::Say {
            text,
            audio,
            voice_id,
            save_audio,
        } => {
            let voice_id = voice_id.or_else(|| settings.voice_id.clone());
            let mut session = VoiceSession::new();
            let now = Utc::now();
            let response = match (text, audio) {
                (_, Some(path)) => {
                    let bytes = fs::read(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    let clip = AudioClip {
                        filename: path
                            .file_name()
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_else(|| "audio.webm".to_string()),
                        mime_type: None,
                        bytes,
                    };
                    session.begin_audio();
                    backend.send_audio(clip, voice_id.as_deref()).await?
                }
                (Some(text), None) => {
                    let text = session
                        .begin_text(&text, now)
                        .ok_or_else(|| anyhow!("nothing to say"))?;
                    backend.send_text(&text, voice_id.as_deref()).await?
                }
                (None, None) => bail!("pass a text command or --audio FILE"),
            };
            let effects = session.finish(&response, Utc::now());
            print!("{}", render::conversation(session.history()));
            if let (Some(path), Some(audio)) = (save_audio, effects.audio) {
                fs::write(&path, audio)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("reply audio saved to {}", path.display());
            }
            if effects.reload_tasks {
                let board = load_board(&backend, &settings).await?;
                print!("{}", render::board(&board, Local::now().date_naive()));
            }
            session.settle();
        }
        Command::Calendar { month } => {
            let today = Local::now().date_naive();
            let cursor = match month {
                Some(raw) => MonthCursor::parse(&raw)
                    .ok_or_else(|| anyhow!("month must look like YYYY-MM, got '{raw}'"))?,
                None => MonthCursor::containing(today),
            };
            let board = load_board(&backend, &settings).await?;
            print!("{}", render::calendar(&board, cursor, today)?);
        }
    }

    Ok(())
}

fn resolve_settings(cli: &Cli) -> Result<ClientSettings> {
    let mut settings = match &cli.config {
        Some(path) => load_settings_from(Some(path.as_path()))?,
        None => client_core::load_settings()?,
    };
    if let Some(url) = &cli.api_url {
        settings.api_base_url = normalize_base_url(url)?;
    }
    if let Some(path) = &cli.token_path {
        settings.token_path = Some(path.clone());
    }
    Ok(settings)
}

async fn load_board(backend: &HttpBackend, settings: &ClientSettings) -> Result<TaskBoard> {
    let records = backend
        .list_tasks()
        .await
        .context("failed to load tasks")?;
    let mut board = TaskBoard::new(settings.failure_policy);
    board.load_records(records, Utc::now());
    Ok(board)
}

async fn settle(
    backend: &HttpBackend,
    board: &mut TaskBoard,
    mutation: client_core::RemoteMutation,
) -> Result<Settlement> {
    let result = execute_mutation(backend, &mutation).await;
    if let Err(failure) = &result.outcome {
        if failure.unauthorized {
            eprintln!("not authorized; run `taskdeck login <email> --password ...` first");
        }
    }
    let settlement = board.apply_result(result, Utc::now());
    match settlement.failure_reason() {
        Some(reason) => bail!("{} failed: {reason}", mutation.label()),
        None => Ok(settlement),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands_with_wire_values() {
        let cli = Cli::try_parse_from([
            "taskdeck",
            "--api-url",
            "http://localhost:5000",
            "add",
            "Buy milk",
            "--priority",
            "alta",
            "--due",
            "2025-03-12",
        ])
        .expect("parse");
        match cli.command {
            Command::Add {
                title,
                priority,
                status,
                ..
            } => {
                assert_eq!(title, "Buy milk");
                assert_eq!(priority, TaskPriority::High);
                assert_eq!(status, TaskStatus::Entry);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn move_takes_task_and_target() {
        let cli = Cli::try_parse_from(["taskdeck", "move", "4", "concluida"]).expect("parse");
        assert!(matches!(
            cli.command,
            Command::Move { ref id, ref target } if id == "4" && target == "concluida"
        ));
    }

    #[test]
    fn rejects_unknown_status_filter() {
        assert!(Cli::try_parse_from(["taskdeck", "list", "--status", "later"]).is_err());
    }
}
