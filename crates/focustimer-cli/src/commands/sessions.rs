use clap::Subcommand;
use focustimer_core::{format_clock, SessionRepository};

use super::{open_store, CliResult};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// List recorded sessions, most recent first
    List {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete one session by id
    Delete {
        /// Session id
        id: String,
    },
    /// Delete every session
    Clear,
}

pub async fn run(action: SessionsAction) -> CliResult {
    let sessions = SessionRepository::new(open_store()?);

    match action {
        SessionsAction::List { json } => {
            let list = sessions.list_recent_first().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
                return Ok(());
            }
            if list.is_empty() {
                println!("No sessions recorded.");
                return Ok(());
            }
            for s in &list {
                println!(
                    "{}  {}  {:>6} / {:<6}  {:>2} distractions  {}",
                    s.id,
                    s.date.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
                    format_clock(s.elapsed),
                    format_clock(s.duration),
                    s.distractions,
                    s.category
                );
            }
        }
        SessionsAction::Delete { id } => {
            let before = sessions.list().await.len();
            let remaining = sessions.delete_by_id(&id).await;
            if remaining.len() == before {
                return Err(format!("no session with id {id}").into());
            }
            println!("deleted {id}");
        }
        SessionsAction::Clear => {
            sessions.clear().await;
            println!("all sessions cleared");
        }
    }
    Ok(())
}
