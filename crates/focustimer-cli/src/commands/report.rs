use clap::Subcommand;
use focustimer_core::{aggregate_now, CategoryRepository, SessionRepository};

use super::{open_store, CliResult};

#[derive(Subcommand, Default)]
pub enum ReportAction {
    /// Full report as JSON
    #[default]
    Json,
    /// Short human-readable summary
    Summary,
}

pub async fn run(action: ReportAction) -> CliResult {
    let store = open_store()?;
    let sessions = SessionRepository::new(store.clone()).list().await;
    let categories = CategoryRepository::new(store).list().await;
    let report = aggregate_now(&sessions, &categories);

    match action {
        ReportAction::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        ReportAction::Summary => {
            if sessions.is_empty() {
                println!("No sessions yet. Start focusing!");
                return Ok(());
            }
            println!("Today:        {} min", report.today_minutes());
            println!("All time:     {} min", report.all_time_minutes());
            println!("Distractions: {}", report.total_distractions);
            println!();
            println!("Last 7 days (min):");
            for point in &report.last_7_days {
                println!("  {}  {:>6.1}", point.label, point.minutes);
            }
            println!();
            println!("By category (min):");
            for slice in &report.category_breakdown {
                println!("  {:<20} {:>5}  {}", slice.name, slice.minutes, slice.color);
            }
        }
    }
    Ok(())
}
