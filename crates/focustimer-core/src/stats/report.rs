//! Focus report aggregation.
//!
//! Pure function of the session history, the live category list and "now".
//! Calendar days are taken in `now`'s time zone.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::storage::{Category, Session, CATEGORY_PALETTE};

/// Days covered by the daily series, ending today.
pub const SERIES_DAYS: i64 = 7;

/// One bar of the daily series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPoint {
    pub date: NaiveDate,
    /// `MM-DD`
    pub label: String,
    /// Fractional minutes of focus that day.
    pub minutes: f64,
}

/// One slice of the category breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub name: String,
    pub minutes: u64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusReport {
    pub today_total_secs: u64,
    pub all_time_total_secs: u64,
    pub total_distractions: u64,
    pub last_7_days: Vec<DayPoint>,
    /// In the order categories first appear in the session list.
    pub category_breakdown: Vec<CategorySlice>,
}

impl FocusReport {
    pub fn today_minutes(&self) -> u64 {
        round_minutes(self.today_total_secs)
    }

    pub fn all_time_minutes(&self) -> u64 {
        round_minutes(self.all_time_total_secs)
    }
}

/// Aggregate with "today" taken from the local clock.
pub fn aggregate_now(sessions: &[Session], categories: &[Category]) -> FocusReport {
    aggregate(sessions, categories, &Local::now())
}

pub fn aggregate<Tz: TimeZone>(
    sessions: &[Session],
    categories: &[Category],
    now: &DateTime<Tz>,
) -> FocusReport {
    let zone = now.timezone();
    let today = now.date_naive();

    let mut last_7_days: Vec<DayPoint> = (0..SERIES_DAYS)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            DayPoint {
                date,
                label: date.format("%m-%d").to_string(),
                minutes: 0.0,
            }
        })
        .collect();
    let first_day = last_7_days[0].date;

    let mut today_total_secs = 0;
    let mut all_time_total_secs = 0;
    let mut total_distractions = 0;
    let mut per_category: IndexMap<&str, u64> = IndexMap::new();

    for session in sessions {
        let day = session.date.with_timezone(&zone).date_naive();

        all_time_total_secs += session.elapsed;
        total_distractions += u64::from(session.distractions);
        if day == today {
            today_total_secs += session.elapsed;
        }
        *per_category.entry(session.category.as_str()).or_insert(0) += session.elapsed;

        if day >= first_day && day <= today {
            let index = (day - first_day).num_days() as usize;
            last_7_days[index].minutes += session.elapsed as f64 / 60.0;
        }
    }

    let category_breakdown = per_category
        .into_iter()
        .enumerate()
        .map(|(index, (name, secs))| CategorySlice {
            name: name.to_string(),
            minutes: round_minutes(secs),
            color: categories
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.color.clone())
                .unwrap_or_else(|| CATEGORY_PALETTE[index % CATEGORY_PALETTE.len()].to_string()),
        })
        .collect();

    FocusReport {
        today_total_secs,
        all_time_total_secs,
        total_distractions,
        last_7_days,
        category_breakdown,
    }
}

fn round_minutes(secs: u64) -> u64 {
    (secs as f64 / 60.0).round() as u64
}
