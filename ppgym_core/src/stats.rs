//! Aggregate statistics derived from the session list.
//!
//! Nothing here is stored: every figure is recomputed from the sessions on
//! demand. Calendar arithmetic happens on local dates, with weeks starting
//! on Sunday.

use crate::types::{Program, WorkoutSession};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Days kept in the per-day progression series
const DAILY_SERIES_DAYS: usize = 30;

/// Workouts and minutes logged on one calendar day
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub workouts: usize,
    pub minutes: u32,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutStats {
    /// Completed sessions, all time
    pub total_workouts: usize,
    /// Sessions of any state, including unfinished ones
    pub total_sessions: usize,
    pub this_week: usize,
    pub this_month: usize,
    /// `total_workouts / total_sessions * 100`, 0 without sessions
    pub completion_rate: f64,
    pub average_duration_minutes: f64,
    pub average_per_week: f64,
    pub current_streak: u32,
    pub best_streak: u32,
    pub per_program: BTreeMap<Program, usize>,
    /// Completed sessions whose template belongs to no program
    pub unassigned: usize,
    /// Program with the most completed sessions; `None` on a tie
    pub favorite_program: Option<Program>,
    pub daily: Vec<DailyProgress>,
}

/// Compute statistics over `sessions` as seen on `today`
pub fn compute_statistics(sessions: &[WorkoutSession], today: NaiveDate) -> WorkoutStats {
    let completed: Vec<&WorkoutSession> = sessions.iter().filter(|s| s.completed).collect();
    let total_workouts = completed.len();
    let total_sessions = sessions.len();

    let week_start =
        today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
    let this_week = completed
        .iter()
        .filter(|s| s.local_date() >= week_start)
        .count();
    let this_month = completed
        .iter()
        .filter(|s| {
            let date = s.local_date();
            date.year() == today.year() && date.month() == today.month()
        })
        .count();

    let completion_rate = if total_sessions == 0 {
        0.0
    } else {
        total_workouts as f64 / total_sessions as f64 * 100.0
    };

    let durations: Vec<u32> = completed.iter().filter_map(|s| s.duration_minutes).collect();
    let average_duration_minutes = if durations.is_empty() {
        0.0
    } else {
        durations.iter().map(|d| f64::from(*d)).sum::<f64>() / durations.len() as f64
    };

    let dates: BTreeSet<NaiveDate> = completed.iter().map(|s| s.local_date()).collect();
    let (current_streak, best_streak) = streaks(&dates, today);

    let average_per_week = match dates.first() {
        Some(first) => {
            let days = ((today - *first).num_days() + 1).max(7);
            total_workouts as f64 / (days as f64 / 7.0)
        }
        None => 0.0,
    };

    let mut per_program: BTreeMap<Program, usize> =
        Program::ALL.into_iter().map(|p| (p, 0)).collect();
    let mut unassigned = 0;
    for session in &completed {
        match Program::for_template(&session.template_id) {
            Some(program) => *per_program.entry(program).or_insert(0) += 1,
            None => unassigned += 1,
        }
    }
    let favorite_program = favorite(&per_program);

    WorkoutStats {
        total_workouts,
        total_sessions,
        this_week,
        this_month,
        completion_rate,
        average_duration_minutes,
        average_per_week,
        current_streak,
        best_streak,
        per_program,
        unassigned,
        favorite_program,
        daily: daily_series(&completed),
    }
}

/// Current and best runs of consecutive days
///
/// The current streak counts back from `today` and is 0 when nothing was
/// completed today.
fn streaks(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> (u32, u32) {
    let mut best = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;

    for date in dates {
        run = match previous {
            Some(prev) if *date - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(*date);
    }

    let mut current = 0u32;
    let mut day = today;
    while dates.contains(&day) {
        current += 1;
        day -= Duration::days(1);
    }

    (current, best)
}

fn favorite(per_program: &BTreeMap<Program, usize>) -> Option<Program> {
    let top = per_program.values().copied().max()?;
    if top == 0 {
        return None;
    }
    let mut leaders = per_program.iter().filter(|(_, count)| **count == top);
    let (program, _) = leaders.next()?;
    match leaders.next() {
        Some(_) => None,
        None => Some(*program),
    }
}

fn daily_series(completed: &[&WorkoutSession]) -> Vec<DailyProgress> {
    let mut by_day: BTreeMap<NaiveDate, (usize, u32)> = BTreeMap::new();
    for session in completed {
        let entry = by_day.entry(session.local_date()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += session.duration_minutes.unwrap_or(0);
    }

    let skip = by_day.len().saturating_sub(DAILY_SERIES_DAYS);
    by_day
        .into_iter()
        .skip(skip)
        .map(|(date, (workouts, minutes))| DailyProgress {
            date,
            workouts,
            minutes,
        })
        .collect()
}
