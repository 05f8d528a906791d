//! CSV export of the workout history.
//!
//! One row per exercise of every completed session, so weights and set
//! progress can be charted in a spreadsheet.

use crate::types::WorkoutHistoryItem;
use crate::Result;
use std::io::Write;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    session_id: String,
    template_id: &'a str,
    workout_name: &'a str,
    started_at: String,
    completed_at: Option<String>,
    duration_minutes: Option<u32>,
    exercise: &'a str,
    weight: f64,
    completed_sets: usize,
    target_sets: u32,
    target_reps: u32,
}

/// Write history rows to any writer, headers included
pub fn write_history<W: Write>(writer: W, history: &[WorkoutHistoryItem]) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(writer);
    let mut rows = 0;

    for item in history {
        let session = &item.session;
        for exercise in &session.exercises {
            writer.serialize(CsvRow {
                session_id: session.id.to_string(),
                template_id: &session.template_id,
                workout_name: &item.workout_name,
                started_at: session.started_at.to_rfc3339(),
                completed_at: session.completed_at.map(|t| t.to_rfc3339()),
                duration_minutes: session.duration_minutes,
                exercise: &exercise.name,
                weight: exercise.weight,
                completed_sets: exercise.completed_count(),
                target_sets: exercise.target_sets,
                target_reps: exercise.target_reps,
            })?;
            rows += 1;
        }
    }

    writer.flush()?;
    Ok(rows)
}

/// Export history to a CSV file, replacing any previous export
///
/// Returns the number of rows written.
pub fn write_history_csv(path: &Path, history: &[WorkoutHistoryItem]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(path)?;
    let rows = write_history(&file, history)?;
    file.sync_all()?;

    tracing::info!("Exported {} rows ({} sessions) to {:?}", rows, history.len(), path);
    Ok(rows)
}
