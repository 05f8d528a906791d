//! Core domain types for PPGym.
//!
//! This module defines the fundamental types used throughout the system:
//! - Programs and template categories
//! - Catalog-defined workout templates
//! - Mutable workout sessions with per-set completion tracking
//! - Rotation state and the last-weight side table
//! - History and statistics views

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

// ============================================================================
// Programs and Categories
// ============================================================================

/// A training program: a fixed, ordered rotation of templates
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Program {
    Pedro,
    Georgia,
}

impl Program {
    pub const ALL: [Program; 2] = [Program::Pedro, Program::Georgia];

    /// Stable identifier used in storage and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Program::Pedro => "pedro",
            Program::Georgia => "georgia",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Program::Pedro => "Pedro",
            Program::Georgia => "Georgia",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Program {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pedro" => Ok(Program::Pedro),
            "georgia" => Ok(Program::Georgia),
            other => Err(Error::Config(format!("Unknown program: {}", other))),
        }
    }
}

/// Muscle-group category of a workout template
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateCategory {
    Push,
    Pull,
    Legs,
    Upper,
    Lower,
    FullBody,
    Cardio,
    Custom,
}

impl TemplateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateCategory::Push => "push",
            TemplateCategory::Pull => "pull",
            TemplateCategory::Legs => "legs",
            TemplateCategory::Upper => "upper",
            TemplateCategory::Lower => "lower",
            TemplateCategory::FullBody => "full-body",
            TemplateCategory::Cardio => "cardio",
            TemplateCategory::Custom => "custom",
        }
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "push" => Ok(TemplateCategory::Push),
            "pull" => Ok(TemplateCategory::Pull),
            "legs" => Ok(TemplateCategory::Legs),
            "upper" => Ok(TemplateCategory::Upper),
            "lower" => Ok(TemplateCategory::Lower),
            "full-body" | "full_body" => Ok(TemplateCategory::FullBody),
            "cardio" => Ok(TemplateCategory::Cardio),
            "custom" => Ok(TemplateCategory::Custom),
            other => Err(Error::Config(format!("Unknown category: {}", other))),
        }
    }
}

// ============================================================================
// Template Types (catalog-defined, immutable)
// ============================================================================

/// One exercise slot inside a template
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateExercise {
    pub name: String,
    pub target_sets: u32,
    pub target_reps: u32,
    pub default_weight: f64,
    pub notes: Option<String>,
    pub media_ref: Option<String>,
}

/// A workout blueprint: ordered exercises with target sets/reps
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutTemplate {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<TemplateCategory>,
    pub exercises: Vec<TemplateExercise>,
}

// ============================================================================
// Session Types (mutable, runtime)
// ============================================================================

/// An exercise instantiated inside a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionExercise {
    #[serde(rename = "exerciseInstanceId")]
    pub id: Uuid,
    pub name: String,
    pub target_sets: u32,
    pub target_reps: u32,
    pub weight: f64,
    /// One flag per target set, stored as 0/1
    #[serde(with = "set_flags")]
    pub completed_sets: Vec<bool>,
    pub notes: Option<String>,
    pub media_ref: Option<String>,
}

impl SessionExercise {
    pub fn completed_count(&self) -> usize {
        self.completed_sets.iter().filter(|done| **done).count()
    }

    /// All target sets are ticked
    pub fn is_done(&self) -> bool {
        self.completed_sets.iter().all(|done| *done)
    }
}

/// A per-attempt instantiation of a template
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: Uuid,
    pub template_id: String,
    pub started_at: DateTime<Utc>,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    pub exercises: Vec<SessionExercise>,
}

impl WorkoutSession {
    pub fn exercise(&self, exercise_id: Uuid) -> Option<&SessionExercise> {
        self.exercises.iter().find(|e| e.id == exercise_id)
    }

    pub fn completed_set_count(&self) -> usize {
        self.exercises.iter().map(SessionExercise::completed_count).sum()
    }

    pub fn total_set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.completed_sets.len()).sum()
    }

    /// Percentage of ticked sets, 0 for a session without sets
    pub fn set_completion_rate(&self) -> f64 {
        let total = self.total_set_count();
        if total == 0 {
            return 0.0;
        }
        self.completed_set_count() as f64 / total as f64 * 100.0
    }

    /// Calendar day the session started on, in local time
    pub fn local_date(&self) -> NaiveDate {
        self.started_at.with_timezone(&Local).date_naive()
    }

    /// Check the structural invariants a loaded session must satisfy
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for exercise in &self.exercises {
            if exercise.completed_sets.len() != exercise.target_sets as usize {
                return Err(format!(
                    "exercise '{}' has {} set flags for {} target sets",
                    exercise.name,
                    exercise.completed_sets.len(),
                    exercise.target_sets
                ));
            }
            if !exercise.weight.is_finite() || exercise.weight < 0.0 {
                return Err(format!(
                    "exercise '{}' has invalid weight {}",
                    exercise.name, exercise.weight
                ));
            }
        }

        let mut ids: Vec<Uuid> = self.exercises.iter().map(|e| e.id).collect();
        ids.sort();
        ids.dedup();
        if ids.len() != self.exercises.len() {
            return Err("duplicate exercise instance ids".to_string());
        }

        if self.completed && self.duration_minutes.is_none() {
            return Err("completed session has no duration".to_string());
        }

        Ok(())
    }
}

/// A completed session annotated with its template's display name
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutHistoryItem {
    #[serde(flatten)]
    pub session: WorkoutSession,
    pub workout_name: String,
}

// ============================================================================
// Rotation and Weight State
// ============================================================================

/// Process-wide rotation position
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RotationState {
    pub selected_program: Option<Program>,
    pub completed_workouts_count: u32,
}

/// Last weight recorded for an exercise name
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseWeight {
    pub exercise_name: String,
    pub last_weight: f64,
    pub last_updated: DateTime<Utc>,
}

/// Key used by the last-weight table
///
/// Exercises that share a display name across templates share an entry.
pub fn weight_key(exercise_name: &str) -> String {
    exercise_name.trim().to_lowercase()
}

// ============================================================================
// Weight Validation
// ============================================================================

/// Accept finite, non-negative weights (zero included)
pub fn validate_weight(weight: f64) -> Result<f64> {
    if weight.is_nan() || weight.is_infinite() {
        return Err(Error::InvalidWeight(format!("{} is not a number", weight)));
    }
    if weight < 0.0 {
        return Err(Error::InvalidWeight(format!("{} is negative", weight)));
    }
    // -0.0 passes the sign check above
    Ok(if weight == 0.0 { 0.0 } else { weight })
}

/// Parse user input into a weight, accepting a decimal comma
pub fn parse_weight(input: &str) -> Result<f64> {
    let normalized = input.trim().replace(',', ".");
    let weight: f64 = normalized
        .parse()
        .map_err(|_| Error::InvalidWeight(format!("'{}' is not a number", input.trim())))?;
    validate_weight(weight)
}

mod set_flags {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(flags: &[bool], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(flags.iter().map(|done| u8::from(*done)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<bool>, D::Error> {
        Vec::<u8>::deserialize(deserializer)?
            .into_iter()
            .map(|flag| match flag {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(D::Error::custom(format!(
                    "set flag must be 0 or 1, got {}",
                    other
                ))),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session() -> WorkoutSession {
        WorkoutSession {
            id: Uuid::new_v4(),
            template_id: "template-a".into(),
            started_at: Utc::now(),
            completed: false,
            completed_at: None,
            duration_minutes: None,
            exercises: vec![SessionExercise {
                id: Uuid::new_v4(),
                name: "Agachamento livre".into(),
                target_sets: 3,
                target_reps: 10,
                weight: 40.0,
                completed_sets: vec![true, false, true],
                notes: None,
                media_ref: None,
            }],
        }
    }

    #[test]
    fn test_set_flags_serialize_as_integers() {
        let session = sample_session();
        let value = serde_json::to_value(&session).unwrap();

        let flags = &value["exercises"][0]["completedSets"];
        assert_eq!(flags, &serde_json::json!([1, 0, 1]));
        assert!(value["exercises"][0]["exerciseInstanceId"].is_string());
        assert!(value["startedAt"].is_string());
    }

    #[test]
    fn test_session_json_restores_dates() {
        let session = sample_session();
        let json = serde_json::to_string(&session).unwrap();
        let parsed: WorkoutSession = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, session);
        assert_eq!(parsed.started_at, session.started_at);
    }

    #[test]
    fn test_invalid_flag_rejected() {
        let session = sample_session();
        let mut value = serde_json::to_value(&session).unwrap();
        value["exercises"][0]["completedSets"] = serde_json::json!([1, 2, 0]);

        assert!(serde_json::from_value::<WorkoutSession>(value).is_err());
    }

    #[test]
    fn test_invariants_catch_flag_length_mismatch() {
        let mut session = sample_session();
        assert!(session.check_invariants().is_ok());

        session.exercises[0].completed_sets.push(false);
        assert!(session.check_invariants().is_err());
    }

    #[test]
    fn test_invariants_require_duration_when_completed() {
        let mut session = sample_session();
        session.completed = true;
        assert!(session.check_invariants().is_err());

        session.duration_minutes = Some(45);
        assert!(session.check_invariants().is_ok());
    }

    #[test]
    fn test_set_completion_rate() {
        let session = sample_session();
        assert_eq!(session.completed_set_count(), 2);
        assert_eq!(session.total_set_count(), 3);
        assert!((session.set_completion_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_validate_weight() {
        assert_eq!(validate_weight(0.0).unwrap(), 0.0);
        assert_eq!(validate_weight(62.5).unwrap(), 62.5);
        assert!(validate_weight(-0.0).unwrap().is_sign_positive());
        assert!(parse_weight("-0").unwrap().is_sign_positive());
        assert!(matches!(validate_weight(-5.0), Err(Error::InvalidWeight(_))));
        assert!(matches!(validate_weight(f64::NAN), Err(Error::InvalidWeight(_))));
        assert!(matches!(
            validate_weight(f64::INFINITY),
            Err(Error::InvalidWeight(_))
        ));
    }

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight(" 20 ").unwrap(), 20.0);
        assert_eq!(parse_weight("12,5").unwrap(), 12.5);
        assert!(matches!(parse_weight("heavy"), Err(Error::InvalidWeight(_))));
        assert!(matches!(parse_weight("-1"), Err(Error::InvalidWeight(_))));
    }

    #[test]
    fn test_program_parsing() {
        assert_eq!("Pedro".parse::<Program>().unwrap(), Program::Pedro);
        assert_eq!("georgia".parse::<Program>().unwrap(), Program::Georgia);
        assert!("carla".parse::<Program>().is_err());
        assert_eq!(
            serde_json::to_value(Program::Georgia).unwrap(),
            serde_json::json!("georgia")
        );
    }

    #[test]
    fn test_weight_key_ignores_case_and_padding() {
        assert_eq!(weight_key("  Supino Reto "), weight_key("supino reto"));
    }
}
