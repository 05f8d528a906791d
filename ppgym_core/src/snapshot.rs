//! Durable state and its JSON shape in the key-value store.
//!
//! Everything read back from the store is parsed and checked here before it
//! reaches the session manager. Bad entries are dropped with a warning so one
//! broken session does not take the whole history down with it.

use crate::store::KeyValueStore;
use crate::types::{weight_key, ExerciseWeight, Program, RotationState, WorkoutSession};
use crate::Result;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Array of [`WorkoutSession`]
pub const SESSIONS_KEY: &str = "workout_sessions";
/// Non-negative integer rotation counter
pub const COUNTER_KEY: &str = "completed_workouts_count";
/// Program string, absent when none is selected
pub const PROGRAM_KEY: &str = "selected_program";
/// Object of [`ExerciseWeight`] keyed by normalized exercise name
pub const WEIGHTS_KEY: &str = "exercise_weights";

/// Keys removed by a full data clear
///
/// The selected program survives a clear; only history and progress go.
pub const CLEARED_KEYS: &[&str] = &[SESSIONS_KEY, COUNTER_KEY, WEIGHTS_KEY];

/// All state the session manager persists
#[derive(Clone, Debug, Default)]
pub struct PersistedState {
    pub sessions: Vec<WorkoutSession>,
    pub rotation: RotationState,
    pub weights: BTreeMap<String, ExerciseWeight>,
}

impl PersistedState {
    /// Load and validate every key, substituting defaults for absent keys
    ///
    /// Backend failures are returned as errors; malformed content is not.
    pub async fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self> {
        let sessions = decode_sessions(store.get(SESSIONS_KEY).await?);
        let completed_workouts_count = decode_counter(store.get(COUNTER_KEY).await?);
        let selected_program = decode_program(store.get(PROGRAM_KEY).await?);
        let weights = decode_weights(store.get(WEIGHTS_KEY).await?);

        tracing::debug!(
            "Loaded {} sessions, counter {}, program {:?}",
            sessions.len(),
            completed_workouts_count,
            selected_program
        );

        Ok(Self {
            sessions,
            rotation: RotationState {
                selected_program,
                completed_workouts_count,
            },
            weights,
        })
    }

    /// Write every key
    pub async fn save<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<()> {
        store
            .set(SESSIONS_KEY, serde_json::to_value(&self.sessions)?)
            .await?;
        store.set(COUNTER_KEY, self.encode_counter()).await?;
        match self.rotation.selected_program {
            Some(program) => store.set(PROGRAM_KEY, Value::from(program.as_str())).await?,
            None => store.remove(PROGRAM_KEY).await?,
        }
        store
            .set(WEIGHTS_KEY, serde_json::to_value(&self.weights)?)
            .await?;
        Ok(())
    }

    fn encode_counter(&self) -> Value {
        Value::from(self.rotation.completed_workouts_count)
    }
}

/// Parse the stored session array, keeping only well-formed sessions
pub fn decode_sessions(value: Option<Value>) -> Vec<WorkoutSession> {
    let entries = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            tracing::warn!(
                "Stored sessions are not an array ({}), starting empty",
                json_kind(&other)
            );
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut sessions = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let session = match serde_json::from_value::<WorkoutSession>(entry) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Dropping stored session #{}: {}", index, e);
                continue;
            }
        };

        if let Err(reason) = session.check_invariants() {
            tracing::warn!("Dropping stored session {}: {}", session.id, reason);
            continue;
        }

        if !seen.insert(session.id) {
            tracing::warn!("Dropping duplicate stored session {}", session.id);
            continue;
        }

        sessions.push(session);
    }

    sessions
}

/// Parse the stored counter; anything but a non-negative integer reads as 0
pub fn decode_counter(value: Option<Value>) -> u32 {
    match value {
        None | Some(Value::Null) => 0,
        Some(value) => match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(count) => count,
            None => {
                tracing::warn!("Invalid stored workout counter {}, resetting to 0", value);
                0
            }
        },
    }
}

/// Parse the stored program; unknown values read as "no program selected"
pub fn decode_program(value: Option<Value>) -> Option<Program> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => match s.parse() {
            Ok(program) => Some(program),
            Err(_) => {
                tracing::warn!("Unknown stored program '{}', ignoring", s);
                None
            }
        },
        Some(other) => {
            tracing::warn!("Stored program is a {}, ignoring", json_kind(&other));
            None
        }
    }
}

/// Parse the last-weight table, re-keying entries by normalized name
pub fn decode_weights(value: Option<Value>) -> BTreeMap<String, ExerciseWeight> {
    let entries = match value {
        None | Some(Value::Null) => return BTreeMap::new(),
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            tracing::warn!(
                "Stored exercise weights are a {}, starting empty",
                json_kind(&other)
            );
            return BTreeMap::new();
        }
    };

    let mut weights = BTreeMap::new();
    for (key, entry) in entries {
        match serde_json::from_value::<ExerciseWeight>(entry) {
            Ok(weight) if weight.last_weight.is_finite() && weight.last_weight >= 0.0 => {
                weights.insert(weight_key(&weight.exercise_name), weight);
            }
            Ok(weight) => {
                tracing::warn!(
                    "Dropping invalid stored weight {} for '{}'",
                    weight.last_weight,
                    key
                );
            }
            Err(e) => tracing::warn!("Dropping stored weight for '{}': {}", key, e),
        }
    }
    weights
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
