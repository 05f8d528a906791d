//! Session lifecycle manager.
//!
//! [`SessionManager`] is the single owner of the session list, the rotation
//! counter, the selected program and the last-weight table. Callers only see
//! clones and shared references; every change goes through a method here.
//!
//! Mutations are applied to memory first and persisted afterwards:
//! - lifecycle operations (`start_session`, `complete_session`,
//!   `delete_session`, `clear_all_sessions`, `select_program`) are async and
//!   write through to the store before returning
//! - set toggles and weight edits are synchronous and only mark the manager
//!   dirty; `flush()` writes them out
//!
//! A failed write is logged and returned, the in-memory state stays
//! authoritative, and the manager remains dirty so the next `flush()` retries.

use crate::catalog::{get_default_catalog, Catalog};
use crate::config::SessionConfig;
use crate::rotation;
use crate::snapshot::{PersistedState, CLEARED_KEYS};
use crate::stats::{compute_statistics, WorkoutStats};
use crate::store::KeyValueStore;
use crate::types::*;
use crate::{Error, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use uuid::Uuid;

pub struct SessionManager<S> {
    store: S,
    catalog: Catalog,
    options: SessionConfig,
    state: PersistedState,
    dirty: bool,
}

impl<S: KeyValueStore> SessionManager<S> {
    /// Load persisted state from `store` using the built-in catalog
    pub async fn load(store: S, options: SessionConfig) -> Result<Self> {
        Self::load_with_catalog(store, get_default_catalog().clone(), options).await
    }

    pub async fn load_with_catalog(
        store: S,
        catalog: Catalog,
        options: SessionConfig,
    ) -> Result<Self> {
        let state = PersistedState::load(&store).await?;
        tracing::info!(
            "Session manager ready: {} sessions, {} completed workouts",
            state.sessions.len(),
            state.rotation.completed_workouts_count
        );
        Ok(Self {
            store,
            catalog,
            options,
            state,
            dirty: false,
        })
    }

    // ------------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------------

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn sessions(&self) -> &[WorkoutSession] {
        &self.state.sessions
    }

    pub fn session(&self, session_id: Uuid) -> Option<&WorkoutSession> {
        self.state.sessions.iter().find(|s| s.id == session_id)
    }

    /// Most recently started session that is not completed yet
    pub fn latest_open_session(&self) -> Option<&WorkoutSession> {
        self.state
            .sessions
            .iter()
            .filter(|s| !s.completed)
            .max_by_key(|s| s.started_at)
    }

    pub fn selected_program(&self) -> Option<Program> {
        self.state.rotation.selected_program
    }

    pub fn completed_workouts_count(&self) -> u32 {
        self.state.rotation.completed_workouts_count
    }

    /// Last recorded weight for an exercise name
    pub fn last_weight(&self, exercise_name: &str) -> Option<f64> {
        self.state
            .weights
            .get(&weight_key(exercise_name))
            .map(|w| w.last_weight)
    }

    /// Unsaved set or weight changes are pending
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ------------------------------------------------------------------------
    // Rotation
    // ------------------------------------------------------------------------

    /// Template order of the selected program, empty without a program
    pub fn current_order(&self) -> &'static [&'static str] {
        self.selected_program()
            .map(|p| p.template_order())
            .unwrap_or(&[])
    }

    pub fn current_template(&self) -> Option<&WorkoutTemplate> {
        rotation::current_template_id(self.current_order(), self.completed_workouts_count())
            .and_then(|id| self.catalog.find_by_id(id))
    }

    pub fn next_template(&self) -> Option<&WorkoutTemplate> {
        rotation::next_template_id(self.current_order(), self.completed_workouts_count())
            .and_then(|id| self.catalog.find_by_id(id))
    }

    pub fn tomorrows_template(&self) -> Option<&WorkoutTemplate> {
        self.next_template()
    }

    pub fn todays_template(&self) -> Option<&WorkoutTemplate> {
        self.todays_template_on(Local::now().date_naive())
    }

    pub fn todays_template_on(&self, today: NaiveDate) -> Option<&WorkoutTemplate> {
        rotation::todays_template_id(
            self.current_order(),
            self.completed_workouts_count(),
            self.completed_on(today),
        )
        .and_then(|id| self.catalog.find_by_id(id))
    }

    pub fn is_todays_workout_completed(&self) -> bool {
        self.completed_on(Local::now().date_naive())
    }

    /// A completed session started on this local calendar day
    pub fn completed_on(&self, date: NaiveDate) -> bool {
        self.state
            .sessions
            .iter()
            .any(|s| s.completed && s.local_date() == date)
    }

    /// Switch programs; the rotation restarts at the program's first template
    pub async fn select_program(&mut self, program: Program) -> Result<()> {
        self.state.rotation.selected_program = Some(program);
        self.state.rotation.completed_workouts_count = 0;
        tracing::info!("Selected program {}, rotation reset", program);
        self.persist().await
    }

    pub async fn clear_program_selection(&mut self) -> Result<()> {
        self.state.rotation.selected_program = None;
        tracing::info!("Cleared program selection");
        self.persist().await
    }

    // ------------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------------

    /// Start a new session from a template
    ///
    /// Weights are seeded from the last-weight table when enabled, otherwise
    /// from the template defaults. The rotation counter is not touched.
    ///
    /// On a storage error the session still exists in memory.
    pub async fn start_session(&mut self, template_id: &str) -> Result<WorkoutSession> {
        self.start_session_at(template_id, Utc::now()).await
    }

    pub async fn start_session_at(
        &mut self,
        template_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<WorkoutSession> {
        let template = self
            .catalog
            .find_by_id(template_id)
            .ok_or_else(|| Error::TemplateNotFound {
                template_id: template_id.to_string(),
            })?;

        let exercises = template
            .exercises
            .iter()
            .map(|exercise| {
                let carried = if self.options.carry_forward_weights {
                    self.state
                        .weights
                        .get(&weight_key(&exercise.name))
                        .map(|w| w.last_weight)
                } else {
                    None
                };

                SessionExercise {
                    id: Uuid::new_v4(),
                    name: exercise.name.clone(),
                    target_sets: exercise.target_sets,
                    target_reps: exercise.target_reps,
                    weight: carried.unwrap_or(exercise.default_weight),
                    completed_sets: vec![false; exercise.target_sets as usize],
                    notes: exercise.notes.clone(),
                    media_ref: exercise.media_ref.clone(),
                }
            })
            .collect();

        let session = WorkoutSession {
            id: Uuid::new_v4(),
            template_id: template.id.clone(),
            started_at,
            completed: false,
            completed_at: None,
            duration_minutes: None,
            exercises,
        };

        tracing::info!("Started session {} from {}", session.id, session.template_id);
        self.state.sessions.push(session.clone());
        self.persist().await?;
        Ok(session)
    }

    /// Flip one set flag and return its new value
    pub fn toggle_set_completion(
        &mut self,
        session_id: Uuid,
        exercise_id: Uuid,
        set_index: usize,
    ) -> Result<bool> {
        let flag = self.open_set_flag(session_id, exercise_id, set_index)?;
        *flag = !*flag;
        let value = *flag;
        self.dirty = true;
        tracing::debug!(
            "Session {} exercise {} set {} -> {}",
            session_id,
            exercise_id,
            set_index,
            value
        );
        Ok(value)
    }

    /// Set one set flag to an explicit value
    pub fn set_set_completion(
        &mut self,
        session_id: Uuid,
        exercise_id: Uuid,
        set_index: usize,
        completed: bool,
    ) -> Result<()> {
        let flag = self.open_set_flag(session_id, exercise_id, set_index)?;
        *flag = completed;
        self.dirty = true;
        Ok(())
    }

    pub fn complete_set(
        &mut self,
        session_id: Uuid,
        exercise_id: Uuid,
        set_index: usize,
    ) -> Result<()> {
        self.set_set_completion(session_id, exercise_id, set_index, true)
    }

    /// Record the weight used for an exercise
    ///
    /// Zero is accepted; negative and non-finite values are rejected before
    /// anything changes. The weight also becomes the exercise's last weight.
    pub fn update_exercise_weight(
        &mut self,
        session_id: Uuid,
        exercise_id: Uuid,
        weight: f64,
    ) -> Result<()> {
        let weight = validate_weight(weight)?;

        let exercise = self.exercise_mut(session_id, exercise_id)?;
        exercise.weight = weight;
        let name = exercise.name.clone();

        self.state.weights.insert(
            weight_key(&name),
            ExerciseWeight {
                exercise_name: name,
                last_weight: weight,
                last_updated: Utc::now(),
            },
        );
        self.dirty = true;
        tracing::debug!("Session {} exercise {} weight {}", session_id, exercise_id, weight);
        Ok(())
    }

    /// Finalize a session and advance the rotation
    ///
    /// Completing an already-completed session changes nothing and returns
    /// `Ok(false)`, so the counter is never incremented twice for one session.
    pub async fn complete_session(&mut self, session_id: Uuid, duration_minutes: u32) -> Result<bool> {
        self.complete_session_at(session_id, duration_minutes, Utc::now())
            .await
    }

    pub async fn complete_session_at(
        &mut self,
        session_id: Uuid,
        duration_minutes: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<bool> {
        let session = self.session_mut(session_id)?;
        if session.completed {
            tracing::info!("Session {} already completed, ignoring", session_id);
            if self.dirty {
                self.persist().await?;
            }
            return Ok(false);
        }

        session.completed = true;
        session.completed_at = Some(completed_at);
        session.duration_minutes = Some(duration_minutes);

        let rotation = &mut self.state.rotation;
        rotation.completed_workouts_count = rotation.completed_workouts_count.saturating_add(1);
        tracing::info!(
            "Completed session {} in {} min, counter now {}",
            session_id,
            duration_minutes,
            rotation.completed_workouts_count
        );

        self.persist().await?;
        Ok(true)
    }

    /// Remove a session; unknown ids are a no-op returning `Ok(false)`
    ///
    /// Deleting a completed session moves the rotation back by one, floored
    /// at zero.
    pub async fn delete_session(&mut self, session_id: Uuid) -> Result<bool> {
        let Some(index) = self.state.sessions.iter().position(|s| s.id == session_id) else {
            tracing::debug!("Delete of unknown session {} ignored", session_id);
            if self.dirty {
                self.persist().await?;
            }
            return Ok(false);
        };

        let removed = self.state.sessions.remove(index);
        if removed.completed {
            let rotation = &mut self.state.rotation;
            rotation.completed_workouts_count = rotation.completed_workouts_count.saturating_sub(1);
        }
        tracing::info!(
            "Deleted session {} (completed: {})",
            session_id,
            removed.completed
        );

        self.persist().await?;
        Ok(true)
    }

    /// Drop all sessions, the counter and the weight table
    ///
    /// The selected program is kept.
    pub async fn clear_all_sessions(&mut self) -> Result<()> {
        self.state.sessions.clear();
        self.state.weights.clear();
        self.state.rotation.completed_workouts_count = 0;
        self.dirty = true;
        tracing::info!("Cleared all sessions");

        if let Err(e) = self.store.remove_all(CLEARED_KEYS).await {
            tracing::warn!("Failed to clear stored sessions: {}", e);
            return Err(e);
        }
        self.dirty = false;
        Ok(())
    }

    /// Write pending set/weight changes, if any
    pub async fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.persist().await
    }

    // ------------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------------

    pub fn statistics(&self) -> WorkoutStats {
        self.statistics_on(Local::now().date_naive())
    }

    pub fn statistics_on(&self, today: NaiveDate) -> WorkoutStats {
        compute_statistics(&self.state.sessions, today)
    }

    /// Completed sessions, newest first, with template display names
    pub fn history(&self) -> Vec<WorkoutHistoryItem> {
        let mut items: Vec<WorkoutHistoryItem> = self
            .state
            .sessions
            .iter()
            .filter(|s| s.completed)
            .map(|s| WorkoutHistoryItem {
                workout_name: self.catalog.display_name(&s.template_id).to_string(),
                session: s.clone(),
            })
            .collect();
        items.sort_by(|a, b| b.session.started_at.cmp(&a.session.started_at));
        items
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    async fn persist(&mut self) -> Result<()> {
        self.dirty = true;
        match self.state.save(&self.store).await {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to persist workout state: {}", e);
                Err(e)
            }
        }
    }

    fn session_mut(&mut self, session_id: Uuid) -> Result<&mut WorkoutSession> {
        self.state
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| Error::SessionNotFound {
                session_id: session_id.to_string(),
            })
    }

    fn exercise_mut(&mut self, session_id: Uuid, exercise_id: Uuid) -> Result<&mut SessionExercise> {
        self.session_mut(session_id)?
            .exercises
            .iter_mut()
            .find(|e| e.id == exercise_id)
            .ok_or_else(|| Error::ExerciseNotFound {
                session_id: session_id.to_string(),
                exercise_id: exercise_id.to_string(),
            })
    }

    fn open_set_flag(
        &mut self,
        session_id: Uuid,
        exercise_id: Uuid,
        set_index: usize,
    ) -> Result<&mut bool> {
        let session = self.session_mut(session_id)?;
        if session.completed {
            return Err(Error::SessionAlreadyCompleted {
                session_id: session_id.to_string(),
            });
        }

        let exercise = session
            .exercises
            .iter_mut()
            .find(|e| e.id == exercise_id)
            .ok_or_else(|| Error::ExerciseNotFound {
                session_id: session_id.to_string(),
                exercise_id: exercise_id.to_string(),
            })?;

        let target_sets = exercise.target_sets;
        exercise
            .completed_sets
            .get_mut(set_index)
            .ok_or(Error::SetIndexOutOfRange {
                index: set_index,
                target_sets,
            })
    }
}
