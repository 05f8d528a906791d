use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use ppgym_core::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uuid::Uuid;

type Manager = SessionManager<JsonFileStore>;

#[derive(Parser)]
#[command(name = "ppgym")]
#[command(about = "Workout rotation and session tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's and tomorrow's workout (default)
    Today,

    /// Show or change the training program
    Program {
        /// Program to select (pedro, georgia)
        program: Option<String>,

        /// Clear the program selection
        #[arg(long, conflicts_with = "program")]
        clear: bool,
    },

    /// List workout templates
    Templates {
        /// Only templates of this category (push, pull, legs, ...)
        #[arg(long)]
        category: Option<String>,

        /// Only templates of this program, in rotation order
        #[arg(long)]
        program: Option<String>,
    },

    /// Start a session (defaults to today's template)
    Start {
        /// Template id, e.g. template-a
        template: Option<String>,
    },

    /// Show a session's progress (defaults to the session in progress)
    Show {
        /// Session id or unique prefix
        session: Option<String>,
    },

    /// Tick or untick one set
    Toggle {
        /// Exercise number (1-based), id, or name
        exercise: String,

        /// Set number (1-based)
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        set: u32,

        /// Session id or unique prefix
        #[arg(long)]
        session: Option<String>,
    },

    /// Record the weight used for an exercise
    Weight {
        /// Exercise number (1-based), id, or name
        exercise: String,

        /// Weight in kg (a decimal comma is accepted)
        #[arg(allow_hyphen_values = true)]
        weight: String,

        /// Session id or unique prefix
        #[arg(long)]
        session: Option<String>,
    },

    /// Complete a session and advance the rotation
    Finish {
        /// Session id or unique prefix
        session: Option<String>,

        /// Duration in minutes (defaults to time since start)
        #[arg(long)]
        minutes: Option<u32>,
    },

    /// Delete a session
    Delete {
        /// Session id or unique prefix
        session: String,
    },

    /// List completed workouts, newest first
    History {
        /// Show at most this many workouts
        #[arg(long)]
        limit: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show workout statistics
    Stats {
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Export the workout history to CSV
    Export {
        /// Output file (defaults to history.csv in the data directory)
        path: Option<PathBuf>,
    },

    /// Delete all sessions, the rotation counter and recorded weights
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    ppgym_core::logging::init_with_level(&config.logging.level);

    // Determine data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let mut manager = open_manager(&data_dir, &config).await?;

    match cli.command.unwrap_or(Commands::Today) {
        Commands::Today => cmd_today(&manager),
        Commands::Program { program, clear } => cmd_program(&mut manager, program, clear).await,
        Commands::Templates { category, program } => cmd_templates(&manager, category, program),
        Commands::Start { template } => cmd_start(&mut manager, template).await,
        Commands::Show { session } => cmd_show(&manager, session),
        Commands::Toggle {
            exercise,
            set,
            session,
        } => cmd_toggle(&mut manager, session, exercise, set).await,
        Commands::Weight {
            exercise,
            weight,
            session,
        } => cmd_weight(&mut manager, session, exercise, weight).await,
        Commands::Finish { session, minutes } => cmd_finish(&mut manager, session, minutes).await,
        Commands::Delete { session } => cmd_delete(&mut manager, session).await,
        Commands::History { limit, json } => cmd_history(&manager, limit, json),
        Commands::Stats { json } => cmd_stats(&manager, json),
        Commands::Export { path } => {
            cmd_export(&manager, path.unwrap_or_else(|| data_dir.join("history.csv")))
        }
        Commands::Clear { yes } => cmd_clear(&mut manager, yes).await,
    }
}

async fn open_manager(data_dir: &Path, config: &Config) -> Result<Manager> {
    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    tracing::debug!("Using data directory {:?}", data_dir);
    let store = JsonFileStore::new(data_dir);
    SessionManager::load(store, config.session.clone()).await
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_today(manager: &Manager) -> Result<()> {
    let Some(program) = manager.selected_program() else {
        println!("No program selected.");
        println!("  Choose one with: ppgym program <pedro|georgia>");
        return Ok(());
    };

    println!("Program: {}", program.display_name());

    if let Some(today) = manager.todays_template() {
        if manager.is_todays_workout_completed() {
            println!("✓ Today's workout is done");
            println!("  Up next:  {}", today.name);
        } else {
            println!("Today:    {}", today.name);
        }
    }
    if let Some(tomorrow) = manager.tomorrows_template() {
        println!("Tomorrow: {}", tomorrow.name);
    }
    println!("Completed workouts: {}", manager.completed_workouts_count());

    if let Some(open) = manager.latest_open_session() {
        println!();
        println!(
            "In progress: {} [{}], {}/{} sets",
            manager.catalog().display_name(&open.template_id),
            short_id(open.id),
            open.completed_set_count(),
            open.total_set_count()
        );
    }

    Ok(())
}

async fn cmd_program(manager: &mut Manager, program: Option<String>, clear: bool) -> Result<()> {
    if clear {
        manager.clear_program_selection().await?;
        println!("✓ Program selection cleared");
        return Ok(());
    }

    if let Some(name) = program {
        let program: Program = name.parse()?;
        manager.select_program(program).await?;
        println!("✓ Selected program {}", program.display_name());
        if let Some(first) = manager.current_template() {
            println!("  Rotation starts at: {}", first.name);
        }
        return Ok(());
    }

    let Some(program) = manager.selected_program() else {
        println!("No program selected.");
        println!("  Available: {}", program_names());
        return Ok(());
    };

    let order = program.template_order();
    let position = manager.completed_workouts_count() as usize % order.len();
    println!("Program: {}", program.display_name());
    for (index, id) in order.iter().enumerate() {
        let marker = if index == position { "→" } else { " " };
        println!("  {} {}", marker, manager.catalog().display_name(id));
    }

    Ok(())
}

fn cmd_templates(
    manager: &Manager,
    category: Option<String>,
    program: Option<String>,
) -> Result<()> {
    let catalog = manager.catalog();

    let in_category = match category {
        Some(category) => {
            let category: TemplateCategory = category.parse()?;
            Some(catalog.list_by_category(category))
        }
        None => None,
    };

    let templates: Vec<&WorkoutTemplate> = match (program, in_category) {
        (Some(name), in_category) => {
            let program: Program = name.parse()?;
            program
                .template_order()
                .iter()
                .filter_map(|id| catalog.find_by_id(id))
                .filter(|t| {
                    in_category
                        .as_ref()
                        .map_or(true, |matching| matching.iter().any(|m| m.id == t.id))
                })
                .collect()
        }
        (None, Some(in_category)) => in_category,
        (None, None) => catalog.templates().iter().collect(),
    };

    if templates.is_empty() {
        println!("No matching templates.");
        return Ok(());
    }

    for template in templates {
        let category = template
            .category
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<20} {:<36} {:<6} {} exercises",
            template.id,
            template.name,
            category,
            template.exercises.len()
        );
    }

    Ok(())
}

async fn cmd_start(manager: &mut Manager, template: Option<String>) -> Result<()> {
    let template_id = match template {
        Some(id) => id,
        None => manager
            .todays_template()
            .map(|t| t.id.clone())
            .ok_or_else(|| {
                Error::Config(format!(
                    "No program selected; pass a template id or choose a program ({})",
                    program_names()
                ))
            })?,
    };

    let session = manager.start_session(&template_id).await?;
    println!(
        "✓ Started {}",
        manager.catalog().display_name(&session.template_id)
    );
    println!("  Session: {}", session.id);
    print_session(manager.catalog(), &session);

    Ok(())
}

fn cmd_show(manager: &Manager, session: Option<String>) -> Result<()> {
    let session_id = resolve_session(manager, session.as_deref())?;
    let session = find_session(manager, session_id)?;
    print_session(manager.catalog(), session);
    Ok(())
}

async fn cmd_toggle(
    manager: &mut Manager,
    session: Option<String>,
    exercise: String,
    set: u32,
) -> Result<()> {
    let session_id = resolve_session(manager, session.as_deref())?;
    let (exercise_id, name) = resolve_exercise(find_session(manager, session_id)?, &exercise)?;

    let done = manager.toggle_set_completion(session_id, exercise_id, set as usize - 1)?;
    manager.flush().await?;

    let mark = if done { "✓" } else { "○" };
    println!("{} {} set {}", mark, name, set);
    if let Some(session) = manager.session(session_id) {
        println!(
            "  Sets: {}/{}",
            session.completed_set_count(),
            session.total_set_count()
        );
    }

    Ok(())
}

async fn cmd_weight(
    manager: &mut Manager,
    session: Option<String>,
    exercise: String,
    weight: String,
) -> Result<()> {
    let weight = parse_weight(&weight)?;
    let session_id = resolve_session(manager, session.as_deref())?;
    let (exercise_id, name) = resolve_exercise(find_session(manager, session_id)?, &exercise)?;

    manager.update_exercise_weight(session_id, exercise_id, weight)?;
    manager.flush().await?;

    println!("✓ {}: {} kg", name, format_weight(weight));
    Ok(())
}

async fn cmd_finish(
    manager: &mut Manager,
    session: Option<String>,
    minutes: Option<u32>,
) -> Result<()> {
    let session_id = resolve_session(manager, session.as_deref())?;
    let started_at = find_session(manager, session_id)?.started_at;
    let minutes = minutes.unwrap_or_else(|| elapsed_minutes(started_at));

    if !manager.complete_session(session_id, minutes).await? {
        println!("Session [{}] was already completed.", short_id(session_id));
        return Ok(());
    }

    println!("✓ Workout completed in {} min", minutes);
    if let Some(next) = manager.current_template() {
        println!("  Next workout: {}", next.name);
    }

    Ok(())
}

async fn cmd_delete(manager: &mut Manager, session: String) -> Result<()> {
    let session_id = match resolve_session(manager, Some(&session)) {
        Ok(id) => id,
        Err(Error::SessionNotFound { .. }) => {
            println!("No session matches '{}'; nothing deleted.", session);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if manager.delete_session(session_id).await? {
        println!("✓ Deleted session [{}]", short_id(session_id));
    } else {
        println!("No session matches '{}'; nothing deleted.", session);
    }

    Ok(())
}

fn cmd_history(manager: &Manager, limit: Option<usize>, json: bool) -> Result<()> {
    let mut history = manager.history();
    if let Some(limit) = limit {
        history.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No completed workouts yet.");
        return Ok(());
    }

    for item in &history {
        let session = &item.session;
        println!(
            "{}  {:<36} {:>4} min  {:>3}/{:<3} sets  [{}]",
            local_time(session.started_at),
            item.workout_name,
            session.duration_minutes.unwrap_or(0),
            session.completed_set_count(),
            session.total_set_count(),
            short_id(session.id)
        );
    }

    Ok(())
}

fn cmd_stats(manager: &Manager, json: bool) -> Result<()> {
    let stats = manager.statistics();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    print_stats(&stats);
    Ok(())
}

fn cmd_export(manager: &Manager, path: PathBuf) -> Result<()> {
    let history = manager.history();
    let rows = write_history_csv(&path, &history)?;

    println!(
        "✓ Exported {} workouts ({} rows) to CSV",
        history.len(),
        rows
    );
    println!("  CSV: {}", path.display());
    Ok(())
}

async fn cmd_clear(manager: &mut Manager, yes: bool) -> Result<()> {
    if !yes {
        return Err(Error::Config(
            "Refusing to delete all workout data without --yes".into(),
        ));
    }

    manager.clear_all_sessions().await?;
    println!("✓ Cleared all sessions, recorded weights and the rotation counter");
    Ok(())
}

// ============================================================================
// Lookup helpers
// ============================================================================

/// Resolve a full id or unique id prefix; no input means the session in progress
fn resolve_session(manager: &Manager, input: Option<&str>) -> Result<Uuid> {
    let Some(input) = input else {
        return manager
            .latest_open_session()
            .map(|s| s.id)
            .ok_or_else(|| Error::Config("No session in progress; start one with `ppgym start`".into()));
    };

    let needle = input.trim().to_lowercase();
    if let Ok(id) = Uuid::parse_str(&needle) {
        return Ok(id);
    }

    let matches: Vec<Uuid> = manager
        .sessions()
        .iter()
        .map(|s| s.id)
        .filter(|id| !needle.is_empty() && id.to_string().starts_with(&needle))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(Error::SessionNotFound {
            session_id: input.to_string(),
        }),
        _ => Err(Error::Config(format!(
            "Session id '{}' is ambiguous ({} matches)",
            input,
            matches.len()
        ))),
    }
}

fn find_session(manager: &Manager, session_id: Uuid) -> Result<&WorkoutSession> {
    manager
        .session(session_id)
        .ok_or_else(|| Error::SessionNotFound {
            session_id: session_id.to_string(),
        })
}

/// Resolve an exercise by 1-based position, instance id, or name
fn resolve_exercise(session: &WorkoutSession, input: &str) -> Result<(Uuid, String)> {
    let input = input.trim();

    let found = if let Ok(position) = input.parse::<usize>() {
        position
            .checked_sub(1)
            .and_then(|index| session.exercises.get(index))
    } else if let Ok(id) = Uuid::parse_str(input) {
        session.exercise(id)
    } else {
        let key = weight_key(input);
        session.exercises.iter().find(|e| weight_key(&e.name) == key)
    };

    found
        .map(|e| (e.id, e.name.clone()))
        .ok_or_else(|| Error::ExerciseNotFound {
            session_id: session.id.to_string(),
            exercise_id: input.to_string(),
        })
}

// ============================================================================
// Display
// ============================================================================

fn print_session(catalog: &Catalog, session: &WorkoutSession) {
    println!();
    println!(
        "{} [{}]",
        catalog.display_name(&session.template_id),
        short_id(session.id)
    );
    println!("  Started: {}", local_time(session.started_at));
    match session.duration_minutes {
        Some(minutes) if session.completed => println!("  Completed in {} min", minutes),
        _ => println!("  In progress"),
    }
    println!(
        "  Sets: {}/{} ({:.0}%)",
        session.completed_set_count(),
        session.total_set_count(),
        session.set_completion_rate()
    );
    println!();

    for (index, exercise) in session.exercises.iter().enumerate() {
        let sets: String = exercise
            .completed_sets
            .iter()
            .map(|done| if *done { "[x]" } else { "[ ]" })
            .collect();
        println!(
            "  {:>2}. {}  {}x{} @ {} kg  {}",
            index + 1,
            exercise.name,
            exercise.target_sets,
            exercise.target_reps,
            format_weight(exercise.weight),
            sets
        );
        if let Some(ref notes) = exercise.notes {
            println!("      ℹ {}", notes);
        }
    }

    println!();
}

fn print_stats(stats: &WorkoutStats) {
    println!("Workouts:          {}", stats.total_workouts);
    println!("This week:         {}", stats.this_week);
    println!("This month:        {}", stats.this_month);
    println!("Completion rate:   {:.0}%", stats.completion_rate);
    println!("Average duration:  {:.0} min", stats.average_duration_minutes);
    println!("Per week:          {:.1}", stats.average_per_week);
    println!("Current streak:    {} days", stats.current_streak);
    println!("Best streak:       {} days", stats.best_streak);

    if let Some(program) = stats.favorite_program {
        println!("Favourite program: {}", program.display_name());
    }
    for (program, count) in &stats.per_program {
        println!("  {:<8} {}", program.display_name(), count);
    }
    if stats.unassigned > 0 {
        println!("  {:<8} {}", "Other", stats.unassigned);
    }
}

fn program_names() -> String {
    Program::ALL
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{:.0}", weight)
    } else {
        format!("{}", weight)
    }
}

fn elapsed_minutes(started_at: DateTime<Utc>) -> u32 {
    let minutes = (Utc::now() - started_at).num_minutes().max(0);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}
