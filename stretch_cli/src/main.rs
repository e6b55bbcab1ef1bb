use chrono::Utc;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use stretch_core::*;

#[derive(Parser)]
#[command(name = "stretchflow")]
#[command(about = "Guided stretching sessions with progress tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a stretching session with a live countdown
    Start {
        /// Preset to run (quick, desk, meeting, afternoon, morning, evening, posture)
        #[arg(long)]
        preset: Option<String>,

        /// Explicit exercise ids, in order (overrides --preset)
        #[arg(long = "exercise")]
        exercises: Vec<String>,

        /// Tick without waiting for wall-clock seconds (for testing)
        #[arg(long)]
        fast: bool,

        /// Show the session plan without running or logging anything
        #[arg(long)]
        dry_run: bool,

        /// Abandon the session after N ticks (for testing)
        #[arg(long)]
        abandon_after: Option<u32>,

        /// Seed for the quick-pick shuffle (reproducible selection)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show progress: streaks, weekly goal, totals, achievements
    Progress,

    /// List the exercise catalog
    Catalog {
        /// Only show one category (e.g. neck, back, full-body)
        #[arg(long)]
        category: Option<String>,
    },

    /// Manage habit anchors
    Anchor {
        #[command(subcommand)]
        command: AnchorCommands,
    },

    /// Show or change settings
    Settings {
        /// Target sessions per week
        #[arg(long)]
        weekly_goal: Option<u32>,

        /// Daily reminder time (HH:MM)
        #[arg(long)]
        reminder_time: Option<String>,

        /// Theme preference (light, dark, system)
        #[arg(long)]
        theme: Option<String>,
    },

    /// Roll up journaled sessions to the CSV archive
    Rollup {
        /// Clean up processed journal files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Subcommand)]
enum AnchorCommands {
    /// List habit anchors
    List,

    /// Add a habit anchor
    Add {
        id: String,

        #[arg(long)]
        name: String,

        /// e.g. "After lunch", "Before every meeting"
        #[arg(long)]
        trigger: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Exercise ids the anchor suggests
        #[arg(long = "exercise")]
        exercises: Vec<String>,

        #[arg(long)]
        reminder: bool,
    },

    /// Update a habit anchor (no-op on unknown id)
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        trigger: Option<String>,

        #[arg(long)]
        active: Option<bool>,

        #[arg(long)]
        reminder: Option<bool>,
    },

    /// Delete a habit anchor (no-op on unknown id)
    Delete { id: String },
}

fn main() -> Result<()> {
    // Initialize logging
    stretch_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Some(Commands::Start {
            preset,
            exercises,
            fast,
            dry_run,
            abandon_after,
            seed,
        }) => cmd_start(
            data_dir,
            preset,
            exercises,
            fast,
            dry_run,
            abandon_after,
            seed,
            &config,
        ),
        Some(Commands::Progress) | None => cmd_progress(data_dir),
        Some(Commands::Catalog { category }) => cmd_catalog(category, &config),
        Some(Commands::Anchor { command }) => cmd_anchor(data_dir, command),
        Some(Commands::Settings {
            weekly_goal,
            reminder_time,
            theme,
        }) => cmd_settings(data_dir, weekly_goal, reminder_time, theme),
        Some(Commands::Rollup { cleanup }) => cmd_rollup(data_dir, cleanup),
    }
}

/// Build the catalog, merging any custom exercises from config
///
/// With no customizations, the cached default catalog is cloned instead of
/// rebuilt.
fn load_catalog(config: &Config) -> Catalog {
    if config.catalog.custom.is_empty() {
        get_default_catalog().clone()
    } else {
        build_default_catalog().with_custom(&config.catalog.custom)
    }
}

/// Resolve the exercise list and context label for a session
fn resolve_plan(
    catalog: &Catalog,
    preset: Option<&str>,
    exercise_ids: &[String],
    seed: Option<u64>,
    config: &Config,
) -> Result<(Vec<Exercise>, Option<String>)> {
    if !exercise_ids.is_empty() {
        let mut list = Vec::new();
        for id in exercise_ids {
            match catalog.exercise_by_id(id) {
                Some(ex) => list.push(ex.clone()),
                None => {
                    return Err(Error::Other(format!(
                        "Unknown exercise id '{}'. See `stretchflow catalog`.",
                        id
                    )))
                }
            }
        }
        return Ok((list, None));
    }

    let key = preset.unwrap_or("quick");
    if key == "quick" {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let picked = catalog.random_quick_pick(
            &mut rng,
            config.quick_pick.max_duration_seconds,
            config.quick_pick.count,
        );
        return Ok((picked, Some("quick".into())));
    }

    match catalog.preset(key) {
        Some((_, list)) => Ok((list, Some(key.to_string()))),
        None => {
            let mut known: Vec<&str> = catalog.presets.keys().map(String::as_str).collect();
            known.sort_unstable();
            Err(Error::Other(format!(
                "Unknown preset '{}'. Known presets: quick, {}",
                key,
                known.join(", ")
            )))
        }
    }
}

fn cmd_start(
    data_dir: PathBuf,
    preset: Option<String>,
    exercise_ids: Vec<String>,
    fast: bool,
    dry_run: bool,
    abandon_after: Option<u32>,
    seed: Option<u64>,
    config: &Config,
) -> Result<()> {
    let catalog = load_catalog(config);
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let (exercises, context) =
        resolve_plan(&catalog, preset.as_deref(), &exercise_ids, seed, config)?;

    let total: u32 = exercises.iter().map(|e| e.duration_seconds).sum();
    println!(
        "Session plan{}: {} exercises, {}",
        context
            .as_deref()
            .map(|c| format!(" ({})", c))
            .unwrap_or_default(),
        exercises.len(),
        format_time(total)
    );
    for ex in &exercises {
        println!("  - {} ({})", ex.name, format_time(ex.duration_seconds));
    }

    if dry_run {
        println!("\n[Dry run - not starting session]");
        return Ok(());
    }

    let mut tracker = SessionTracker::open(FileStore::new(&data_dir));
    tracker.start_session(exercises.clone(), context.as_deref())?;

    let mut engine = TimerEngine::new();
    let mut ticks_budget = abandon_after;

    for (index, ex) in exercises.iter().enumerate() {
        println!("\n[{}/{}] {}", index + 1, exercises.len(), ex.name);
        engine.arm(ex)?;
        if let Some(instruction) = engine.current_instruction() {
            println!("  > {}", instruction);
        }

        // Heartbeat: one tick per second while the running gate is open
        while engine.is_running() {
            if let Some(remaining) = ticks_budget.as_mut() {
                if *remaining == 0 {
                    engine.stop();
                    tracker.abandon_session();
                    println!("\nSession abandoned - nothing recorded.");
                    return Ok(());
                }
                *remaining -= 1;
            }

            if !fast {
                std::thread::sleep(std::time::Duration::from_secs(1));
            }

            let step_before = engine.current_step();
            engine.tick();
            if engine.current_step() != step_before {
                if let Some(instruction) = engine.current_instruction() {
                    println!("  > {}", instruction);
                }
            }
        }

        println!("  Done ({}% complete)", engine.progress_percent() as u32);
    }

    let logged = tracker.complete_session().is_some();
    if logged {
        println!("\nSession logged!");
    }

    // Achievement pass over the fresh snapshot
    let earned = achievements::evaluate(tracker.progress(), tracker.history(), Utc::now());
    let mut newly_unlocked = Vec::new();
    for achievement in earned {
        let title = achievement.title.clone();
        if tracker.unlock_achievement(achievement) {
            newly_unlocked.push(title);
        }
    }
    for title in newly_unlocked {
        println!("Achievement unlocked: {}", title);
    }

    let progress = tracker.progress();
    println!(
        "Total sessions: {} | Streak: {} day(s) | This week: {}/{}",
        progress.total_sessions,
        progress.current_streak,
        progress.weekly_session_count,
        progress.weekly_goal
    );

    if let Some(err) = tracker.store_error() {
        eprintln!("Warning: progress may not survive a restart ({})", err);
    }

    Ok(())
}

fn cmd_progress(data_dir: PathBuf) -> Result<()> {
    let tracker = SessionTracker::open(FileStore::new(&data_dir));
    let progress = tracker.progress();

    println!("Sessions completed: {}", progress.total_sessions);
    println!("Minutes stretched:  {}", progress.total_minutes);
    println!("Current streak:     {} day(s)", progress.current_streak);
    println!("Longest streak:     {} day(s)", progress.longest_streak);
    println!(
        "This week:          {}/{} sessions",
        progress.weekly_session_count, progress.weekly_goal
    );
    match progress.last_session_date {
        Some(date) => println!("Last session:       {}", date),
        None => println!("Last session:       never"),
    }

    if progress.achievements.is_empty() {
        println!("Achievements:       none yet");
    } else {
        println!("Achievements:");
        for achievement in &progress.achievements {
            println!("  - {} ({})", achievement.title, achievement.description);
        }
    }

    if let Some(err) = tracker.store_error() {
        eprintln!("Warning: stored progress could not be read ({})", err);
    }

    Ok(())
}

fn cmd_catalog(category: Option<String>, config: &Config) -> Result<()> {
    let catalog = load_catalog(config);

    let selected: Vec<&Exercise> = match category.as_deref() {
        Some(raw) => {
            let Some(cat) = Category::parse(raw) else {
                return Err(Error::Other(format!("Unknown category '{}'", raw)));
            };
            catalog.exercises_by_category(cat)
        }
        None => {
            let mut all: Vec<&Exercise> = catalog.exercises.values().collect();
            all.sort_by(|a, b| a.id.cmp(&b.id));
            all
        }
    };

    for ex in selected {
        println!(
            "{:<28} {:>8}  {:?} / {:?}",
            ex.id,
            format_time(ex.duration_seconds),
            ex.category,
            ex.difficulty
        );
    }

    Ok(())
}

fn cmd_anchor(data_dir: PathBuf, command: AnchorCommands) -> Result<()> {
    let mut tracker = SessionTracker::open(FileStore::new(&data_dir));

    match command {
        AnchorCommands::List => {
            if tracker.habit_anchors().is_empty() {
                println!("No habit anchors configured.");
            }
            for anchor in tracker.habit_anchors() {
                println!(
                    "{:<20} {} [{}{}]",
                    anchor.id,
                    anchor.trigger,
                    if anchor.active { "active" } else { "inactive" },
                    if anchor.reminder_enabled {
                        ", reminder"
                    } else {
                        ""
                    }
                );
            }
        }
        AnchorCommands::Add {
            id,
            name,
            trigger,
            description,
            exercises,
            reminder,
        } => {
            tracker.add_habit_anchor(HabitAnchor {
                id: id.clone(),
                name,
                description,
                trigger,
                exercise_ids: exercises,
                active: true,
                reminder_enabled: reminder,
            });
            println!("Added habit anchor '{}'", id);
        }
        AnchorCommands::Update {
            id,
            name,
            trigger,
            active,
            reminder,
        } => {
            tracker.update_habit_anchor(&id, |anchor| {
                if let Some(name) = name {
                    anchor.name = name;
                }
                if let Some(trigger) = trigger {
                    anchor.trigger = trigger;
                }
                if let Some(active) = active {
                    anchor.active = active;
                }
                if let Some(reminder) = reminder {
                    anchor.reminder_enabled = reminder;
                }
            });
            println!("Updated habit anchor '{}'", id);
        }
        AnchorCommands::Delete { id } => {
            tracker.delete_habit_anchor(&id);
            println!("Deleted habit anchor '{}'", id);
        }
    }

    if let Some(err) = tracker.store_error() {
        eprintln!("Warning: change may not survive a restart ({})", err);
    }

    Ok(())
}

fn cmd_settings(
    data_dir: PathBuf,
    weekly_goal: Option<u32>,
    reminder_time: Option<String>,
    theme: Option<String>,
) -> Result<()> {
    let mut tracker = SessionTracker::open(FileStore::new(&data_dir));

    let theme = match theme.as_deref() {
        Some("light") => Some(Theme::Light),
        Some("dark") => Some(Theme::Dark),
        Some("system") => Some(Theme::System),
        Some(other) => {
            return Err(Error::Other(format!(
                "Unknown theme '{}'; expected light, dark or system",
                other
            )))
        }
        None => None,
    };

    let mut changed = false;
    if let Some(goal) = weekly_goal {
        tracker.set_weekly_goal(goal);
        changed = true;
    }
    if reminder_time.is_some() || theme.is_some() {
        tracker.update_settings(|settings| {
            if let Some(time) = reminder_time {
                settings.notifications.reminder_time = time;
            }
            if let Some(theme) = theme {
                settings.preferences.theme = theme;
            }
        });
        changed = true;
    }

    if changed {
        println!("Settings updated.");
    }

    let settings = tracker.settings();
    println!("Weekly goal:      {} sessions", tracker.progress().weekly_goal);
    println!(
        "Daily reminder:   {} at {}",
        if settings.notifications.daily_reminder {
            "on"
        } else {
            "off"
        },
        settings.notifications.reminder_time
    );
    println!("Theme:            {:?}", settings.preferences.theme);
    println!(
        "Default duration: {}",
        format_time(settings.preferences.default_duration_seconds)
    );

    if let Some(err) = tracker.store_error() {
        eprintln!("Warning: change may not survive a restart ({})", err);
    }

    Ok(())
}

fn cmd_rollup(data_dir: PathBuf, cleanup: bool) -> Result<()> {
    let store = FileStore::new(&data_dir);

    let count = archive::journal_to_csv_and_archive(store.journal_path(), store.csv_path())?;
    println!("Rolled up {} session(s) to {:?}", count, store.csv_path());

    if cleanup {
        if let Some(journal_dir) = store.journal_path().parent() {
            let removed = archive::cleanup_processed_journals(journal_dir)?;
            println!("Cleaned up {} processed journal file(s)", removed);
        }
    }

    Ok(())
}

/// Format whole seconds as "45s", "2m" or "1m 30s"
fn format_time(seconds: u32) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }

    let minutes = seconds / 60;
    let remaining = seconds % 60;

    if remaining == 0 {
        format!("{}m", minutes)
    } else {
        format!("{}m {}s", minutes, remaining)
    }
}
