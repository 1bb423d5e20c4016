mod backend;
mod catalog;
mod config;
mod error;
mod forms;
mod leaderboard;
mod local;
mod models;
mod recorder;
mod report;
mod server;
mod stats;
mod storage;
mod tasks;
mod timer;
mod tui;
mod typeahead;
mod utils;

use anyhow::Result;
use backend::{Backend, JsonBackend};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use fd_lock::RwLock;
use forms::{ProfileUpdate, SetupForm};
use leaderboard::{UniversityFilter, View};
use local::{LocalStore, Theme, ACCENT_KEY, THEME_KEY, USER_KEY};
use models::Profile;
use ratatui::style::Color;
use report::Reporter;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use storage::Storage;
use timer::TimerSettings;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "studygrind")]
#[command(about = "Focus timer, study stats and a university leaderboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remember who is studying on this machine
    Login { user: String },
    /// Forget the current user
    Logout,
    /// Create your profile
    Setup {
        /// Name shown on the leaderboard
        #[arg(long)]
        name: String,
        /// University, as listed by `studygrind universities`
        #[arg(long)]
        university: String,
    },
    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },
    /// Manage tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Change the focus and break lengths (e.g. 50, 45m, 1h)
    Settings {
        #[arg(short, long)]
        work: String,
        #[arg(short, long = "break")]
        break_len: String,
    },
    /// Open the timer dashboard
    Timer,
    /// Weekly minutes, streak and unit breakdown
    Stats,
    /// Rank students by minutes studied
    Leaderboard {
        /// University name, or "All"
        #[arg(short, long)]
        university: Option<String>,
        #[arg(long, value_enum, default_value = "weekly")]
        view: View,
    },
    /// Suggest university names for a partial query
    Universities { query: String },
    /// Serve the university lookup over HTTP
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Set the dashboard colours
    Theme {
        #[arg(value_enum)]
        theme: Theme,
        /// Accent colour, by name or as #rrggbb
        #[arg(long)]
        accent: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Update profile fields
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        university: Option<String>,
        #[arg(long)]
        major1: Option<String>,
        #[arg(long, conflicts_with = "clear_major2")]
        major2: Option<String>,
        #[arg(long)]
        clear_major2: bool,
    },
    /// Add a unit code to your list
    AddUnit { unit: String },
    /// Remove a unit code from your list
    RemoveUnit { unit: String },
    /// Hide from or show on public leaderboards
    Incognito {
        #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        enabled: bool,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    Add {
        title: String,
        #[arg(short, long)]
        unit: Option<String>,
    },
    List,
    /// Mark a task as done
    Done { id: u64 },
    /// Make a task the active one (again to clear it)
    Focus { id: u64 },
}

fn init_logging(base_dir: &Path, to_stderr: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if to_stderr {
        fmt().with_env_filter(filter).init();
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(base_dir.join("studygrind.log"))?;
        fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

/// The acting user, or a hint to log in.
fn require_user(local: &LocalStore) -> Option<String> {
    let user = local.user();
    if user.is_none() {
        println!("Not logged in. Run `studygrind login <user>` first.");
    }
    user
}

/// The acting user's profile, or a hint to run setup.
fn require_profile<B: Backend>(backend: &B, user: &str) -> Result<Option<Profile>> {
    let profile = backend.profile(user)?;
    if profile.is_none() {
        println!("No profile yet. Run `studygrind setup --name <name> --university <university>`.");
    }
    Ok(profile)
}

/// Prints a form error inline instead of failing the command.
fn report_form<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) => match e.downcast_ref::<error::FormError>() {
            Some(form) => {
                println!("{form}");
                Ok(None)
            }
            None => Err(e),
        },
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let base_dir = Storage::get_base_dir()?;
    init_logging(&base_dir, matches!(cli.command, Commands::Serve { .. }))?;
    let config = config::load_config(&base_dir)?;
    let mut local = LocalStore::open(&base_dir);
    let mut backend = JsonBackend::open(&base_dir);

    match cli.command {
        Commands::Login { user } => {
            let user = user.trim().to_string();
            if user.is_empty() {
                println!("Please enter a user name.");
                return Ok(());
            }
            local.set(USER_KEY, &user)?;
            info!(user = %user, "Logged in");
            if backend.profile(&user)?.is_none() {
                println!("Welcome, {user}. Create your profile with `studygrind setup`.");
            } else {
                println!("Logged in as {user}.");
            }
        }
        Commands::Logout => {
            local.remove(USER_KEY)?;
            println!("Logged out.");
        }
        Commands::Setup { name, university } => {
            let Some(user) = require_user(&local) else {
                return Ok(());
            };
            let form = SetupForm {
                display_name: name,
                university,
            };
            if let Some(profile) = report_form(form.submit(&mut backend, &user, catalog::UNIVERSITIES))? {
                println!("Profile created for {}.", profile.display_name);
            }
        }
        Commands::Profile { action } => {
            let Some(user) = require_user(&local) else {
                return Ok(());
            };
            let Some(mut profile) = require_profile(&backend, &user)? else {
                return Ok(());
            };
            let reporter = Reporter::new(&user);
            match action {
                None => print!("{}", reporter.profile(&profile)),
                Some(ProfileAction::Set {
                    name,
                    university,
                    major1,
                    major2,
                    clear_major2,
                }) => {
                    let update = ProfileUpdate {
                        display_name: name,
                        university,
                        major1,
                        major2: if clear_major2 { Some(None) } else { major2.map(Some) },
                        incognito: None,
                    };
                    if let Some(updated) =
                        report_form(update.submit(&mut backend, &user, catalog::UNIVERSITIES))?
                    {
                        print!("{}", reporter.profile(&updated));
                    }
                }
                Some(ProfileAction::AddUnit { unit }) => {
                    if forms::add_unit(&mut profile.units, &unit) {
                        backend.update_profile(&profile)?;
                    }
                    print!("{}", reporter.profile(&profile));
                }
                Some(ProfileAction::RemoveUnit { unit }) => {
                    if forms::remove_unit(&mut profile.units, &unit) {
                        backend.update_profile(&profile)?;
                    }
                    print!("{}", reporter.profile(&profile));
                }
                Some(ProfileAction::Incognito { enabled }) => {
                    let update = ProfileUpdate {
                        incognito: Some(enabled),
                        ..Default::default()
                    };
                    let updated = update.submit(&mut backend, &user, catalog::UNIVERSITIES)?;
                    print!("{}", reporter.profile(&updated));
                }
            }
        }
        Commands::Task { action } => {
            let Some(user) = require_user(&local) else {
                return Ok(());
            };
            let reporter = Reporter::new(&user);
            match action {
                TaskAction::Add { title, unit } => {
                    if let Some(task) = report_form(tasks::add_task(
                        &mut backend,
                        &user,
                        &title,
                        unit.as_deref(),
                        Utc::now(),
                    ))? {
                        println!("Added task {}: {}", task.id, task.title);
                    }
                }
                TaskAction::List => {
                    let open = backend.open_tasks(&user)?;
                    let active = tasks::active_task(&local);
                    print!("{}", reporter.tasks(&open, active.as_ref()));
                }
                TaskAction::Done { id } => {
                    tasks::complete_task(&mut backend, &mut local, &user, id)?;
                    println!("Task {id} done.");
                }
                TaskAction::Focus { id } => {
                    let task = backend
                        .open_tasks(&user)?
                        .into_iter()
                        .find(|t| t.id == id)
                        .ok_or(error::StoreError::TaskNotFound(id))?;
                    match tasks::toggle_active(&mut local, &task)? {
                        Some(task) => println!("Now focusing on: {}", task.title),
                        None => println!("No active task."),
                    }
                }
            }
        }
        Commands::Settings { work, break_len } => {
            let settings = TimerSettings::parse(&work, &break_len);
            local.change_timer_settings(settings, Utc::now())?;
            println!(
                "Focus {} min, break {} min.",
                settings.work_minutes, settings.break_minutes
            );
        }
        Commands::Timer => {
            let Some(user) = require_user(&local) else {
                return Ok(());
            };
            let Some(profile) = require_profile(&backend, &user)? else {
                return Ok(());
            };

            let lock_path = base_dir.join("studygrind.lock");
            let lock_file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(lock_path)?;
            let mut lock = RwLock::new(lock_file);
            let _guard = lock.try_write().map_err(|_| {
                anyhow::anyhow!("Another StudyGrind timer is already running. Close it before starting a new one.")
            })?;

            let theme = local.theme();
            let accent = local.accent().parse::<Color>().unwrap_or_else(|_| {
                warn!("Unknown accent colour, using cyan");
                Color::Cyan
            });
            let mut dashboard = tui::Dashboard::new(
                backend,
                local,
                profile,
                config.timer_settings(),
                config.leaderboard_size,
                Utc::now(),
            );
            tui::run_tui(&mut dashboard, theme, accent)?;
        }
        Commands::Stats => {
            let Some(user) = require_user(&local) else {
                return Ok(());
            };
            let sessions = backend.user_sessions(&user, None)?;
            let stats = stats::calculate_stats(&sessions, Local::now());
            print!("{}", Reporter::new(&user).stats(&stats));
        }
        Commands::Leaderboard { university, view } => {
            let Some(user) = require_user(&local) else {
                return Ok(());
            };
            let filter = match university {
                Some(u) => UniversityFilter::from(u.as_str()),
                None => backend
                    .profile(&user)?
                    .map(|p| UniversityFilter::from(p.university.as_str()))
                    .unwrap_or_default(),
            };
            let board = leaderboard::fetch(
                &backend,
                &filter,
                view,
                Some(user.as_str()),
                config.leaderboard_size,
                Utc::now(),
            )?;
            print!("{}", Reporter::new(&user).leaderboard(&board, &filter, view));
        }
        Commands::Universities { query } => {
            for name in typeahead::suggest(catalog::UNIVERSITIES, &query) {
                println!("{name}");
            }
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server_port);
            let universities = catalog::UNIVERSITIES.iter().map(|u| u.to_string()).collect();
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(port, universities))?;
        }
        Commands::Theme { theme, accent } => {
            local.set(THEME_KEY, &theme)?;
            if let Some(accent) = accent {
                if accent.parse::<Color>().is_err() {
                    println!("Unknown colour \"{accent}\".");
                    return Ok(());
                }
                local.set(ACCENT_KEY, &accent)?;
            }
            println!("Theme saved.");
        }
    }

    Ok(())
}
