//! # Upkeep
//!
//! A terminal dashboard for household and farm maintenance. Track recurring
//! care (animals, plants, farm areas) and upkeep (home, vehicles, equipment,
//! members' gear, training and medical checks), and let upkeep keep a tidy set
//! of calendar reminders for whatever is coming due.
//!
//! ## Usage
//!
//! ```bash
//! # Worm the goats every 60 days, last done on New Year's Day
//! upkeep item add animal Worming --name Bella --every 60 --last 2025-01-01
//! upkeep item add animal Worming --name Daisy --every 60 --last 2025-01-01
//!
//! # Both share one reminder
//! upkeep reminder list
//!
//! # Done: both goats get the completion, the next reminder appears
//! upkeep reminder done 1
//!
//! # Oil change every 180 days or 5000 miles
//! upkeep item add vehicle "Oil change" --name Truck --every 180 --every-usage 5000 --last-reading 42000
//!
//! # Recurring chores shown on the calendar
//! upkeep template add "Collect eggs" --start 2025-01-01 --repeat daily
//! upkeep calendar --days 14
//!
//! # Keep reminders fresh in the background
//! upkeep watch
//! ```
//!
//! Data lives in `~/.local/share/upkeep/` (override with `UPKEEP_DB`);
//! configuration in `~/.config/upkeep/config.toml` (override with
//! `UPKEEP_CONFIG`). Logging goes to stderr and follows `RUST_LOG`.

use std::io;
use std::process::ExitCode;

use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use upkeep::commands::*;
use upkeep::config::Config;
use upkeep::models::SourceType;
use upkeep::scheduler;
use upkeep::storage::JsonStore;
use upkeep::sync::SyncWindow;
use upkeep::tui::run_tui;

#[derive(Parser)]
#[command(name = "upkeep")]
#[command(about = "Household and farm maintenance reminders", long_about = None)]
struct Cli {
    /// Days ahead to keep reminders for (overrides the config file)
    #[arg(long, global = true)]
    horizon: Option<i64>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage maintenance items
    Item {
        #[command(subcommand)]
        command: ItemCommands,
    },
    /// Manage reminders
    Reminder {
        #[command(subcommand)]
        command: ReminderCommands,
    },
    /// Manage recurring task templates
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Show reminders and recurring tasks for the coming days
    Calendar {
        /// First day in YYYY-MM-DD (default: today)
        #[arg(short, long)]
        from: Option<String>,
        /// Number of days to show
        #[arg(short, long, default_value_t = 14)]
        days: u32,
    },
    /// Reconcile reminders with the items currently due
    Sync {
        /// Only this source type
        #[arg(short, long)]
        source: Option<SourceType>,
    },
    /// Keep syncing on a schedule until interrupted
    Watch {
        /// Minutes between passes (overrides the config file)
        #[arg(short, long)]
        interval: Option<u32>,
    },
    /// Reset the database (delete all items, reminders and templates)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum ItemCommands {
    /// Add a maintenance item
    Add {
        /// Source type (home, vehicle, equipment, farm, animal, watering, fertilizing, gear, training, medical)
        source: SourceType,
        /// Care or maintenance type, e.g. "Worming"
        label: String,
        /// Animal, plant, vehicle, area or member name
        #[arg(short, long)]
        name: String,
        /// Location or owner, used to group reminders
        #[arg(short, long)]
        location: Option<String>,
        /// Repeat every N days
        #[arg(short, long)]
        every: Option<u32>,
        /// Repeat every N hours or miles on the item's meter
        #[arg(long)]
        every_usage: Option<f64>,
        /// Last done, YYYY-MM-DD
        #[arg(long)]
        last: Option<String>,
        /// Meter reading when last done
        #[arg(long)]
        last_reading: Option<f64>,
        /// Manual due date, YYYY-MM-DD
        #[arg(short, long)]
        due: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List items with their due status
    List {
        #[arg(short, long)]
        source: Option<SourceType>,
        /// Include inactive items
        #[arg(short, long)]
        all: bool,
    },
    /// Edit an item
    Edit {
        source: SourceType,
        id: u64,
        #[arg(long)]
        label: Option<String>,
        #[arg(short, long)]
        every: Option<u32>,
        #[arg(long)]
        every_usage: Option<f64>,
        #[arg(long)]
        last: Option<String>,
        #[arg(short, long)]
        due: Option<String>,
        /// Current meter reading
        #[arg(short, long)]
        reading: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark an item done
    Done {
        source: SourceType,
        id: u64,
        /// Completion date (default: today)
        #[arg(long)]
        on: Option<String>,
        /// Meter reading at completion
        #[arg(short, long)]
        reading: Option<f64>,
    },
    /// Deactivate an item
    Remove {
        source: SourceType,
        id: u64,
    },
}

#[derive(Subcommand)]
enum ReminderCommands {
    /// Add a reminder of your own
    Add {
        title: String,
        /// Due date in YYYY-MM-DD
        #[arg(short, long)]
        due: String,
        /// Due time in HH:MM
        #[arg(short, long)]
        time: Option<String>,
    },
    /// List reminders
    List {
        /// Show completed reminders
        #[arg(short, long)]
        all: bool,
    },
    /// Mark a reminder as complete
    Done {
        id: u64,
        /// Completion date (default: today)
        #[arg(long)]
        on: Option<String>,
        /// Meter reading at completion
        #[arg(short, long)]
        reading: Option<f64>,
    },
    /// Remove a reminder you added
    Remove {
        id: u64,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// Add a recurring task
    Add {
        title: String,
        /// First occurrence, YYYY-MM-DD
        #[arg(short, long)]
        start: String,
        /// daily, weekly, biweekly, monthly, annual, every:<n>, weekdays:mon,thu
        #[arg(short, long)]
        repeat: String,
        /// Time of day in HH:MM
        #[arg(short, long)]
        time: Option<String>,
    },
    /// List recurring tasks
    List,
    /// Remove a recurring task
    Remove {
        id: u64,
    },
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let watching = matches!(cli.command, Some(Commands::Watch { .. }));
    init_logging(if watching { "info" } else { "warn" });

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> upkeep::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(h) = cli.horizon {
        config.horizon_days = h;
    }
    let store = JsonStore::open(&config.data_dir)?;
    let today = Local::now().date_naive();
    let window = SyncWindow::new(today, config.horizon_days);

    match cli.command {
        Some(Commands::Item { command }) => match command {
            ItemCommands::Add { source, label, name, location, every, every_usage, last, last_reading, due, notes } => {
                let args = NewItemArgs { label, name, location, every_days: every, every_usage, last, last_reading, due, notes };
                cmd_item_add(&store, source, args, window, false).map(|_| ())
            }
            ItemCommands::List { source, all } => cmd_item_list(&store, source, all, today),
            ItemCommands::Edit { source, id, label, every, every_usage, last, due, reading, notes } => {
                let edit = ItemEdit { label, every_days: every, every_usage, last, due, reading, notes };
                cmd_item_edit(&store, source, id, edit, window, false).map(|_| ())
            }
            ItemCommands::Done { source, id, on, reading } => {
                cmd_item_done(&store, source, id, on, reading, window, false).map(|_| ())
            }
            ItemCommands::Remove { source, id } => cmd_item_remove(&store, source, id, window, false),
        },
        Some(Commands::Reminder { command }) => match command {
            ReminderCommands::Add { title, due, time } => cmd_reminder_add(&store, title, due, time, false).map(|_| ()),
            ReminderCommands::List { all } => cmd_reminder_list(&store, all, today),
            ReminderCommands::Done { id, on, reading } => {
                cmd_reminder_done(&store, id, on, reading, window, false).map(|_| ())
            }
            ReminderCommands::Remove { id } => cmd_reminder_remove(&store, id, false).map(|_| ()),
        },
        Some(Commands::Template { command }) => match command {
            TemplateCommands::Add { title, start, repeat, time } => {
                cmd_template_add(&store, title, start, repeat, time, false).map(|_| ())
            }
            TemplateCommands::List => cmd_template_list(&store, today),
            TemplateCommands::Remove { id } => cmd_template_remove(&store, id, false),
        },
        Some(Commands::Calendar { from, days }) => {
            let from = match from {
                Some(f) => parse_date(&f)?,
                None => today,
            };
            cmd_calendar(&store, from, days)
        }
        Some(Commands::Sync { source }) => cmd_sync(&store, source, window, false).map(|_| ()),
        Some(Commands::Watch { interval }) => {
            let interval = interval.unwrap_or(config.watch_interval_minutes);
            scheduler::run(&store, interval, config.horizon_days);
            Ok(())
        }
        Some(Commands::Reset { force }) => cmd_reset(&store, force),
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "upkeep", &mut io::stdout());
            Ok(())
        }
        Some(Commands::Ui) | None => {
            if let Err(e) = run_tui(&store, config.horizon_days) {
                eprintln!("Error running TUI: {}", e);
            }
            Ok(())
        }
    }
}
