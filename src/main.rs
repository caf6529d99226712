//! # AppTrack — application tracker with email reminders
//!
//! Usage:
//!   apptrack serve                       # HTTP trigger endpoint + daily reminder loop
//!   apptrack send-reminders              # Send deadline and result reminders now
//!   apptrack send-reminders --deadlines  # Only deadline reminders
//!   apptrack add --title ... --organization ... --deadline 2026-03-01
//!   apptrack list
//!   apptrack set-status 3 applied
//!   apptrack delete 3

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use apptrack_channels::EmailSender;
use apptrack_core::AppTrackConfig;
use apptrack_core::types::{ApplicationStatus, Category, NewApplication};
use apptrack_db::ApplicationDb;
use apptrack_gateway::AppState;
use apptrack_scheduler::ReminderScheduler;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "apptrack",
    version,
    about = "📋 AppTrack — application deadlines with email reminders"
)]
struct Cli {
    /// Config file (default: ~/.apptrack/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP gateway and the daily reminder loop
    Serve {
        /// Override gateway port
        #[arg(short, long)]
        port: Option<u16>,

        /// Serve the trigger endpoint only; rely on an external cron
        #[arg(long)]
        no_loop: bool,
    },
    /// Send reminders now (both kinds unless a flag narrows it)
    SendReminders {
        /// Send only deadline reminders
        #[arg(long)]
        deadlines: bool,

        /// Send only result reminders
        #[arg(long)]
        results: bool,
    },
    /// Record a new application
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        organization: String,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: NaiveDate,
        /// job, scholarship, internship, exam, other
        #[arg(long, default_value = "job")]
        category: Category,
        /// pending, applied, selected, rejected
        #[arg(long, default_value = "pending")]
        status: ApplicationStatus,
        /// Expected result date (YYYY-MM-DD)
        #[arg(long)]
        result_date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List applications, nearest deadline first
    List,
    /// Change an application's status (selected/rejected end deadline reminders)
    SetStatus {
        id: i64,
        /// pending, applied, selected, rejected
        status: ApplicationStatus,
    },
    /// Delete an application
    Delete { id: i64 },
    /// Write a config file with default values
    InitConfig,
}

fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

fn load_config(path: Option<&PathBuf>) -> Result<AppTrackConfig> {
    let mut config = match path {
        Some(p) => AppTrackConfig::load_from(p)?,
        None => return Ok(AppTrackConfig::load()?),
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn open_db(config: &AppTrackConfig) -> Result<Arc<ApplicationDb>> {
    let db_path = expand_path(&config.database.path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::debug!("🗄️ Opening database {}", db_path.display());
    let db = ApplicationDb::open(&db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    Ok(Arc::new(db))
}

fn build_scheduler(config: &AppTrackConfig, db: Arc<ApplicationDb>) -> Result<Arc<ReminderScheduler>> {
    let sender = EmailSender::new(&config.mail)?;
    let recipient = config.reminders.recipient(&config.mail).to_string();
    if recipient.is_empty() {
        anyhow::bail!("No reminder recipient: set reminders.admin_email (ADMIN_EMAIL)");
    }
    Ok(Arc::new(ReminderScheduler::new(
        db,
        Arc::new(sender),
        recipient,
        config.reminders.clone(),
    )))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "apptrack=debug,apptrack_scheduler=debug,apptrack_gateway=debug,tower_http=debug"
    } else {
        "apptrack=info,apptrack_scheduler=info,apptrack_gateway=info,apptrack_channels=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    if let Command::InitConfig = cli.command {
        let path = cli.config.clone().unwrap_or_else(AppTrackConfig::default_path);
        if path.exists() {
            println!("⚠️  Config already exists: {}", path.display());
        } else {
            AppTrackConfig::default().save_to(&path)?;
            println!("✅ Wrote default config to {}", path.display());
        }
        return Ok(());
    }

    let config = load_config(cli.config.as_ref())?;
    let db = open_db(&config)?;

    match cli.command {
        Command::Serve { port, no_loop } => {
            let scheduler = build_scheduler(&config, db)?;
            let mut gateway = config.gateway.clone();
            if let Some(port) = port {
                gateway.port = port;
            }

            println!("📋 AppTrack v{}", env!("CARGO_PKG_VERSION"));
            println!("   🌐 Trigger:   http://{}:{}/reminders/trigger", gateway.host, gateway.port);
            println!("   📧 Recipient: {}", scheduler.recipient());
            if !no_loop {
                println!(
                    "   ⏰ Schedule:  deadlines '{}', results '{}'",
                    config.reminders.deadline_cron, config.reminders.result_cron
                );
                tokio::spawn(apptrack_scheduler::spawn_reminder_loop(scheduler.clone()));
            }
            println!();

            let state = AppState::new(scheduler, config.reminders.cron_secret.clone());
            apptrack_gateway::start_server(state, &gateway).await?;
        }
        Command::SendReminders { deadlines, results } => {
            let scheduler = build_scheduler(&config, db)?;
            let run_both = !deadlines && !results;
            let mut total = 0;

            if run_both || deadlines {
                println!("Sending deadline reminders...");
                let count = scheduler.run_deadline_reminders().await?;
                total += count;
                println!("  ✓ Sent {count} deadline reminder(s)");
            }
            if run_both || results {
                println!("Sending result reminders...");
                let count = scheduler.run_result_reminders().await?;
                total += count;
                println!("  ✓ Sent {count} result reminder(s)");
            }

            println!("\nTotal: {total} email(s) sent.");
        }
        Command::Add {
            title,
            organization,
            deadline,
            category,
            status,
            result_date,
            notes,
        } => {
            let mut new = NewApplication::new(&title, &organization, deadline)
                .with_category(category)
                .with_status(status)
                .with_notes(&notes);
            if let Some(date) = result_date {
                new = new.with_result_date(date);
            }
            let app = db.insert(&new)?;
            println!("✅ Added #{}: {app}", app.id);
        }
        Command::List => {
            let today = config.reminders.today();
            let apps = db.list()?;
            if apps.is_empty() {
                println!("No applications yet.");
            } else {
                println!("{} application(s):", db.count()?);
            }
            for app in apps {
                println!(
                    "#{:<4} {:<12} {:>4}d  {:<11} {} @ {}",
                    app.id,
                    app.deadline,
                    app.days_until_deadline(today),
                    app.category.label(),
                    app.title,
                    app.organization
                );
            }
        }
        Command::SetStatus { id, status } => {
            db.set_status(id, status)?;
            let app = db.get(id)?;
            println!("✅ Updated #{id}: {app}");
        }
        Command::Delete { id } => {
            if db.delete(id)? {
                println!("🗑️  Deleted #{id}");
            } else {
                anyhow::bail!("Application #{id} not found");
            }
        }
        Command::InitConfig => {}
    }

    Ok(())
}
