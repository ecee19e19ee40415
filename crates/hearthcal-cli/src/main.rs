use clap::Parser;
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};
use tracing_subscriber::EnvFilter;

use hearthcal_core::db;
use hearthcal_core::error::CoreError;
use hearthcal_core::repository::SqliteRepository;

mod cli;
mod commands;
mod config;
mod providers;
mod util;
mod views;

use providers::{ConfigDirectory, ConfigEntitlements, ConsoleTransport, LogLedger};

/// Everything a command needs: the repository, the config-backed
/// collaborators and the family timezone.
pub struct App<'a> {
    pub repo: &'a SqliteRepository,
    pub directory: &'a ConfigDirectory,
    pub entitlements: &'a ConfigEntitlements,
    pub transport: &'a ConsoleTransport,
    pub ledger: &'a LogLedger,
    pub timezone: chrono_tz::Tz,
    pub config: &'a config::Config,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::new().unwrap_or_default();
    let timezone = match config::validate_timezone(&config.timezone) {
        Ok(tz) => tz,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let db_pool = match db::establish_connection(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let repository = SqliteRepository::new(db_pool);
    let directory = ConfigDirectory::new(config.members.clone());
    let entitlements = ConfigEntitlements::new(config.premium);
    let transport = ConsoleTransport;
    let ledger = LogLedger;

    let app = App {
        repo: &repository,
        directory: &directory,
        entitlements: &entitlements,
        transport: &transport,
        ledger: &ledger,
        timezone,
        config: &config,
    };

    let cli = cli::Cli::parse();

    let result = match cli.command {
        cli::Commands::Add(command) => commands::save::add_event(&app, command).await,
        cli::Commands::List(command) => commands::list::list_events(&app, command).await,
        cli::Commands::Edit(command) => commands::save::edit_event(&app, command).await,
        cli::Commands::Status(command) => commands::status::change_status(&app, command).await,
        cli::Commands::Delete(command) => {
            if !command.force && !confirm_delete(&format!("event '{}'", command.id)) {
                println!("Deletion cancelled.");
                return;
            }
            commands::delete::delete_event(&app, command).await
        }
        cli::Commands::Annual(annual) => match annual.command {
            cli::AnnualSubcommand::Add(command) => {
                commands::annual::add_annual_event(&app, command).await
            }
            cli::AnnualSubcommand::List => commands::annual::list_annual_events(&app).await,
            cli::AnnualSubcommand::Delete(command) => {
                if !command.force && !confirm_delete(&format!("annual event '{}'", command.id)) {
                    println!("Deletion cancelled.");
                    return;
                }
                commands::annual::delete_annual_event(&app, command).await
            }
            cli::AnnualSubcommand::Sync => commands::annual::sync_annual_events(&app).await,
        },
        cli::Commands::Notify(notify) => match notify.command {
            cli::NotifySubcommand::Schedule(command) => {
                commands::notify::schedule(&app, command).await
            }
            cli::NotifySubcommand::Sweep(command) => commands::notify::sweep(&app, command).await,
        },
        cli::Commands::Cleanup => commands::annual::cleanup_expired_reminders(&app).await,
    };

    if let Err(e) = result {
        handle_error(e);
    }
}

fn confirm_delete(what: &str) -> bool {
    Confirm::new()
        .with_prompt(format!("Are you sure you want to delete {}?", what))
        .default(false)
        .interact()
        .unwrap_or(false)
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::Validation(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::MissingDate(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
                eprintln!("Pass the occurrence date with --date.");
            }
            CoreError::InvalidTimezone(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            other => {
                eprintln!("{} {}", "Error:".style(error_style), other);
            }
        }
    } else {
        eprintln!("{} {}", "Error:".style(error_style), err);
    }
    std::process::exit(1);
}
