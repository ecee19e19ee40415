use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use hearthcal_core::models::{AnnualEventKind, EventStatus, MonthDay, RecurrenceType};

/// A family calendar with recurring events, per-day exceptions,
/// annual events and reminder delivery
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a new event
    Add(AddCommand),
    /// List the family's occurrences for a date range
    List(ListCommand),
    /// Edit an event or one occurrence of a recurring event
    Edit(EditCommand),
    /// Change the status of an event or occurrence
    Status(StatusCommand),
    /// Delete an event (the whole series, for recurring events)
    Delete(DeleteCommand),
    /// Manage annual events (birthdays, name days, anniversaries)
    Annual(AnnualCommand),
    /// Reminder notifications
    Notify(NotifyCommand),
    /// Remove expired generated reminders
    Cleanup,
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The name of the event
    pub name: String,
    /// Date for a one-time event (YYYY-MM-DD)
    #[clap(short, long)]
    pub date: Option<NaiveDate>,
    /// Start time (HH:MM)
    #[clap(short, long)]
    pub time: String,
    /// End time (HH:MM)
    #[clap(long)]
    pub end_time: Option<String>,
    /// Recurrence (none, daily, weekly, monthly)
    #[clap(long, default_value = "none")]
    pub every: RecurrenceType,
    /// Days of week for weekly recurrence (sun,mon,...,sat)
    #[clap(long)]
    pub on: Option<String>,
    /// First date of a recurring series (YYYY-MM-DD)
    #[clap(long)]
    pub start: Option<NaiveDate>,
    /// Last date of a recurring series (YYYY-MM-DD)
    #[clap(long)]
    pub until: Option<NaiveDate>,
    /// Location
    #[clap(short, long)]
    pub location: Option<String>,
    /// Notes
    #[clap(long)]
    pub notes: Option<String>,
    /// Member the event is assigned to
    #[clap(long)]
    pub assigned_to: Option<String>,
    /// Points awarded to a child member on completion
    #[clap(long)]
    pub points: Option<u32>,
    /// Reminder lead times in minutes before the event
    #[clap(long, num_args = 1..)]
    pub remind: Vec<u32>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// First date of the range (defaults to today)
    #[clap(long)]
    pub from: Option<NaiveDate>,
    /// Last date of the range (defaults to from + lookahead)
    #[clap(long)]
    pub to: Option<NaiveDate>,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The event id, or a generated occurrence id like abc-2025-01-13
    pub id: String,
    /// The template id when editing an occurrence of a series
    #[clap(long)]
    pub original_id: Option<String>,
    /// The occurrence date being edited
    #[clap(long)]
    pub date: Option<NaiveDate>,
    /// Save the change as a one-date exception instead of editing the
    /// whole series
    #[clap(long)]
    pub as_exception: bool,

    #[arg(long)]
    pub name: Option<String>,
    /// Start time (HH:MM)
    #[arg(long)]
    pub time: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub assigned_to: Option<String>,
    #[arg(long)]
    pub points: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
pub struct StatusCommand {
    /// The event id, or a generated occurrence id
    pub id: String,
    /// The new status (active, cancelled, inactive, completed)
    pub status: EventStatus,
    /// The template id when targeting an occurrence of a series
    #[clap(long)]
    pub original_id: Option<String>,
    /// The occurrence date being targeted
    #[clap(long)]
    pub date: Option<NaiveDate>,
    /// Reason, recorded on cancellation
    #[clap(long)]
    pub reason: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The event id, or a generated occurrence id
    pub id: String,
    /// The template id when the id is a generated occurrence id
    #[clap(long)]
    pub original_id: Option<String>,
    /// Skip the confirmation prompt
    #[clap(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct AnnualCommand {
    #[command(subcommand)]
    pub command: AnnualSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AnnualSubcommand {
    /// Add an annual event
    Add(AnnualAddCommand),
    /// List the family's annual events
    List,
    /// Delete an annual event and its generated definitions
    Delete(AnnualDeleteCommand),
    /// Regenerate definitions for all annual events and birthdays
    Sync,
}

#[derive(Parser, Debug, Clone)]
pub struct AnnualAddCommand {
    /// The name of the annual event
    pub name: String,
    /// The yearly date (MM-DD; 02-29 resolves to 02-28 off leap years)
    pub date: MonthDay,
    /// The kind (birthday, name_day, anniversary, other)
    #[clap(long, default_value = "other")]
    pub kind: AnnualEventKind,
    /// Generate 14- and 2-day lead reminders (premium)
    #[clap(long)]
    pub notify_prior: bool,
    #[clap(long)]
    pub color: Option<String>,
    #[clap(long)]
    pub notes: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct AnnualDeleteCommand {
    /// The annual event id
    pub id: String,
    /// Skip the confirmation prompt
    #[clap(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct NotifyCommand {
    #[command(subcommand)]
    pub command: NotifySubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum NotifySubcommand {
    /// (Re)schedule reminder records for one event
    Schedule(NotifyScheduleCommand),
    /// Deliver due reminders
    Sweep(NotifySweepCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct NotifyScheduleCommand {
    /// The event id
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct NotifySweepCommand {
    /// Maximum records to process (defaults to the configured batch)
    #[clap(long)]
    pub limit: Option<usize>,
}
