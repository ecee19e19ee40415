//! # Hearthcal Core Library
//!
//! Shared-family-calendar engine: template-plus-exceptions recurring
//! events, annual event scheduling and reminder notification delivery,
//! backed by a whole-document store.
//!
//! ## Features
//!
//! - **Template + Exceptions Recurrence**: one stored definition per
//!   series; per-date divergence lives in an embedded exception list
//! - **Deterministic Materialization**: read-time expansion of
//!   definitions into displayable occurrences, pure and idempotent
//! - **Reconciled Writes**: every mutation resolves to a single
//!   whole-document write, with advisory last-writer-wins conflict
//!   warnings instead of rejections
//! - **Annual Events**: birthdays, name days and anniversaries
//!   expanded per year with leap-day handling and lead-time reminders
//! - **Notification Queue**: per-recipient delivery records with quiet
//!   hours deferral and a bounded delivery sweep
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Stored documents and transfer objects
//! - [`repository`]: Data access layer with Repository pattern
//! - [`recurrence`]: Occurrence calculation
//! - [`exceptions`]: Exception list primitives
//! - [`materialize`]: Read-time occurrence resolution
//! - [`reconcile`]: Write reconciliation and status transitions
//! - [`annual`]: Annual-event scheduling
//! - [`notify`]: Notification scheduling and delivery
//! - [`external`]: Interfaces to out-of-crate collaborators
//! - [`timezone`]: Timezone utilities and validation
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use hearthcal_core::{
//!     db,
//!     materialize::materialize_occurrences,
//!     repository::{EventRepository, SqliteRepository},
//! };
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("family.db").await?;
//!     let repo = SqliteRepository::new(pool);
//!
//!     let definitions = repo.find_events_for_family("fam1").await?;
//!     let occurrences = materialize_occurrences(
//!         &definitions,
//!         NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
//!     );
//!     for occ in occurrences {
//!         println!("{} {} {}", occ.display_date, occ.time, occ.name);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod annual;
pub mod db;
pub mod error;
pub mod exceptions;
pub mod external;
pub mod materialize;
pub mod models;
pub mod notify;
pub mod reconcile;
pub mod recurrence;
pub mod repository;
pub mod timezone;
