use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{AnnualEvent, EventDefinition, ScheduledNotification};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

// Re-export domain modules
pub mod annual;
pub mod events;
pub mod memory;
pub mod notifications;

pub use memory::MemoryRepository;

// Traits are defined in this module and implemented in respective
// domain modules. Documents are read and written whole: a concurrent
// reader observes either the pre- or post-write document, never a torn
// one.

/// Domain-specific trait for event definition documents
#[async_trait]
pub trait EventRepository {
    async fn find_event_by_id(&self, id: &str) -> Result<Option<EventDefinition>, CoreError>;
    /// Whole-document replace; inserts when the id is new.
    async fn put_event(&self, event: &EventDefinition) -> Result<(), CoreError>;
    async fn find_events_for_family(
        &self,
        family_id: &str,
    ) -> Result<Vec<EventDefinition>, CoreError>;
    async fn find_events_by_annual_id(
        &self,
        annual_event_id: &str,
    ) -> Result<Vec<EventDefinition>, CoreError>;
    /// Single atomic batch of hard deletes.
    async fn delete_events(&self, ids: &[String]) -> Result<(), CoreError>;
    /// Generated lead-time reminders dated strictly before `cutoff`.
    async fn find_expired_reminders(
        &self,
        cutoff: NaiveDate,
    ) -> Result<Vec<EventDefinition>, CoreError>;
}

/// Domain-specific trait for annual event templates
#[async_trait]
pub trait AnnualEventRepository {
    async fn find_annual_event_by_id(&self, id: &str) -> Result<Option<AnnualEvent>, CoreError>;
    async fn put_annual_event(&self, event: &AnnualEvent) -> Result<(), CoreError>;
    async fn find_annual_events_for_family(
        &self,
        family_id: &str,
    ) -> Result<Vec<AnnualEvent>, CoreError>;
    async fn delete_annual_event(&self, id: &str) -> Result<(), CoreError>;
}

/// Domain-specific trait for scheduled notification records
#[async_trait]
pub trait NotificationRepository {
    async fn add_notification(&self, notification: &ScheduledNotification)
        -> Result<(), CoreError>;
    async fn update_notification(
        &self,
        notification: &ScheduledNotification,
    ) -> Result<(), CoreError>;
    async fn find_pending_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<ScheduledNotification>, CoreError>;
    /// Pending records due at or before `now`, oldest first, bounded.
    async fn find_due_pending(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ScheduledNotification>, CoreError>;
}

/// Main repository trait that composes all domain traits
#[async_trait]
pub trait Repository:
    EventRepository + AnnualEventRepository + NotificationRepository + Send + Sync
{
}

/// SQLite implementation of the repository pattern. Each document is
/// one row: a JSON body plus extracted index columns.
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl Repository for SqliteRepository {}
