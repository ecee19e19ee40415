//! In-memory repository used by unit tests and as a reference
//! implementation of the whole-document write semantics the engine
//! assumes.

use crate::error::CoreError;
use crate::models::{AnnualEvent, EventDefinition, NotificationStatus, ScheduledNotification};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryRepository {
    events: Mutex<BTreeMap<String, EventDefinition>>,
    annual_events: Mutex<BTreeMap<String, AnnualEvent>>,
    notifications: Mutex<BTreeMap<String, ScheduledNotification>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl super::EventRepository for MemoryRepository {
    async fn find_event_by_id(&self, id: &str) -> Result<Option<EventDefinition>, CoreError> {
        Ok(self.events.lock().unwrap().get(id).cloned())
    }

    async fn put_event(&self, event: &EventDefinition) -> Result<(), CoreError> {
        self.events
            .lock()
            .unwrap()
            .insert(event.id.clone(), event.clone());
        Ok(())
    }

    async fn find_events_for_family(
        &self,
        family_id: &str,
    ) -> Result<Vec<EventDefinition>, CoreError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.family_id == family_id)
            .cloned()
            .collect())
    }

    async fn find_events_by_annual_id(
        &self,
        annual_event_id: &str,
    ) -> Result<Vec<EventDefinition>, CoreError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.annual_event_id.as_deref() == Some(annual_event_id))
            .cloned()
            .collect())
    }

    async fn delete_events(&self, ids: &[String]) -> Result<(), CoreError> {
        let mut events = self.events.lock().unwrap();
        for id in ids {
            events.remove(id);
        }
        Ok(())
    }

    async fn find_expired_reminders(
        &self,
        cutoff: NaiveDate,
    ) -> Result<Vec<EventDefinition>, CoreError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.is_reminder && e.date.is_some_and(|d| d < cutoff))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl super::AnnualEventRepository for MemoryRepository {
    async fn find_annual_event_by_id(&self, id: &str) -> Result<Option<AnnualEvent>, CoreError> {
        Ok(self.annual_events.lock().unwrap().get(id).cloned())
    }

    async fn put_annual_event(&self, event: &AnnualEvent) -> Result<(), CoreError> {
        self.annual_events
            .lock()
            .unwrap()
            .insert(event.id.clone(), event.clone());
        Ok(())
    }

    async fn find_annual_events_for_family(
        &self,
        family_id: &str,
    ) -> Result<Vec<AnnualEvent>, CoreError> {
        Ok(self
            .annual_events
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.family_id == family_id)
            .cloned()
            .collect())
    }

    async fn delete_annual_event(&self, id: &str) -> Result<(), CoreError> {
        self.annual_events
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CoreError::NotFound(format!("Annual event with id {} not found", id)))
    }
}

#[async_trait]
impl super::NotificationRepository for MemoryRepository {
    async fn add_notification(
        &self,
        notification: &ScheduledNotification,
    ) -> Result<(), CoreError> {
        self.notifications
            .lock()
            .unwrap()
            .insert(notification.id.clone(), notification.clone());
        Ok(())
    }

    async fn update_notification(
        &self,
        notification: &ScheduledNotification,
    ) -> Result<(), CoreError> {
        let mut notifications = self.notifications.lock().unwrap();
        if !notifications.contains_key(&notification.id) {
            return Err(CoreError::NotFound(format!(
                "Notification with id {} not found",
                notification.id
            )));
        }
        notifications.insert(notification.id.clone(), notification.clone());
        Ok(())
    }

    async fn find_pending_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<ScheduledNotification>, CoreError> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .values()
            .filter(|n| n.event_id == event_id && n.status == NotificationStatus::Pending)
            .cloned()
            .collect())
    }

    async fn find_due_pending(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ScheduledNotification>, CoreError> {
        let mut due: Vec<ScheduledNotification> = self
            .notifications
            .lock()
            .unwrap()
            .values()
            .filter(|n| n.status == NotificationStatus::Pending && n.scheduled_time <= now)
            .cloned()
            .collect();
        due.sort_by_key(|n| n.scheduled_time);
        due.truncate(limit);
        Ok(due)
    }
}

impl super::Repository for MemoryRepository {}
