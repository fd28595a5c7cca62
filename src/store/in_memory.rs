use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use chrono::Utc;

use super::{StoreError, SubscriberStore};
use crate::domain::{Subscriber, SubscriberEmail};

/// Process-local store. Uniqueness is checked and the row inserted under one
/// lock acquisition.
#[derive(Default)]
pub struct InMemorySubscriberStore {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl InMemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row, active or not.
    pub fn all(&self) -> Result<Vec<Subscriber>, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Subscriber>>, StoreError> {
        self.subscribers
            .lock()
            .map_err(|_| StoreError::Unavailable(anyhow!("Subscriber store lock was poisoned")))
    }
}

impl SubscriberStore for InMemorySubscriberStore {
    async fn create(&self, email: &SubscriberEmail) -> Result<Subscriber, StoreError> {
        let mut subscribers = self.lock()?;
        if subscribers.iter().any(|s| &s.email == email) {
            return Err(StoreError::DuplicateEmail);
        }

        let subscriber = Subscriber {
            id: subscribers.last().map_or(1, |s| s.id + 1),
            email: email.clone(),
            subscribed_at: Utc::now(),
            is_active: true,
        };
        subscribers.push(subscriber.clone());
        Ok(subscriber)
    }

    async fn deactivate(&self, email: &SubscriberEmail) -> Result<(), StoreError> {
        if let Some(subscriber) = self.lock()?.iter_mut().find(|s| &s.email == email) {
            subscriber.is_active = false;
        }
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<Subscriber>, StoreError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|s| s.is_active)
            .cloned()
            .collect())
    }
}
