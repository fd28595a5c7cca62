//! Persistence of newsletter subscribers.
//!
//! Every backend must enforce email uniqueness itself: two concurrent
//! `create` calls for the same address yield exactly one success.
mod in_memory;
mod postgres;

use std::future::Future;
use std::sync::Arc;

pub use in_memory::InMemorySubscriberStore;
pub use postgres::PostgresSubscriberStore;

use crate::domain::{Subscriber, SubscriberEmail};
use crate::util::error_chain_fmt;

pub trait SubscriberStore: Send + Sync + 'static {
    /// Inserts a new active subscriber.
    fn create(
        &self,
        email: &SubscriberEmail,
    ) -> impl Future<Output = Result<Subscriber, StoreError>> + Send;

    /// Marks the subscriber inactive. Succeeds when no row matches.
    fn deactivate(
        &self,
        email: &SubscriberEmail,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Active subscribers in creation order.
    fn list_active(&self) -> impl Future<Output = Result<Vec<Subscriber>, StoreError>> + Send;
}

impl<S: SubscriberStore> SubscriberStore for Arc<S> {
    fn create(
        &self,
        email: &SubscriberEmail,
    ) -> impl Future<Output = Result<Subscriber, StoreError>> + Send {
        (**self).create(email)
    }

    fn deactivate(
        &self,
        email: &SubscriberEmail,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).deactivate(email)
    }

    fn list_active(&self) -> impl Future<Output = Result<Vec<Subscriber>, StoreError>> + Send {
        (**self).list_active()
    }
}

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("A subscriber with this email already exists")]
    DuplicateEmail,
    #[error("The subscriber store is unavailable")]
    Unavailable(#[source] anyhow::Error),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
