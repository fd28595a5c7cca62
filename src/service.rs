use crate::domain::{FieldError, Subscriber, SubscriberEmail};
use crate::store::{StoreError, SubscriberStore};
use crate::util::error_chain_fmt;

/// Validates inbound addresses and forwards them to the store. Holds no state
/// of its own; every call is a single store round trip with no retries.
pub struct SubscriptionService<S> {
    store: S,
}

#[derive(thiserror::Error)]
pub enum SubscriptionError {
    #[error("The request failed validation")]
    InvalidEmail(Vec<FieldError>),
    #[error("Email already subscribed")]
    AlreadySubscribed,
    #[error("The subscription service is unavailable")]
    ServiceUnavailable(#[source] StoreError),
}

impl std::fmt::Debug for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<StoreError> for SubscriptionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => Self::AlreadySubscribed,
            e => {
                tracing::error!(error.cause_chain = ?e, "Subscriber store request failed");
                Self::ServiceUnavailable(e)
            }
        }
    }
}

impl<S: SubscriberStore> SubscriptionService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Re-subscribing after an unsubscribe is rejected as a duplicate: the
    /// address stays taken for the lifetime of the store.
    #[tracing::instrument(name = "Subscribe to newsletter", skip(self))]
    pub async fn subscribe(&self, raw_email: &str) -> Result<Subscriber, SubscriptionError> {
        let email = parse_email(raw_email)?;
        let subscriber = self.store.create(&email).await?;
        tracing::info!(subscriber_id = subscriber.id, "New subscriber saved");
        Ok(subscriber)
    }

    /// Succeeds whether or not the address was ever subscribed.
    #[tracing::instrument(name = "Unsubscribe from newsletter", skip(self))]
    pub async fn unsubscribe(&self, raw_email: &str) -> Result<(), SubscriptionError> {
        let email = parse_email(raw_email)?;
        self.store.deactivate(&email).await?;
        Ok(())
    }
}

fn parse_email(raw_email: &str) -> Result<SubscriberEmail, SubscriptionError> {
    SubscriberEmail::parse(raw_email).map_err(|e| {
        tracing::info!(reason = %e, "Rejected email address");
        SubscriptionError::InvalidEmail(vec![FieldError::invalid_email(raw_email)])
    })
}
