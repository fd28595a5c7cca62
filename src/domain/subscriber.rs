use chrono::{DateTime, Utc};

use crate::domain::SubscriberEmail;

/// A single newsletter opt-in. Created active, only ever deactivated afterwards.
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub id: i64,
    pub email: SubscriberEmail,
    pub subscribed_at: DateTime<Utc>,
    pub is_active: bool,
}
