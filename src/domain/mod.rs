mod field_error;
mod subscriber;
mod subscriber_email;

pub use field_error::FieldError;
pub use subscriber::Subscriber;
pub use subscriber_email::SubscriberEmail;
