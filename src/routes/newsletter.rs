use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, web};
use serde::{Deserialize, Serialize};

use crate::domain::FieldError;
use crate::service::{SubscriptionError, SubscriptionService};
use crate::store::SubscriberStore;

#[derive(Deserialize)]
pub struct EmailBody {
    email: Option<String>,
}

impl EmailBody {
    fn email(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

#[derive(Serialize)]
struct ValidationResponse<'a> {
    errors: &'a [FieldError],
}

#[tracing::instrument(
    name = "Add a new newsletter subscriber",
    skip(body, service),
    fields(subscriber_email = %body.email())
)]
pub async fn subscribe<S: SubscriberStore>(
    body: web::Json<EmailBody>,
    service: web::Data<SubscriptionService<S>>,
) -> Result<HttpResponse, SubscriptionError> {
    service.subscribe(body.email()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Successfully subscribed to newsletter!",
    }))
}

#[tracing::instrument(
    name = "Remove a newsletter subscriber",
    skip(body, service),
    fields(subscriber_email = %body.email())
)]
pub async fn unsubscribe<S: SubscriberStore>(
    body: web::Json<EmailBody>,
    service: web::Data<SubscriptionService<S>>,
) -> Result<HttpResponse, SubscriptionError> {
    service.unsubscribe(body.email()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Successfully unsubscribed from newsletter",
    }))
}

/// A body that is not a JSON object with a string `email` has no usable
/// address, so it is reported like any other invalid email.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::info!(error = %err, "Rejected request body");
    SubscriptionError::InvalidEmail(vec![FieldError::invalid_email("")]).into()
}

impl ResponseError for SubscriptionError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscriptionError::InvalidEmail(_) | SubscriptionError::AlreadySubscribed => {
                StatusCode::BAD_REQUEST
            }
            SubscriptionError::ServiceUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        match self {
            SubscriptionError::InvalidEmail(errors) => {
                response.json(ValidationResponse { errors })
            }
            SubscriptionError::AlreadySubscribed => response.json(ErrorResponse {
                error: "Email already subscribed",
            }),
            SubscriptionError::ServiceUnavailable(_) => response.json(ErrorResponse {
                error: "Internal server error",
            }),
        }
    }
}
