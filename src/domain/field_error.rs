use serde::Serialize;

const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";

/// One failed validation rule for a request body field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
    pub msg: &'static str,
    pub path: &'static str,
    pub location: &'static str,
}

impl FieldError {
    pub fn invalid_email(value: impl ToString) -> Self {
        Self {
            kind: "field",
            value: value.to_string(),
            msg: INVALID_EMAIL_MESSAGE,
            path: "email",
            location: "body",
        }
    }
}
