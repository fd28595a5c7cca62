use std::fmt::Display;
use std::net::IpAddr;

use validator::ValidateEmail;

/// A syntactically valid email address, trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberEmail(String);

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl SubscriberEmail {
    pub fn parse(email: impl ToString) -> Result<Self, String> {
        let email = email.to_string().trim().to_string();
        if !ValidateEmail::validate_email(&email) || !has_public_domain(&email) {
            return Err(format!("{email} is not a valid email"));
        }
        Ok(Self(email.to_lowercase()))
    }
}

/// The domain must be a fully qualified name ending in an alphabetic TLD of
/// at least two characters (or a punycode one). IP literals are rejected.
fn has_public_domain(email: &str) -> bool {
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if domain.starts_with('[') || domain.parse::<IpAddr>().is_ok() {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => {
            !name.is_empty()
                && tld.chars().count() >= 2
                && (tld.chars().all(char::is_alphabetic) || tld.to_lowercase().starts_with("xn--"))
        }
        None => false,
    }
}
