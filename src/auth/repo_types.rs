use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Registered account as persisted by the user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,              // unique user ID
    pub name: String,          // display name
    pub email: String,         // stored as typed, compared case-insensitively
    pub password_hash: String, // argon2id PHC string
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn new(name: &str, email: &str, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn has_email(&self, email: &str) -> bool {
        emails_match(&self.email, email)
    }
}

/// Case-insensitive email comparison used for lookup and uniqueness.
pub fn emails_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_keys() {
        let user = User::new("Ann", "Ann@Example.com", "$argon2id$stub".into());
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "Ann@Example.com");
        assert_eq!(json["passwordHash"], "$argon2id$stub");
        assert!(json["createdAt"].is_string());
        assert!(json.get("password_hash").is_none());

        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn email_match_ignores_case_only() {
        assert!(emails_match("Ann@Example.com", "ann@example.COM"));
        assert!(!emails_match("ann@example.com", "ann@example.co"));
        assert!(!emails_match(" ann@example.com", "ann@example.com"));
    }
}
