use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortLink {
    /// Opaque identifier (UUID v4), assigned at creation. The click ledger
    /// references links by this, never by code, so reclaimed codes cannot
    /// inherit a predecessor's clicks.
    pub id: String,
    pub short_code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ShortLink {
    /// A link is logically dead once `expires_at` has passed.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| t <= now)
    }

    pub fn is_live(&self) -> bool {
        !self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn link(expires_at: Option<DateTime<Utc>>) -> ShortLink {
        ShortLink {
            id: "00000000-0000-0000-0000-000000000000".to_string(),
            short_code: "aZ3kLmQ9pT".to_string(),
            original_url: "https://example.com/page".to_string(),
            created_at: Utc::now(),
            expires_at,
        }
    }

    #[test]
    fn test_no_expiry_is_live() {
        assert!(link(None).is_live());
    }

    #[test]
    fn test_future_expiry_is_live() {
        assert!(link(Some(Utc::now() + Duration::hours(1))).is_live());
    }

    #[test]
    fn test_past_expiry_is_dead() {
        let l = link(Some(Utc::now() - Duration::hours(1)));
        assert!(!l.is_live());
        assert!(l.is_expired_at(Utc::now()));
    }
}
