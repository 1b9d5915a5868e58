//! Feed token record

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::FEED_TOKEN_LENGTH;

/// A capability granting unauthenticated read access to one user's exported
/// calendar.
///
/// The token value is random and shown only at creation. Revocation flips
/// `is_active`; consumers of a revoked, expired or unknown token all see the
/// same `404` so token existence is never leaked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedToken {
    pub token: String,
    pub owner_id: String,
    pub include_private: bool,
    pub is_active: bool,
    pub expires_at_ms: Option<i64>,
    pub access_count: i64,
    pub last_accessed_at_ms: Option<i64>,
    pub created_at_ms: i64,
}

impl FeedToken {
    /// True when the token can serve a feed at `now_ms`.
    pub fn is_usable(&self, now_ms: i64) -> bool {
        self.is_active && self.expires_at_ms.map_or(true, |exp| exp > now_ms)
    }

    /// Generate a fresh opaque token value.
    pub fn generate_value() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(FEED_TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }
}

/// Parameters for issuing a feed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFeedToken {
    pub owner_id: String,
    #[serde(default)]
    pub include_private: bool,
    pub expires_at_ms: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(active: bool, expires_at_ms: Option<i64>) -> FeedToken {
        FeedToken {
            token: FeedToken::generate_value(),
            owner_id: "user-1".into(),
            include_private: false,
            is_active: active,
            expires_at_ms,
            access_count: 0,
            last_accessed_at_ms: None,
            created_at_ms: 0,
        }
    }

    #[test]
    fn generated_values_are_unique_and_sized() {
        let a = FeedToken::generate_value();
        let b = FeedToken::generate_value();
        assert_eq!(a.len(), FEED_TOKEN_LENGTH);
        assert_ne!(a, b);
    }

    #[test]
    fn inactive_token_is_unusable() {
        assert!(!token(false, None).is_usable(1_000));
    }

    #[test]
    fn expired_token_is_unusable() {
        assert!(!token(true, Some(999)).is_usable(1_000));
        assert!(token(true, Some(1_001)).is_usable(1_000));
    }

    #[test]
    fn token_without_expiry_is_usable() {
        assert!(token(true, None).is_usable(i64::MAX));
    }
}
