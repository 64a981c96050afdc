use chrono::{DateTime, Duration, Utc};

/// Proof of a successful admin login, valid until `expires_at`.
///
/// The session never checks the clock by itself; whoever grants access
/// passes the current time to [`AdminSession::is_valid_at`].
#[derive(Debug, Clone, PartialEq)]
pub struct AdminSession {
    pub token: String,
    pub authenticated: bool,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn new(token: String, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token,
            authenticated: true,
            expires_at: issued_at + ttl,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.authenticated && now < self.expires_at
    }
}
