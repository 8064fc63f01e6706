use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bearer credential issued by the login endpoint, together with the
/// context it was issued under. `created_at` is diagnostic only; no expiry
/// is attached to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(token: String, username: String) -> Self {
        Self {
            token,
            username,
            created_at: Utc::now(),
        }
    }
}

/// Storage for at most one active credential.
///
/// A successful login is the only writer; every authenticated request reads
/// the current token through this trait. Implementations are ephemeral by
/// contract: nothing stored here survives the owning process.
pub trait SessionStore {
    /// Store `data` as the sole current session, overwriting any prior value.
    fn save(&mut self, data: SessionData);

    /// The current bearer token, or `None` if no login has succeeded yet.
    fn current(&self) -> Option<&str>;
}

/// In-memory session store. Starts absent.
#[derive(Debug, Default)]
pub struct Session {
    data: Option<SessionData>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full session record, if any.
    pub fn data(&self) -> Option<&SessionData> {
        self.data.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.data.is_some()
    }

    /// Drop the stored credential. Nothing calls this in the current flow;
    /// any logout surface added later must go through here.
    pub fn clear(&mut self) {
        self.data = None;
    }
}

impl SessionStore for Session {
    fn save(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    fn current(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_absent() {
        let session = Session::new();
        assert!(session.current().is_none());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn save_overwrites_prior_value() {
        let mut session = Session::new();
        session.save(SessionData::new("first".into(), "alice".into()));
        assert_eq!(session.current(), Some("first"));

        session.save(SessionData::new("second".into(), "alice".into()));
        assert_eq!(session.current(), Some("second"));
        assert_eq!(session.data().map(|d| d.username.as_str()), Some("alice"));
    }

    #[test]
    fn clear_removes_credential() {
        let mut session = Session::new();
        session.save(SessionData::new("tok".into(), "alice".into()));
        session.clear();
        assert!(session.current().is_none());
    }
}
