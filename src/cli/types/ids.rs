//! ID types for players and bidding sessions.

use crate::error::{Result, VigiballError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type-safe wrapper for player surrogate keys.
///
/// Assigned by the database on creation and never reused.
///
/// # Examples
///
/// ```rust
/// use vigiball::PlayerId;
///
/// let player_id = PlayerId::new(42);
/// assert_eq!(player_id.as_i64(), 42);
/// assert_eq!(player_id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub i64);

impl PlayerId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = VigiballError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|_| VigiballError::invalid("player_id", format!("{s:?} is not an integer")))
    }
}

/// Opaque identity of a bidding participant.
///
/// Not necessarily a registered account; the only requirement is that it is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(VigiballError::invalid("session_id", "must not be empty"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = VigiballError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = VigiballError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_parse() {
        assert_eq!("42".parse::<PlayerId>().unwrap(), PlayerId::new(42));
        assert_eq!(" 7 ".parse::<PlayerId>().unwrap(), PlayerId::new(7));
        assert!(matches!(
            "forty-two".parse::<PlayerId>(),
            Err(VigiballError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_session_id_rejects_blank() {
        assert!(SessionId::new("s1").is_ok());
        assert!(SessionId::new("").is_err());
        assert!(SessionId::new("   ").is_err());
    }

    #[test]
    fn test_session_id_serde_validates() {
        let id: SessionId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(id.as_str(), "abc");
        assert!(serde_json::from_str::<SessionId>("\"\"").is_err());
    }
}
