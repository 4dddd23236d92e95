use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::InvalidSessionId;

/// Opaque chat session identifier (random 128-bit UUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    #[must_use]
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for SessionId {
    type Err = InvalidSessionId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self).map_err(|_| InvalidSessionId(s.to_owned()))
    }
}

/// Author of a transcript message, in the completion engine's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "tool" => Ok(Self::Tool),
            other => Err(format!("invalid role: {other}")),
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Channel a fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    /// Intermediate "thinking" output. Never persisted.
    Reasoning,
    /// Answer text. Persisted to the transcript.
    Final,
}

/// Incremental unit of engine output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub role: Option<Role>,
    pub kind: FragmentKind,
    pub text: String,
}

impl Fragment {
    #[must_use]
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self { role: Some(Role::Assistant), kind: FragmentKind::Reasoning, text: text.into() }
    }

    #[must_use]
    pub fn answer(role: Role, text: impl Into<String>) -> Self {
        Self { role: Some(role), kind: FragmentKind::Final, text: text.into() }
    }

    /// Role-less, empty fragments carry no data.
    #[must_use]
    pub fn is_heartbeat(&self) -> bool {
        self.role.is_none() && self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_roundtrips_through_canonical_string() {
        let id = SessionId::new_random();
        let rendered = id.to_string();
        assert_eq!(rendered.len(), 36);
        assert_eq!(rendered.parse::<SessionId>().unwrap(), id);
    }

    #[test]
    fn session_id_rejects_garbage() {
        assert!("not-a-session".parse::<SessionId>().is_err());
    }

    #[test]
    fn heartbeat_requires_no_role_and_no_text() {
        let beat = Fragment { role: None, kind: FragmentKind::Final, text: String::new() };
        assert!(beat.is_heartbeat());
        assert!(!Fragment::answer(Role::Assistant, "").is_heartbeat());
        let roleless = Fragment { role: None, kind: FragmentKind::Final, text: "hi".to_owned() };
        assert!(!roleless.is_heartbeat());
    }

    #[test]
    fn role_parses_engine_vocabulary() {
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert!("narrator".parse::<Role>().is_err());
    }
}
