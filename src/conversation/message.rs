use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a message in the chat history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(Message::user("hi").role(), Role::User);
        assert_eq!(Message::assistant("hi").role(), Role::Assistant);
        assert_eq!(Message::system("hi").role(), Role::System);
        assert_eq!(Message::user("hi").content(), "hi");
    }

    #[test]
    fn test_json_uses_lowercase_roles() {
        let json = Message::assistant("done").to_json().unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"done"}"#);

        let parsed = Message::from_json(r#"{"role":"system","content":"be brief"}"#).unwrap();
        assert_eq!(parsed, Message::system("be brief"));
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!(Message::from_json(r#"{"role":"tool","content":"x"}"#).is_err());
    }
}
