//! Session and consumer identifiers

use std::fmt;

use super::error::RegistryError;

const MAX_ID_LEN: usize = 128;

fn validate(raw: &str) -> Result<String, RegistryError> {
    let trimmed = raw.trim();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= MAX_ID_LEN
        && !trimmed.chars().any(char::is_control);

    if valid {
        Ok(trimmed.to_string())
    } else {
        Err(RegistryError::InvalidId(raw.to_string()))
    }
}

/// Opaque identifier of a session (one tracked game for one display)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    /// Parse a session id; surrounding whitespace is dropped
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        validate(raw).map(Self)
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

/// Identifier of a downstream consumer reading from a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerId(String);

impl ConsumerId {
    /// Parse a consumer id; surrounding whitespace is dropped
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        validate(raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
