use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Stable id of the signed-in account. Used to namespace every stored key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            anyhow::bail!("User id must not be empty");
        }
        // ':' separates the parts of a storage key
        if s.contains(':') || s.chars().any(char::is_whitespace) {
            anyhow::bail!("User id '{}' may not contain ':' or whitespace", s);
        }
        Ok(UserId(s.to_string()))
    }
}
