use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::CallSetupError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(RequestId);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one compose box or in-place message edit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SessionKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Call providers whose links require an OAuth token exchange before they
/// can be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthCallProvider {
    Zoom,
}

impl OAuthCallProvider {
    pub const ALL: [OAuthCallProvider; 1] = [OAuthCallProvider::Zoom];

    pub fn as_str(self) -> &'static str {
        match self {
            OAuthCallProvider::Zoom => "zoom",
        }
    }
}

impl fmt::Display for OAuthCallProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthCallProvider {
    type Err = CallSetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zoom" => Ok(OAuthCallProvider::Zoom),
            other => Err(CallSetupError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoChatProvider {
    Disabled,
    JitsiMeet,
    Zoom,
    ZoomServerToServer,
    BigBlueButton,
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
