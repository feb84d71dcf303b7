//! Requested lifecycle action and the invocation record it comes from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tag key used for opt-in when the caller does not name one
pub const DEFAULT_TAG_KEY: &str = "Schedule";

/// Lifecycle action applied to every eligible cluster in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Start,
    Stop,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action input that is neither "start" nor "stop"
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid Action '{input}'. Must be 'Start' or 'Stop'.")]
pub struct InvalidAction {
    pub input: String,
}

impl FromStr for Action {
    type Err = InvalidAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("start") {
            Ok(Self::Start)
        } else if s.eq_ignore_ascii_case("stop") {
            Ok(Self::Stop)
        } else {
            Err(InvalidAction {
                input: s.to_string(),
            })
        }
    }
}

/// Validated intent for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: Action,

    /// Tag key whose presence opts a cluster in
    pub tag_key: String,
}

impl ActionRequest {
    pub fn new(action: Action, tag_key: impl Into<String>) -> Self {
        Self {
            action,
            tag_key: tag_key.into(),
        }
    }

    /// Validate a raw invocation record
    pub fn from_input(input: &InvocationInput) -> Result<Self, InvalidAction> {
        let action = input.action.as_deref().unwrap_or_default().parse::<Action>()?;
        let tag_key = input
            .schedule_tag_key
            .clone()
            .unwrap_or_else(|| DEFAULT_TAG_KEY.to_string());

        Ok(Self { action, tag_key })
    }
}

/// Raw invocation record supplied by the trigger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationInput {
    #[serde(rename = "Action", default)]
    pub action: Option<String>,

    #[serde(rename = "ScheduleTagKey", default)]
    pub schedule_tag_key: Option<String>,
}
