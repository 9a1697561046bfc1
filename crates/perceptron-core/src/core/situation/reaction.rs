use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionType {
    Redo,
    Skip,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionObject {
    FocusJob,
    FocusJobParent,
    PreviousJob,
    ParallelJob,
    SubsequentJob,
}

/// What a job runner should do once the owning situation is perceived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reaction {
    pub action: ActionType,
    pub object: ActionObject,
}

impl Reaction {
    pub fn new(action: ActionType, object: ActionObject) -> Self {
        Self { action, object }
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action, self.object)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid reaction keyword: '{0}'")]
pub struct ReactionParseError(pub String);

impl FromStr for ActionType {
    type Err = ReactionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REDO" => Ok(ActionType::Redo),
            "SKIP" => Ok(ActionType::Skip),
            "STOP" => Ok(ActionType::Stop),
            _ => Err(ReactionParseError(s.to_string())),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionType::Redo => "REDO",
            ActionType::Skip => "SKIP",
            ActionType::Stop => "STOP",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ActionObject {
    type Err = ReactionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FOCUSJOB" => Ok(ActionObject::FocusJob),
            "FOCUSJOBPARENT" => Ok(ActionObject::FocusJobParent),
            "PREVIOUSJOB" => Ok(ActionObject::PreviousJob),
            "PARALLELJOB" => Ok(ActionObject::ParallelJob),
            "SUBSEQUENTJOB" => Ok(ActionObject::SubsequentJob),
            _ => Err(ReactionParseError(s.to_string())),
        }
    }
}

impl fmt::Display for ActionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionObject::FocusJob => "FOCUSJOB",
            ActionObject::FocusJobParent => "FOCUSJOBPARENT",
            ActionObject::PreviousJob => "PREVIOUSJOB",
            ActionObject::ParallelJob => "PARALLELJOB",
            ActionObject::SubsequentJob => "SUBSEQUENTJOB",
        };
        write!(f, "{}", s)
    }
}
