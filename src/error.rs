use poise::serenity_prelude as serenity;
use std::fmt;

use thiserror::Error;

/// Which side of a `<roles> <channels>` pair failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Role,
    Channel,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Role => f.write_str("roles"),
            TargetKind::Channel => f.write_str("channels"),
        }
    }
}

#[derive(Error, Debug)]
pub enum BotError {
    // Resolution and precondition errors
    #[error("No valid {kind} found.")]
    NoValidTargets { kind: TargetKind },

    #[error("Cannot modify role {role}, higher than bot.")]
    HierarchyViolation { role: String },

    #[error("No permissions selected.")]
    NoSelection,

    #[error("No permissions to save for role {role}.")]
    NoDataToSave { role: String },

    #[error("Template '{name}' not found.")]
    TemplateNotFound { name: String },

    // Discord errors
    #[error("Discord API error: {message}")]
    PlatformCallFailure { message: String },

    // State errors
    #[error("Failed to load state from '{path}': {source}")]
    StateLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save state to '{path}': {source}")]
    StateSave {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse state file '{path}': {source}")]
    StateParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    // Configuration errors
    #[error("Invalid config: {message}")]
    ConfigValidation { message: String },
}

impl From<serenity::Error> for BotError {
    fn from(err: serenity::Error) -> Self {
        BotError::PlatformCallFailure {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
