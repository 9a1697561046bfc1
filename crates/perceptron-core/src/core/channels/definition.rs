use super::base::InfoChannel;
use super::source::{EnvironmentSource, FileSource, TextSource};
use super::types::ChannelType;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Declarative description of one or more channels, as found in TOML
/// configuration files.
///
/// Exactly one of `path`, `pattern`, `text`, or `environment` must be given.
/// A `pattern` is a regular expression matched against the file names of a
/// working directory, so that a generic definition (e.g. `.*\.log`) can be
/// turned into the concrete channels of a specific job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelDefinition {
    #[serde(rename = "type")]
    pub channel_type: Option<ChannelType>,
    pub path: Option<PathBuf>,
    pub pattern: Option<String>,
    pub text: Option<Vec<String>>,
    pub environment: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ChannelDefinitionError {
    #[error("Channel definition lacks a 'type'")]
    MissingType,
    #[error(
        "Channel definition of type {channel_type} must declare exactly one of 'path', 'pattern', 'text', or 'environment = true' (found {found})"
    )]
    AmbiguousSource {
        channel_type: ChannelType,
        found: usize,
    },
    #[error("Invalid file-name pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("Cannot list directory '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl ChannelDefinition {
    pub fn file(channel_type: ChannelType, path: impl Into<PathBuf>) -> Self {
        Self {
            channel_type: Some(channel_type),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn pattern(channel_type: ChannelType, pattern: impl Into<String>) -> Self {
        Self {
            channel_type: Some(channel_type),
            pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    pub fn environment(channel_type: ChannelType) -> Self {
        Self {
            channel_type: Some(channel_type),
            environment: Some(true),
            ..Self::default()
        }
    }

    /// Checks the definition without touching the filesystem.
    ///
    /// Returns the channel type on success. A definition must name a type,
    /// exactly one source, and a `pattern` that compiles as a regex.
    pub fn validate(&self) -> Result<ChannelType, ChannelDefinitionError> {
        let channel_type = self
            .channel_type
            .ok_or(ChannelDefinitionError::MissingType)?;

        let found = [
            self.path.is_some(),
            self.pattern.is_some(),
            self.text.is_some(),
            self.environment.unwrap_or(false),
        ]
        .into_iter()
        .filter(|present| *present)
        .count();
        if found != 1 {
            return Err(ChannelDefinitionError::AmbiguousSource {
                channel_type,
                found,
            });
        }

        if let Some(pattern) = &self.pattern {
            compile_pattern(pattern)?;
        }
        Ok(channel_type)
    }

    /// Turns this definition into concrete channels.
    ///
    /// Relative paths and patterns are resolved against `workdir`. A pattern
    /// that matches no file yields no channels.
    pub fn resolve(&self, workdir: &Path) -> Result<Vec<InfoChannel>, ChannelDefinitionError> {
        let channel_type = self.validate()?;

        if let Some(path) = &self.path {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                workdir.join(path)
            };
            return Ok(vec![InfoChannel::new(channel_type, FileSource::new(path))]);
        }
        if let Some(pattern) = &self.pattern {
            return resolve_pattern(channel_type, pattern, workdir);
        }
        if let Some(lines) = &self.text {
            return Ok(vec![InfoChannel::new(
                channel_type,
                TextSource::new(lines.iter().cloned()).with_label("inline text"),
            )]);
        }
        Ok(vec![InfoChannel::new(
            channel_type,
            EnvironmentSource::capture(),
        )])
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, ChannelDefinitionError> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| ChannelDefinitionError::InvalidPattern {
        pattern: pattern.to_string(),
        source: e,
    })
}

fn resolve_pattern(
    channel_type: ChannelType,
    pattern: &str,
    workdir: &Path,
) -> Result<Vec<InfoChannel>, ChannelDefinitionError> {
    let regex = compile_pattern(pattern)?;

    let io_err = |e| ChannelDefinitionError::Io {
        path: workdir.to_string_lossy().to_string(),
        source: e,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(workdir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| regex.is_match(name));
        if matches {
            files.push(path);
        }
    }
    files.sort();

    debug!(
        pattern,
        matched = files.len(),
        "Resolved file-name pattern into channels."
    );
    Ok(files
        .into_iter()
        .map(|path| InfoChannel::new(channel_type, FileSource::new(path)))
        .collect())
}
