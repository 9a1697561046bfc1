use crate::cli::PerceiveArgs;
use crate::error::{CliError, Result};
use perceptron::core::channels::{ChannelDefinition, ChannelType};
use perceptron::engine::config::{PerceptionConfig, PerceptionConfigBuilder};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fully merged settings of a `perceive` invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub knowledge_base: PathBuf,
    pub workdir: PathBuf,
    pub channels: Vec<ChannelDefinition>,
    pub perception: PerceptionConfig,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialPerceiveConfig {
    #[serde(rename = "knowledge-base")]
    knowledge_base: Option<PathBuf>,
    workdir: Option<PathBuf>,
    #[serde(default, rename = "channel")]
    channels: Vec<ChannelDefinition>,
    #[serde(default)]
    counters: BTreeMap<String, i64>,
}

impl PartialPerceiveConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads the config file named by `args`, or starts from an empty one.
    pub fn load(args: &PerceiveArgs) -> Result<Self> {
        match &args.config {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Combines the file values with the command line. Command-line channels
    /// are appended to the file's channels; scalar values from the command
    /// line take precedence.
    pub fn merge_with_cli(mut self, args: &PerceiveArgs) -> Result<AppConfig> {
        self.apply_set_values(&args.set_values)?;

        let knowledge_base = args
            .knowledge_base
            .clone()
            .or(self.knowledge_base)
            .ok_or_else(|| {
                CliError::Config(
                    "A value for 'knowledge-base' is required either in the config file or via CLI argument."
                        .to_string(),
                )
            })?;
        let workdir = args
            .workdir
            .clone()
            .or(self.workdir)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut channels = self.channels;
        for spec in &args.channels {
            let (channel_type, path) = parse_typed_pair(spec, "--channel")?;
            channels.push(ChannelDefinition::file(channel_type, path));
        }
        for spec in &args.channel_patterns {
            let (channel_type, pattern) = parse_typed_pair(spec, "--channel-pattern")?;
            channels.push(ChannelDefinition::pattern(channel_type, pattern));
        }
        if args.environment {
            channels.push(ChannelDefinition::environment(ChannelType::Environment));
        }

        let mut counters = self.counters;
        for spec in &args.counters {
            let (id, value) = split_key_value(spec, "--counter")?;
            counters.insert(id.to_string(), parse_counter_value(id, value)?);
        }

        let perception = PerceptionConfigBuilder::new()
            .counters(counters)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(AppConfig {
            knowledge_base,
            workdir,
            channels,
            perception,
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = split_key_value(kv_pair, "--set")?;

            match key {
                "knowledge-base" => self.knowledge_base = Some(PathBuf::from(value_str)),
                "workdir" => self.workdir = Some(PathBuf::from(value_str)),
                _ => match key.strip_prefix("counters.") {
                    Some(id) if !id.is_empty() => {
                        self.counters
                            .insert(id.to_string(), parse_counter_value(key, value_str)?);
                    }
                    _ => {
                        return Err(CliError::Config(format!(
                            "Unsupported configuration key for --set: '{}'",
                            key
                        )));
                    }
                },
            }
        }
        Ok(())
    }
}

fn split_key_value<'s>(spec: &'s str, flag: &str) -> Result<(&'s str, &'s str)> {
    spec.split_once('=')
        .map(|(key, value)| (key.trim(), value.trim()))
        .ok_or_else(|| {
            CliError::Config(format!(
                "Invalid {} format: '{}'. Expected KEY=VALUE.",
                flag, spec
            ))
        })
}

fn parse_typed_pair<'s>(spec: &'s str, flag: &str) -> Result<(ChannelType, &'s str)> {
    let (type_str, value) = split_key_value(spec, flag)?;
    let channel_type = type_str
        .parse::<ChannelType>()
        .map_err(|e| CliError::Argument(format!("{} '{}': {}", flag, spec, e)))?;
    if value.is_empty() {
        return Err(CliError::Argument(format!(
            "{} '{}' has an empty value",
            flag, spec
        )));
    }
    Ok((channel_type, value))
}

fn parse_counter_value(key: &str, value_str: &str) -> Result<i64> {
    value_str.parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid integer value for {}: {}",
            key, value_str
        ))
    })
}
