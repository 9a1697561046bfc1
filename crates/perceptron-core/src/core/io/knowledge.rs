use crate::core::channels::ChannelDefinition;
use crate::core::circumstance::{CircumstanceParseError, parse_circumstance};
use crate::core::situation::{
    Reaction, Situation, SituationBase, SituationBaseError, SituationError,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum KnowledgeLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("In '{path}', situation '{situation}': {source}")]
    Circumstance {
        path: String,
        situation: String,
        source: CircumstanceParseError,
    },
    #[error("In '{path}': {source}")]
    Situation {
        path: String,
        source: SituationError,
    },
    #[error("In '{path}': {source}")]
    Registration {
        path: String,
        source: SituationBaseError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KnowledgeFile {
    #[serde(default, rename = "situation")]
    situations: Vec<SituationRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct SituationRecord {
    #[serde(default)]
    ref_name: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    circumstances: Vec<String>,
    logical_expression: Option<String>,
    reaction: Option<Reaction>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChannelFile {
    #[serde(default, rename = "channel")]
    channels: Vec<ChannelDefinition>,
}

impl SituationRecord {
    fn into_situation(self, origin: &str) -> Result<Situation, KnowledgeLoadError> {
        let circumstances = self
            .circumstances
            .iter()
            .map(|line| parse_circumstance(line))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| KnowledgeLoadError::Circumstance {
                path: origin.to_string(),
                situation: self.ref_name.clone(),
                source: e,
            })?;

        let mut situation = Situation::new(self.ref_name)
            .with_kind(self.kind)
            .with_description(self.description)
            .with_circumstances(circumstances);
        if let Some(expr) = self.logical_expression.filter(|e| !e.trim().eq_ignore_ascii_case("none")) {
            situation = situation.with_logical_expression(expr);
        }
        situation.reaction = self.reaction;

        situation
            .validate()
            .map_err(|e| KnowledgeLoadError::Situation {
                path: origin.to_string(),
                source: e,
            })?;
        Ok(situation)
    }
}

/// Parses the `[[situation]]` tables of a knowledge-base document.
///
/// `origin` names the document in error messages.
pub fn situations_from_str(content: &str, origin: &str) -> Result<Vec<Situation>, KnowledgeLoadError> {
    let file: KnowledgeFile = toml::from_str(content).map_err(|e| KnowledgeLoadError::Toml {
        path: origin.to_string(),
        source: e,
    })?;
    file.situations
        .into_iter()
        .map(|record| record.into_situation(origin))
        .collect()
}

/// Loads situations from a TOML file, or from every `*.toml` file of a
/// directory in file-name order.
pub fn load_situations(path: &Path) -> Result<Vec<Situation>, KnowledgeLoadError> {
    let mut situations = Vec::new();
    for file in knowledge_files(path)? {
        let content = read(&file)?;
        let loaded = situations_from_str(&content, &file.to_string_lossy())?;
        debug!(file = %file.display(), count = loaded.len(), "Loaded situations.");
        situations.extend(loaded);
    }
    Ok(situations)
}

/// Loads a knowledge base into a new [`SituationBase`]. Fails as a whole on
/// the first invalid situation.
pub fn load_situation_base(path: &Path) -> Result<SituationBase, KnowledgeLoadError> {
    let mut base = SituationBase::new();
    for situation in load_situations(path)? {
        base.add_situation(situation)
            .map_err(|e| KnowledgeLoadError::Registration {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
    }
    info!(
        path = %path.display(),
        situations = base.situation_count(),
        "Knowledge base loaded."
    );
    Ok(base)
}

/// Parses the `[[channel]]` tables of a channel-definition document.
pub fn channel_definitions_from_str(
    content: &str,
    origin: &str,
) -> Result<Vec<ChannelDefinition>, KnowledgeLoadError> {
    let file: ChannelFile = toml::from_str(content).map_err(|e| KnowledgeLoadError::Toml {
        path: origin.to_string(),
        source: e,
    })?;
    Ok(file.channels)
}

pub fn load_channel_definitions(path: &Path) -> Result<Vec<ChannelDefinition>, KnowledgeLoadError> {
    let content = read(path)?;
    channel_definitions_from_str(&content, &path.to_string_lossy())
}

fn read(path: &Path) -> Result<String, KnowledgeLoadError> {
    std::fs::read_to_string(path).map_err(|e| KnowledgeLoadError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

fn knowledge_files(path: &Path) -> Result<Vec<PathBuf>, KnowledgeLoadError> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let io_err = |e| KnowledgeLoadError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(path).map_err(io_err)? {
        let file = entry.map_err(io_err)?.path();
        if file.is_file() && file.extension().is_some_and(|ext| ext == "toml") {
            files.push(file);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::channels::ChannelType;
    use crate::core::circumstance::{Circumstance, CountConstraint};
    use crate::core::situation::{ActionObject, ActionType, ExpressionError};
    use std::fs;

    const KNOWLEDGE: &str = r#"
[[situation]]
ref-name = "normal-termination"
type = "success"
description = "The job ended normally"
circumstances = ["OUTPUTFILE MATCHES .*Normal termination of Gaussian.*"]

[[situation]]
ref-name = "scf-not-converged"
type = "error"
circumstances = [
    "LOGFEED MATCHESCOUNT .*SCF.* 2 MIN",
    "OUTPUTFILE NOMATCH .*Normal termination.*",
]
logical-expression = "${v0 && v1}"

[situation.reaction]
action = "REDO"
object = "FOCUSJOB"
"#;

    #[test]
    fn parses_situations_with_circumstances_and_reaction() {
        let situations = situations_from_str(KNOWLEDGE, "inline").unwrap();
        assert_eq!(situations.len(), 2);

        let first = &situations[0];
        assert_eq!(first.ref_name, "normal-termination");
        assert_eq!(first.kind, "success");
        assert_eq!(first.description, "The job ended normally");
        assert_eq!(
            first.circumstances,
            vec![Circumstance::matches(
                ChannelType::OutputFile,
                ".*Normal termination of Gaussian.*"
            )]
        );
        assert_eq!(first.logical_expression, None);
        assert_eq!(first.reaction, None);

        let second = &situations[1];
        assert_eq!(
            second.circumstances[0],
            Circumstance::count_matches(ChannelType::LogFeed, ".*SCF.*", CountConstraint::Min(2), false)
        );
        assert_eq!(second.logical_expression.as_deref(), Some("${v0 && v1}"));
        assert_eq!(
            second.reaction,
            Some(Reaction::new(ActionType::Redo, ActionObject::FocusJob))
        );
    }

    #[test]
    fn none_expression_means_default() {
        let toml = "[[situation]]\nref-name = \"a\"\ncircumstances = [\"LOGFEED MATCHES x\"]\nlogical-expression = \"none\"\n";
        let situations = situations_from_str(toml, "inline").unwrap();
        assert_eq!(situations[0].logical_expression, None);
    }

    #[test]
    fn bad_circumstance_names_situation_and_line() {
        let toml = "[[situation]]\nref-name = \"a\"\ncircumstances = [\"LOGFEED CONTAINS x\"]\n";
        let err = situations_from_str(toml, "kb.toml").unwrap_err();
        match err {
            KnowledgeLoadError::Circumstance { path, situation, source } => {
                assert_eq!(path, "kb.toml");
                assert_eq!(situation, "a");
                assert_eq!(source.line, "LOGFEED CONTAINS x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_expression_is_rejected_at_load_time() {
        let toml = "[[situation]]\nref-name = \"a\"\ncircumstances = [\"LOGFEED MATCHES x\"]\nlogical-expression = \"v0 && v1\"\n";
        let err = situations_from_str(toml, "kb.toml").unwrap_err();
        assert!(matches!(
            err,
            KnowledgeLoadError::Situation { source: SituationError { source: ExpressionError::UnknownVariable { .. }, .. }, .. }
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml = "[[situation]]\nref-name = \"a\"\nseverity = 3\n";
        assert!(matches!(
            situations_from_str(toml, "kb.toml"),
            Err(KnowledgeLoadError::Toml { .. })
        ));
    }

    #[test]
    fn directory_is_loaded_in_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("b.toml"),
            "[[situation]]\nref-name = \"from-b\"\ncircumstances = [\"LOGFEED MATCHES b\"]\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("a.toml"),
            "[[situation]]\nref-name = \"from-a\"\ncircumstances = [\"LOGFEED MATCHES a\"]\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not a knowledge file").unwrap();

        let base = load_situation_base(dir.path()).unwrap();
        let names: Vec<_> = base.situations().iter().map(|s| s.ref_name.as_str()).collect();
        assert_eq!(names, vec!["from-a", "from-b"]);
    }

    #[test]
    fn duplicated_names_fail_the_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        let body = "[[situation]]\nref-name = \"same\"\ncircumstances = [\"LOGFEED MATCHES x\"]\n";
        fs::write(dir.path().join("a.toml"), body).unwrap();
        fs::write(dir.path().join("b.toml"), body).unwrap();
        assert!(matches!(
            load_situation_base(dir.path()),
            Err(KnowledgeLoadError::Registration { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_situations(&dir.path().join("absent.toml")),
            Err(KnowledgeLoadError::Io { .. })
        ));
    }

    #[test]
    fn channel_file_lists_definitions() {
        let toml = r#"
[[channel]]
type = "OUTPUTFILE"
path = "job.out"

[[channel]]
type = "LOGFEED"
pattern = ".*\\.log"

[[channel]]
type = "ENVIRONMENT"
environment = true
"#;
        let defs = channel_definitions_from_str(toml, "channels.toml").unwrap();
        assert_eq!(defs.len(), 3);
        assert_eq!(defs[0], ChannelDefinition::file(ChannelType::OutputFile, "job.out"));
        assert_eq!(defs[1], ChannelDefinition::pattern(ChannelType::LogFeed, r".*\.log"));
        assert_eq!(defs[2], ChannelDefinition::environment(ChannelType::Environment));
    }
}
