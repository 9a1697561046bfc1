use crate::core::channels::{ChannelDefinition, ChannelDefinitionError, InfoChannelBase};
use crate::core::io::knowledge::{self, KnowledgeLoadError};
use crate::core::situation::{Reaction, Situation, SituationBase};
use crate::engine::config::PerceptionConfig;
use crate::engine::error::PerceptionError;
use crate::engine::perceptron::Perceptron;
use crate::engine::progress::ProgressReporter;
use crate::engine::scores::ScoreCollector;
use crate::engine::state::Outcome;
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Knowledge(#[from] KnowledgeLoadError),
    #[error(transparent)]
    Channel(#[from] ChannelDefinitionError),
    #[error(transparent)]
    Perception(#[from] PerceptionError),
}

/// Summary of one perception cycle.
#[derive(Debug, Clone)]
pub struct PerceptionReport {
    pub outcome: Outcome,
    pub occurring: Vec<Situation>,
    pub channel_count: usize,
    pub scores: ScoreCollector,
}

impl PerceptionReport {
    pub fn is_aware(&self) -> bool {
        self.outcome.is_aware()
    }

    /// The perceived situation, when exactly one occurs.
    pub fn perceived(&self) -> Option<&Situation> {
        match self.outcome {
            Outcome::Aware => self.occurring.first(),
            _ => None,
        }
    }

    /// The reaction attached to the perceived situation, if any.
    pub fn reaction(&self) -> Option<Reaction> {
        self.perceived().and_then(|s| s.reaction)
    }
}

/// Resolves channel definitions against `workdir` into a channel base.
pub fn resolve_channels(
    definitions: &[ChannelDefinition],
    workdir: &Path,
) -> Result<InfoChannelBase, ChannelDefinitionError> {
    let mut channels = InfoChannelBase::new();
    for definition in definitions {
        channels.extend(definition.resolve(workdir)?);
    }
    Ok(channels)
}

/// Runs one perception cycle over already-built bases.
#[instrument(skip_all, name = "perception_workflow")]
pub fn run(
    situations: &SituationBase,
    channels: &InfoChannelBase,
    config: &PerceptionConfig,
    reporter: ProgressReporter<'_>,
) -> Result<PerceptionReport, PerceptionError> {
    let mut perceptron = Perceptron::new(situations, channels)
        .with_config(config.clone())
        .with_reporter(reporter);
    let outcome = perceptron.perceive()?;

    Ok(PerceptionReport {
        outcome,
        occurring: perceptron.occurring_situations(),
        channel_count: channels.channel_count(),
        scores: perceptron.scores().clone(),
    })
}

/// Loads the knowledge base at `knowledge_path`, resolves `definitions`
/// against `workdir`, and runs one perception cycle.
#[instrument(skip_all, name = "perception_from_files")]
pub fn run_from_files(
    knowledge_path: &Path,
    definitions: &[ChannelDefinition],
    workdir: &Path,
    config: &PerceptionConfig,
    reporter: ProgressReporter<'_>,
) -> Result<PerceptionReport, WorkflowError> {
    let situations = knowledge::load_situation_base(knowledge_path)?;
    let channels = resolve_channels(definitions, workdir)?;
    info!(
        situations = situations.situation_count(),
        channels = channels.channel_count(),
        "Resources prepared."
    );
    Ok(run(&situations, &channels, config, reporter)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::channels::ChannelType;
    use crate::core::situation::{ActionObject, ActionType};
    use crate::engine::config::PerceptionConfigBuilder;
    use std::fs;

    const KNOWLEDGE: &str = r#"
[[situation]]
ref-name = "normal-termination"
type = "success"
circumstances = [
    "OUTPUTFILE MATCHES .*Normal termination.*",
    "LOGFEED NOMATCH .*Error.*",
]

[[situation]]
ref-name = "scf-failure"
type = "error"
circumstances = [
    "LOGFEED MATCHESCOUNT .*SCF failed.* 1 MIN",
    "JOBDETAILS LOOPCOUNTER attempts < 3",
]

[situation.reaction]
action = "REDO"
object = "FOCUSJOB"
"#;

    fn workdir_with(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("kb.toml"), KNOWLEDGE).unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn definitions() -> Vec<ChannelDefinition> {
        vec![
            ChannelDefinition::pattern(ChannelType::OutputFile, r".*\.out"),
            ChannelDefinition::pattern(ChannelType::LogFeed, r".*\.log"),
        ]
    }

    fn config(attempts: i64) -> PerceptionConfig {
        PerceptionConfigBuilder::new()
            .counter("attempts", attempts)
            .build()
            .unwrap()
    }

    #[test]
    fn perceives_normal_termination_from_files() {
        let dir = workdir_with(&[
            ("job.out", "...\n Normal termination of Gaussian 16\n"),
            ("job.log", "all fine\n"),
        ]);
        let report = run_from_files(
            &dir.path().join("kb.toml"),
            &definitions(),
            dir.path(),
            &config(0),
            ProgressReporter::new(),
        )
        .unwrap();

        assert!(report.is_aware());
        assert_eq!(report.channel_count, 2);
        assert_eq!(report.perceived().map(|s| s.ref_name.as_str()), Some("normal-termination"));
        assert_eq!(report.reaction(), None);
    }

    #[test]
    fn perceived_situation_carries_its_reaction() {
        let dir = workdir_with(&[
            ("job.out", "truncated\n"),
            ("job.log", "SCF failed to converge\nError termination\n"),
        ]);
        let report = run_from_files(
            &dir.path().join("kb.toml"),
            &definitions(),
            dir.path(),
            &config(1),
            ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.outcome, Outcome::Aware);
        assert_eq!(
            report.reaction(),
            Some(Reaction::new(ActionType::Redo, ActionObject::FocusJob))
        );
    }

    #[test]
    fn exhausted_counter_leaves_perceptron_unaware() {
        let dir = workdir_with(&[("job.log", "SCF failed\n")]);
        let report = run_from_files(
            &dir.path().join("kb.toml"),
            &definitions(),
            dir.path(),
            &config(5),
            ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.outcome, Outcome::Unknown);
        assert!(report.perceived().is_none());
        assert!(!report.scores.is_empty());
    }

    #[test]
    fn missing_knowledge_base_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_from_files(
            &dir.path().join("absent.toml"),
            &[],
            dir.path(),
            &PerceptionConfig::default(),
            ProgressReporter::new(),
        );
        assert!(matches!(result, Err(WorkflowError::Knowledge(_))));
    }
}
