use crate::cli::PerceiveArgs;
use crate::config::PartialPerceiveConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use perceptron::engine::progress::ProgressReporter;
use perceptron::engine::state::Outcome;
use perceptron::workflows::perceive::{self, PerceptionReport};
use std::fmt::Write as _;
use tracing::{info, warn};

pub fn run(args: PerceiveArgs, quiet: bool) -> Result<Outcome> {
    let partial_config = PartialPerceiveConfig::load(&args)?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    if config.channels.is_empty() {
        warn!("No channels defined; only circumstances on absent channels can be satisfied.");
    }

    let reporter = if args.no_progress || quiet {
        ProgressReporter::new()
    } else {
        ProgressReporter::with_callback(CliProgressHandler::new().get_callback())
    };

    info!(
        knowledge_base = %config.knowledge_base.display(),
        workdir = %config.workdir.display(),
        "Invoking the perception workflow..."
    );
    let report = perceive::run_from_files(
        &config.knowledge_base,
        &config.channels,
        &config.workdir,
        &config.perception,
        reporter,
    )?;

    print!("{}", render_report(&report, args.scores));
    Ok(report.outcome)
}

fn render_report(report: &PerceptionReport, show_scores: bool) -> String {
    let mut out = String::new();
    match report.outcome {
        Outcome::Aware => {
            let _ = writeln!(out, "✓ Situation perceived.");
        }
        Outcome::Unknown => {
            let _ = writeln!(out, "No known situation perceived.");
        }
        Outcome::Ambiguous => {
            let _ = writeln!(
                out,
                "Ambiguous: {} situations occur at once.",
                report.occurring.len()
            );
        }
    }
    for situation in &report.occurring {
        let _ = write!(out, "  {}", situation);
        if !situation.description.is_empty() {
            let _ = write!(out, ": {}", situation.description);
        }
        let _ = writeln!(out);
    }
    if let Some(reaction) = report.reaction() {
        let _ = writeln!(out, "Reaction: {}", reaction);
    }
    if show_scores && !report.scores.is_empty() {
        let _ = writeln!(out, "\nScores:\n{}", report.scores);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use perceptron::core::channels::ChannelType;
    use perceptron::core::circumstance::Circumstance;
    use perceptron::core::situation::{ActionObject, ActionType, Reaction, Situation};
    use perceptron::engine::scores::{ScPair, ScoreCollector};

    fn report(outcome: Outcome, occurring: Vec<Situation>) -> PerceptionReport {
        PerceptionReport {
            outcome,
            occurring,
            channel_count: 1,
            scores: ScoreCollector::new(),
        }
    }

    #[test]
    fn aware_report_names_situation_and_reaction() {
        let situation = Situation::new("scf-failure")
            .with_kind("error")
            .with_description("SCF did not converge")
            .with_reaction(Reaction::new(ActionType::Redo, ActionObject::FocusJob));
        let text = render_report(&report(Outcome::Aware, vec![situation]), false);

        assert!(text.starts_with("✓ Situation perceived."));
        assert!(text.contains("scf-failure [error]: SCF did not converge"));
        assert!(text.contains("Reaction: REDO FOCUSJOB"));
    }

    #[test]
    fn ambiguous_report_lists_every_situation() {
        let text = render_report(
            &report(
                Outcome::Ambiguous,
                vec![Situation::new("a"), Situation::new("b")],
            ),
            false,
        );
        assert!(text.contains("Ambiguous: 2 situations"));
        assert!(text.contains("  a"));
        assert!(text.contains("  b"));
        assert!(!text.contains("Reaction"));
    }

    #[test]
    fn scores_are_printed_on_request() {
        let circumstance = Circumstance::matches(ChannelType::LogFeed, ".*Error.*");
        let situation = Situation::new("err").with_circumstance(circumstance.clone());
        let mut unknown = report(Outcome::Unknown, Vec::new());
        unknown
            .scores
            .add_score(ScPair::new(&situation, &circumstance), 0.0);

        let without = render_report(&unknown, false);
        assert!(without.starts_with("No known situation perceived."));
        assert!(!without.contains("Scores:"));

        let with = render_report(&unknown, true);
        assert!(with.contains("Scores:"));
        assert!(with.contains("LOGFEED MATCHES .*Error.*"));
    }
}
