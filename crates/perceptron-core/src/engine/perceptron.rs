use super::config::PerceptionConfig;
use super::error::PerceptionError;
use super::progress::{Progress, ProgressReporter};
use super::query::QueryBatch;
use super::scores::{ScPair, ScoreCollector};
use super::state::{Outcome, PerceptionStage};
use crate::core::channels::InfoChannelBase;
use crate::core::circumstance::Circumstance;
use crate::core::situation::{Situation, SituationBase};
use tracing::{debug, info, instrument, warn};

/// Decides which known situations occur, given the available channels.
///
/// The perceptron borrows the situation base and the channel base for its
/// whole lifetime; neither can change while a cycle runs.
pub struct Perceptron<'a> {
    situations: &'a SituationBase,
    channels: &'a InfoChannelBase,
    config: PerceptionConfig,
    reporter: ProgressReporter<'a>,
    collector: ScoreCollector,
    occurring: Vec<&'a Situation>,
    outcome: Option<Outcome>,
    stage: PerceptionStage,
}

impl<'a> Perceptron<'a> {
    pub fn new(situations: &'a SituationBase, channels: &'a InfoChannelBase) -> Self {
        Self {
            situations,
            channels,
            config: PerceptionConfig::default(),
            reporter: ProgressReporter::new(),
            collector: ScoreCollector::new(),
            occurring: Vec::new(),
            outcome: None,
            stage: PerceptionStage::Idle,
        }
    }

    pub fn with_config(mut self, config: PerceptionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_reporter(mut self, reporter: ProgressReporter<'a>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Runs a full perception cycle.
    ///
    /// Each call starts from an empty score collector. On error the perceptron
    /// returns to [`PerceptionStage::Idle`] with no occurring situations; the
    /// scores recorded before the failure remain available for inspection.
    #[instrument(skip_all, name = "perception_cycle")]
    pub fn perceive(&mut self) -> Result<Outcome, PerceptionError> {
        self.collector.clear();
        self.occurring.clear();
        self.outcome = None;
        self.stage = PerceptionStage::Idle;

        match self.run_cycle() {
            Ok(occurring) => {
                let outcome = Outcome::from_count(occurring.len());
                info!(
                    outcome = %outcome,
                    occurring = occurring.len(),
                    "Perception cycle completed."
                );
                self.occurring = occurring;
                self.outcome = Some(outcome);
                self.stage = PerceptionStage::Done;
                Ok(outcome)
            }
            Err(e) => {
                self.stage = PerceptionStage::Idle;
                Err(e)
            }
        }
    }

    fn run_cycle(&mut self) -> Result<Vec<&'a Situation>, PerceptionError> {
        let situations = self.situations;
        let relevant = situations.relevant_situations(self.channels);
        info!(
            relevant = relevant.len(),
            channels = self.channels.channel_count(),
            "Starting perception cycle."
        );
        if relevant.is_empty() {
            self.reporter.report(Progress::Message(
                "No situation is relevant to the available channels.".to_string(),
            ));
        }

        self.reporter.report(Progress::PhaseStart {
            name: "Scanning channels",
        });
        self.evaluate_text_batches(&relevant)?;
        self.score_absent_channels(&relevant);
        self.reporter.report(Progress::PhaseFinish);
        self.stage = PerceptionStage::TextBatchEvaluated;

        self.evaluate_non_text(&relevant)?;
        self.stage = PerceptionStage::CircumstancesEvaluated;

        self.reporter.report(Progress::PhaseStart {
            name: "Evaluating situations",
        });
        let occurring = self.evaluate_situations(&relevant)?;
        self.reporter.report(Progress::PhaseFinish);
        self.stage = PerceptionStage::SituationsEvaluated;

        Ok(occurring)
    }

    fn evaluate_text_batches(&mut self, relevant: &[&'a Situation]) -> Result<(), PerceptionError> {
        self.reporter.report(Progress::ScanStart {
            total_channels: self.channels.channel_count() as u64,
        });
        for channel_type in self.channels.channel_types() {
            let batch = QueryBatch::new(channel_type, relevant)?;
            if batch.is_empty() {
                debug!(%channel_type, "No text queries for channel type.");
                continue;
            }
            let read = batch.evaluate(self.channels, &mut self.collector, &self.reporter)?;
            debug!(
                %channel_type,
                queries = batch.queries().len(),
                channels = read,
                "Evaluated text batch."
            );
        }
        self.reporter.report(Progress::ScanFinish);
        Ok(())
    }

    /// Scores the text circumstances that no channel could answer as if their
    /// channel had been empty.
    fn score_absent_channels(&mut self, relevant: &[&'a Situation]) {
        for &situation in relevant {
            for circumstance in &situation.circumstances {
                let pair = ScPair::new(situation, circumstance);
                if self.collector.contains(&pair) {
                    continue;
                }
                if let Some(score) = circumstance.score_text(&[]) {
                    debug!(
                        situation = %situation.ref_name,
                        circumstance = %circumstance,
                        score,
                        "Scored circumstance without channel."
                    );
                    self.collector.add_score(pair, score);
                }
            }
        }
    }

    fn evaluate_non_text(&mut self, relevant: &[&'a Situation]) -> Result<(), PerceptionError> {
        for &situation in relevant {
            for circumstance in situation
                .circumstances
                .iter()
                .filter(|c| !c.requires_text_match())
            {
                let score = self.score_non_text(situation, circumstance)?;
                self.collector
                    .add_score(ScPair::new(situation, circumstance), score);
            }
        }
        Ok(())
    }

    fn score_non_text(
        &self,
        situation: &Situation,
        circumstance: &Circumstance,
    ) -> Result<f64, PerceptionError> {
        let unevaluable = |reason: String| PerceptionError::UnevaluableCircumstance {
            situation: situation.ref_name.clone(),
            circumstance: circumstance.to_string(),
            reason,
        };
        match circumstance {
            Circumstance::LoopCounter { counter_id, .. } => {
                let value = self
                    .config
                    .counter(counter_id)
                    .ok_or_else(|| unevaluable(format!("no value for counter '{}'", counter_id)))?;
                circumstance
                    .score_counter(value)
                    .ok_or_else(|| unevaluable("counter scoring unavailable".to_string()))
            }
            other => Err(unevaluable(format!(
                "no evaluation path for {} circumstances",
                other.kind()
            ))),
        }
    }

    fn evaluate_situations(
        &self,
        relevant: &[&'a Situation],
    ) -> Result<Vec<&'a Situation>, PerceptionError> {
        let mut occurring = Vec::new();
        for &situation in relevant {
            let Some(fingerprint) = self.collector.fingerprint(situation) else {
                warn!(
                    situation = %situation.ref_name,
                    "Incomplete fingerprint; situation excluded from perception."
                );
                continue;
            };
            let occurs = situation
                .is_occurring(&fingerprint)
                .map_err(|e| PerceptionError::Evaluation {
                    situation: situation.ref_name.clone(),
                    source: e,
                })?;
            debug!(situation = %situation.ref_name, ?fingerprint, occurs, "Evaluated situation.");
            if occurs {
                occurring.push(situation);
            }
        }
        Ok(occurring)
    }

    /// `true` only when exactly one situation was perceived.
    pub fn is_aware(&self) -> bool {
        self.outcome.is_some_and(Outcome::is_aware)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn stage(&self) -> PerceptionStage {
        self.stage
    }

    pub fn occurring_situations(&self) -> Vec<Situation> {
        self.occurring.iter().map(|&s| s.clone()).collect()
    }

    pub fn occurring_count(&self) -> usize {
        self.occurring.len()
    }

    pub fn scores(&self) -> &ScoreCollector {
        &self.collector
    }

    pub fn scores_to_string(&self) -> String {
        self.collector.to_string()
    }

    /// Logs every recorded score at `INFO` level.
    pub fn print_scores(&self) {
        for (pair, score) in &self.collector {
            info!(score, pair = %pair, "Score.");
        }
    }
}
