use super::error::PerceptionError;
use super::progress::{Progress, ProgressReporter};
use super::scores::{ScPair, ScoreCollector};
use crate::core::channels::{ChannelType, InfoChannel, InfoChannelBase};
use crate::core::circumstance::Circumstance;
use crate::core::io::text::{LineMatchError, LineMatcher};
use crate::core::situation::Situation;
use std::collections::HashMap;
use tracing::{debug, trace};

/// A (situation, circumstance) pair waiting for the result of a text query.
#[derive(Debug, Clone)]
pub struct QuerySource<'a> {
    pub pair: ScPair,
    pub circumstance: &'a Circumstance,
}

/// A text pattern shared by every pair that needs it.
#[derive(Debug, Clone)]
pub struct TxtQuery<'a> {
    pub pattern: &'a str,
    pub sources: Vec<QuerySource<'a>>,
}

impl<'a> TxtQuery<'a> {
    fn new(pattern: &'a str) -> Self {
        Self {
            pattern,
            sources: Vec::new(),
        }
    }

    /// Adds a requesting pair unless an equal pair is already registered.
    pub fn add_source(&mut self, pair: ScPair, circumstance: &'a Circumstance) -> bool {
        if self.sources.iter().any(|s| s.pair == pair) {
            return false;
        }
        self.sources.push(QuerySource { pair, circumstance });
        true
    }
}

/// Collects the text queries that channels of `channel_type` must answer.
///
/// Every text circumstance compatible with `channel_type` contributes its
/// pattern; identical patterns are merged into one query, in first-seen order.
pub fn build_queries<'a>(situations: &[&'a Situation], channel_type: ChannelType) -> Vec<TxtQuery<'a>> {
    let mut queries: Vec<TxtQuery<'a>> = Vec::new();
    let mut by_pattern: HashMap<&'a str, usize> = HashMap::new();

    for &situation in situations {
        for circumstance in &situation.circumstances {
            let Some(pattern) = circumstance.text_pattern() else {
                continue;
            };
            if !channel_type.is_compatible_with(circumstance.channel_type()) {
                continue;
            }
            let index = *by_pattern.entry(pattern).or_insert_with(|| {
                queries.push(TxtQuery::new(pattern));
                queries.len() - 1
            });
            queries[index].add_source(ScPair::new(situation, circumstance), circumstance);
        }
    }
    queries
}

/// The text queries of one channel type together with their compiled matcher.
#[derive(Debug)]
pub struct QueryBatch<'a> {
    channel_type: ChannelType,
    queries: Vec<TxtQuery<'a>>,
    matcher: LineMatcher,
}

impl<'a> QueryBatch<'a> {
    pub fn new(channel_type: ChannelType, situations: &[&'a Situation]) -> Result<Self, PerceptionError> {
        let queries = build_queries(situations, channel_type);
        let matcher = LineMatcher::new(queries.iter().map(|q| q.pattern)).map_err(|e| match e {
            LineMatchError::InvalidPattern { pattern, source } => {
                PerceptionError::InvalidPattern { pattern, source }
            }
            LineMatchError::Io(source) => PerceptionError::ChannelRead {
                channel: channel_type.to_string(),
                source,
            },
        })?;
        Ok(Self {
            channel_type,
            queries,
            matcher,
        })
    }

    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    pub fn queries(&self) -> &[TxtQuery<'a>] {
        &self.queries
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Scans every channel of the batch's type once and records the score of
    /// every requesting pair. Scores accumulate across channel instances.
    ///
    /// Returns the number of channels read.
    pub fn evaluate(
        &self,
        channels: &InfoChannelBase,
        collector: &mut ScoreCollector,
        reporter: &ProgressReporter,
    ) -> Result<usize, PerceptionError> {
        let mut read = 0;
        for channel in channels.channels_of_type(self.channel_type) {
            let matches = self.scan(channel)?;
            read += 1;
            for (query, found) in self.queries.iter().zip(&matches) {
                for source in &query.sources {
                    if let Some(score) = source.circumstance.score_text(found) {
                        collector.add_score(source.pair.clone(), score);
                    }
                }
            }
            reporter.report(Progress::ChannelScanned {
                locator: channel.locator(),
            });
        }
        Ok(read)
    }

    fn scan(&self, channel: &InfoChannel) -> Result<Vec<Vec<String>>, PerceptionError> {
        let read_err = |source| PerceptionError::ChannelRead {
            channel: channel.to_string(),
            source,
        };
        let reader = channel.open().map_err(read_err)?;
        let matches = self.matcher.scan(reader).map_err(read_err)?;
        debug!(
            channel = %channel,
            queries = self.queries.len(),
            matched = matches.iter().filter(|m| !m.is_empty()).count(),
            "Scanned channel."
        );
        for (query, found) in self.queries.iter().zip(&matches) {
            trace!(pattern = query.pattern, lines = found.len(), "Query result.");
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::channels::TextSource;

    fn log_situation(name: &str, pattern: &str) -> Situation {
        Situation::new(name).with_circumstance(Circumstance::matches(ChannelType::LogFeed, pattern))
    }

    #[test]
    fn identical_patterns_are_merged_into_one_query() {
        let a = log_situation("a", ".*done.*");
        let b = log_situation("b", ".*done.*");
        let c = log_situation("c", ".*failed.*");
        let queries = build_queries(&[&a, &b, &c], ChannelType::LogFeed);

        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].pattern, ".*done.*");
        assert_eq!(queries[0].sources.len(), 2);
        assert_eq!(queries[1].pattern, ".*failed.*");
    }

    #[test]
    fn same_pattern_with_different_circumstance_kinds_shares_a_query() {
        let s = Situation::new("s")
            .with_circumstance(Circumstance::matches(ChannelType::LogFeed, "x"))
            .with_circumstance(Circumstance::no_match(ChannelType::LogFeed, "x"));
        let queries = build_queries(&[&s], ChannelType::LogFeed);
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].sources.len(), 2);
    }

    #[test]
    fn repeated_pairs_are_registered_once() {
        let s = Situation::new("s")
            .with_circumstance(Circumstance::matches(ChannelType::LogFeed, "x"))
            .with_circumstance(Circumstance::matches(ChannelType::LogFeed, "x"));
        let queries = build_queries(&[&s], ChannelType::LogFeed);
        assert_eq!(queries[0].sources.len(), 1);
    }

    #[test]
    fn incompatible_and_non_text_circumstances_are_skipped() {
        let s = Situation::new("s")
            .with_circumstance(Circumstance::matches(ChannelType::OutputFile, "out"))
            .with_circumstance(Circumstance::matches(ChannelType::Any, "any"))
            .with_circumstance(Circumstance::loop_counter(ChannelType::LogFeed, "n", 0, 1));
        let queries = build_queries(&[&s], ChannelType::LogFeed);
        let patterns: Vec<_> = queries.iter().map(|q| q.pattern).collect();
        assert_eq!(patterns, vec!["any"]);
    }

    #[test]
    fn batch_scores_accumulate_across_channels() {
        let s = log_situation("s", ".*here.*");
        let mut channels = InfoChannelBase::new();
        channels.add_channel(InfoChannel::new(ChannelType::LogFeed, TextSource::new(["here"])));
        channels.add_channel(InfoChannel::new(ChannelType::LogFeed, TextSource::new(["also here"])));
        channels.add_channel(InfoChannel::new(ChannelType::LogFeed, TextSource::new(["nothing"])));

        let batch = QueryBatch::new(ChannelType::LogFeed, &[&s]).unwrap();
        let mut collector = ScoreCollector::new();
        let read = batch
            .evaluate(&channels, &mut collector, &ProgressReporter::new())
            .unwrap();

        assert_eq!(read, 3);
        assert_eq!(
            collector.score(&ScPair::new(&s, &s.circumstances[0])),
            Some(2.0)
        );
    }

    #[test]
    fn invalid_pattern_fails_the_batch() {
        let s = log_situation("s", "(oops");
        assert!(matches!(
            QueryBatch::new(ChannelType::LogFeed, &[&s]),
            Err(PerceptionError::InvalidPattern { pattern, .. }) if pattern == "(oops"
        ));
    }
}
