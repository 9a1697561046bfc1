use crate::core::circumstance::Circumstance;
use crate::core::situation::Situation;
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

/// Value-equality key of a (situation, circumstance) pair.
///
/// Holds the identifying values of both members, so that two pairs made of
/// equal values compare equal regardless of where the values live, and pairs
/// made of different values never do.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ScPair {
    situation: String,
    logical_expression: Option<String>,
    circumstances: Vec<Circumstance>,
    circumstance: Circumstance,
}

impl ScPair {
    pub fn new(situation: &Situation, circumstance: &Circumstance) -> Self {
        Self {
            situation: situation.ref_name.clone(),
            logical_expression: situation.logical_expression.clone(),
            circumstances: situation.circumstances.clone(),
            circumstance: circumstance.clone(),
        }
    }

    /// Reference name of the situation.
    pub fn situation(&self) -> &str {
        &self.situation
    }

    pub fn circumstance(&self) -> &Circumstance {
        &self.circumstance
    }
}

impl fmt::Display for ScPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] <- [{}]", self.situation, self.circumstance)
    }
}

/// Accumulated satisfaction scores, keyed by [`ScPair`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreCollector {
    scores: BTreeMap<ScPair, f64>,
}

impl ScoreCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `score` to the entry of `pair`, creating it if needed.
    pub fn add_score(&mut self, pair: ScPair, score: f64) {
        *self.scores.entry(pair).or_insert(0.0) += score;
    }

    pub fn score(&self, pair: &ScPair) -> Option<f64> {
        self.scores.get(pair).copied()
    }

    pub fn contains(&self, pair: &ScPair) -> bool {
        self.scores.contains_key(pair)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn clear(&mut self) {
        self.scores.clear();
    }

    pub fn iter(&self) -> btree_map::Iter<'_, ScPair, f64> {
        self.scores.iter()
    }

    /// Satisfaction flags of the circumstances of `situation`, in order.
    ///
    /// Returns `None` if any circumstance has no recorded score.
    pub fn fingerprint(&self, situation: &Situation) -> Option<Vec<bool>> {
        situation
            .circumstances
            .iter()
            .map(|c| {
                self.score(&ScPair::new(situation, c))
                    .map(|score| c.score_to_decision(score))
            })
            .collect()
    }
}

impl fmt::Display for ScoreCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.scores
                .iter()
                .map(|(pair, score)| format!("{:>6.2}  {}", score, pair))
                .join("\n")
        )
    }
}

impl<'a> IntoIterator for &'a ScoreCollector {
    type Item = (&'a ScPair, &'a f64);
    type IntoIter = btree_map::Iter<'a, ScPair, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.scores.iter()
    }
}
