//! Situations: named concepts recognised from a combination of circumstances.

pub mod base;
pub mod expression;
pub mod reaction;

use crate::core::channels::ChannelType;
use crate::core::circumstance::Circumstance;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

pub use base::{SituationBase, SituationBaseError};
pub use expression::{ExpressionError, LogicalExpression};
pub use reaction::{ActionObject, ActionType, Reaction};

#[derive(Debug, Error)]
#[error("Situation '{situation}' is invalid: {source}")]
pub struct SituationError {
    pub situation: String,
    #[source]
    pub source: ExpressionError,
}

/// A named concept characterised by an ordered list of circumstances.
///
/// The satisfaction flags of the circumstances, in declaration order, form the
/// situation's *fingerprint*. The situation occurs when its logical expression
/// evaluates to `true` over that fingerprint; without an expression all
/// circumstances must be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Situation {
    pub ref_name: String,
    pub kind: String,
    pub description: String,
    pub circumstances: Vec<Circumstance>,
    pub logical_expression: Option<String>,
    pub reaction: Option<Reaction>,
}

impl Situation {
    pub fn new(ref_name: impl Into<String>) -> Self {
        Self {
            ref_name: ref_name.into(),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_circumstance(mut self, circumstance: Circumstance) -> Self {
        self.circumstances.push(circumstance);
        self
    }

    pub fn with_circumstances(mut self, circumstances: impl IntoIterator<Item = Circumstance>) -> Self {
        self.circumstances.extend(circumstances);
        self
    }

    /// Sets the logical expression; a blank expression restores the default
    /// conjunction.
    pub fn with_logical_expression(mut self, expression: impl Into<String>) -> Self {
        let expression = expression.into();
        self.logical_expression = (!expression.trim().is_empty()).then_some(expression);
        self
    }

    pub fn with_reaction(mut self, reaction: Reaction) -> Self {
        self.reaction = Some(reaction);
        self
    }

    /// The distinct channel types referenced by the circumstances, ascending.
    pub fn channel_types(&self) -> BTreeSet<ChannelType> {
        self.circumstances
            .iter()
            .map(Circumstance::channel_type)
            .collect()
    }

    pub fn circumstance_count(&self) -> usize {
        self.circumstances.len()
    }

    /// Parses the logical expression and checks it against the circumstances.
    pub fn validate(&self) -> Result<(), SituationError> {
        self.parsed_expression()
            .and_then(|expr| match expr {
                Some(expr) => expr.check_variables(self.circumstances.len()),
                None => Ok(()),
            })
            .map_err(|source| SituationError {
                situation: self.ref_name.clone(),
                source,
            })
    }

    fn parsed_expression(&self) -> Result<Option<LogicalExpression>, ExpressionError> {
        self.logical_expression
            .as_deref()
            .map(LogicalExpression::parse)
            .transpose()
    }

    /// Decides whether the situation occurs given its fingerprint.
    pub fn is_occurring(&self, fingerprint: &[bool]) -> Result<bool, ExpressionError> {
        if fingerprint.len() != self.circumstances.len() {
            return Err(ExpressionError::FingerprintMismatch {
                expected: self.circumstances.len(),
                actual: fingerprint.len(),
            });
        }
        match self.parsed_expression()? {
            Some(expr) => expr.evaluate(fingerprint),
            None => Ok(expression::conjunction(fingerprint)),
        }
    }
}

impl fmt::Display for Situation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_empty() {
            write!(f, "{}", self.ref_name)
        } else {
            write!(f, "{} [{}]", self.ref_name, self.kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_circumstances() -> Situation {
        Situation::new("scf-failure")
            .with_circumstance(Circumstance::matches(ChannelType::LogFeed, ".*SCF failed.*"))
            .with_circumstance(Circumstance::no_match(
                ChannelType::OutputFile,
                ".*Normal termination.*",
            ))
    }

    #[test]
    fn default_expression_is_conjunction() {
        let s = two_circumstances();
        for a in [false, true] {
            for b in [false, true] {
                assert_eq!(s.is_occurring(&[a, b]), Ok(a && b));
            }
        }
    }

    #[test]
    fn situation_without_circumstances_occurs_on_empty_fingerprint() {
        assert_eq!(Situation::new("empty").is_occurring(&[]), Ok(true));
    }

    #[test]
    fn custom_expression_is_used() {
        let s = two_circumstances().with_logical_expression("${v0 || v1}");
        assert_eq!(s.is_occurring(&[false, true]), Ok(true));
        assert_eq!(s.is_occurring(&[false, false]), Ok(false));
    }

    #[test]
    fn blank_expression_restores_default() {
        let s = two_circumstances().with_logical_expression("  ");
        assert_eq!(s.logical_expression, None);
    }

    #[test]
    fn fingerprint_length_must_match() {
        assert_eq!(
            two_circumstances().is_occurring(&[true]),
            Err(ExpressionError::FingerprintMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn validate_rejects_out_of_range_variables() {
        let s = two_circumstances().with_logical_expression("v0 && v5");
        let err = s.validate().unwrap_err();
        assert_eq!(err.situation, "scf-failure");
        assert!(matches!(err.source, ExpressionError::UnknownVariable { index: 5, .. }));
        assert!(two_circumstances().validate().is_ok());
    }

    #[test]
    fn channel_types_are_distinct_and_sorted() {
        let s = two_circumstances()
            .with_circumstance(Circumstance::matches(ChannelType::LogFeed, "other"));
        let types: Vec<_> = s.channel_types().into_iter().collect();
        assert_eq!(types, vec![ChannelType::OutputFile, ChannelType::LogFeed]);
    }
}
