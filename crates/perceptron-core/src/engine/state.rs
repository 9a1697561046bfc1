use std::fmt;

/// Progress of a perception cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PerceptionStage {
    #[default]
    Idle,
    TextBatchEvaluated,
    CircumstancesEvaluated,
    SituationsEvaluated,
    Done,
}

impl fmt::Display for PerceptionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PerceptionStage::Idle => "idle",
            PerceptionStage::TextBatchEvaluated => "text batch evaluated",
            PerceptionStage::CircumstancesEvaluated => "circumstances evaluated",
            PerceptionStage::SituationsEvaluated => "situations evaluated",
            PerceptionStage::Done => "done",
        };
        write!(f, "{}", s)
    }
}

/// Verdict of a completed perception cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// No situation occurs.
    Unknown,
    /// Exactly one situation occurs.
    Aware,
    /// More than one situation occurs.
    Ambiguous,
}

impl Outcome {
    pub fn from_count(occurring: usize) -> Self {
        match occurring {
            0 => Outcome::Unknown,
            1 => Outcome::Aware,
            _ => Outcome::Ambiguous,
        }
    }

    pub fn is_aware(self) -> bool {
        self == Outcome::Aware
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Unknown => "unknown",
            Outcome::Aware => "aware",
            Outcome::Ambiguous => "ambiguous",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_follows_number_of_occurring_situations() {
        assert_eq!(Outcome::from_count(0), Outcome::Unknown);
        assert_eq!(Outcome::from_count(1), Outcome::Aware);
        assert_eq!(Outcome::from_count(3), Outcome::Ambiguous);
        assert!(Outcome::from_count(1).is_aware());
        assert!(!Outcome::from_count(2).is_aware());
    }

    #[test]
    fn stages_are_ordered_along_the_cycle() {
        assert!(PerceptionStage::Idle < PerceptionStage::TextBatchEvaluated);
        assert!(PerceptionStage::SituationsEvaluated < PerceptionStage::Done);
        assert_eq!(PerceptionStage::default(), PerceptionStage::Idle);
    }
}
