use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The kind of information a channel carries.
///
/// The declaration order is also the processing order of a perception cycle,
/// which keeps batch evaluation and its log output deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChannelType {
    InputFile,
    OutputFile,
    LogFeed,
    Environment,
    JobDetails,
    Any,
    NotDefined,
}

impl ChannelType {
    pub const ALL: [ChannelType; 7] = [
        ChannelType::InputFile,
        ChannelType::OutputFile,
        ChannelType::LogFeed,
        ChannelType::Environment,
        ChannelType::JobDetails,
        ChannelType::Any,
        ChannelType::NotDefined,
    ];

    /// Two channel types are compatible when they are equal or either one is
    /// the `ANY` wildcard.
    pub fn is_compatible_with(self, other: ChannelType) -> bool {
        self == other || self == ChannelType::Any || other == ChannelType::Any
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::InputFile => "INPUTFILE",
            ChannelType::OutputFile => "OUTPUTFILE",
            ChannelType::LogFeed => "LOGFEED",
            ChannelType::Environment => "ENVIRONMENT",
            ChannelType::JobDetails => "JOBDETAILS",
            ChannelType::Any => "ANY",
            ChannelType::NotDefined => "NOTDEFINED",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("Unknown channel type '{0}'. Expected one of INPUTFILE, OUTPUTFILE, LOGFEED, ENVIRONMENT, JOBDETAILS, ANY, NOTDEFINED")]
pub struct ChannelTypeParseError(pub String);

impl FromStr for ChannelType {
    type Err = ChannelTypeParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        ChannelType::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| ChannelTypeParseError(s.to_string()))
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("OUTPUTFILE".parse(), Ok(ChannelType::OutputFile));
        assert_eq!("logfeed".parse(), Ok(ChannelType::LogFeed));
        assert_eq!(" Environment ".parse(), Ok(ChannelType::Environment));
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "LOGFILE".parse::<ChannelType>().unwrap_err();
        assert_eq!(err, ChannelTypeParseError("LOGFILE".to_string()));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for t in ChannelType::ALL {
            assert_eq!(t.to_string().parse::<ChannelType>(), Ok(t));
        }
    }

    #[test]
    fn any_is_compatible_with_every_type() {
        for t in ChannelType::ALL {
            assert!(ChannelType::Any.is_compatible_with(t));
            assert!(t.is_compatible_with(ChannelType::Any));
        }
    }

    #[test]
    fn distinct_concrete_types_are_incompatible() {
        assert!(ChannelType::OutputFile.is_compatible_with(ChannelType::OutputFile));
        assert!(!ChannelType::OutputFile.is_compatible_with(ChannelType::LogFeed));
        assert!(!ChannelType::NotDefined.is_compatible_with(ChannelType::InputFile));
    }

    #[test]
    fn ordering_follows_declaration_order() {
        let mut types = vec![ChannelType::Any, ChannelType::InputFile, ChannelType::LogFeed];
        types.sort();
        assert_eq!(
            types,
            vec![ChannelType::InputFile, ChannelType::LogFeed, ChannelType::Any]
        );
    }
}
