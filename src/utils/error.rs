use crate::domain::model::{AllianceId, PartyId, Region};
use serde::Serialize;
use thiserror::Error;

/// Registry or gesture precondition that a mutation would break.
///
/// These are never fatal mid-session: the offending mutation is skipped and
/// the previous state is kept.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum StateViolation {
    #[error("party '{party}' is not a member of any alliance")]
    PartyNotRegistered { party: PartyId },

    #[error("alliance '{alliance}' does not exist")]
    UnknownAlliance { alliance: AllianceId },

    #[error("alliance '{alliance}' is declared more than once")]
    DuplicateAlliance { alliance: AllianceId },

    #[error("party '{party}' is listed in both '{first}' and '{second}'")]
    DuplicateMembership {
        party: PartyId,
        first: AllianceId,
        second: AllianceId,
    },

    #[error("region '{region}' has a seat allocation but no votes")]
    RegionWithoutVotes { region: Region },

    #[error("a drag gesture for '{party}' is already in progress")]
    GestureInProgress { party: PartyId },
}

#[derive(Error, Debug)]
pub enum SeatError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Malformed record in {source_name} line {line}: field '{field}' = '{value}' ({reason})")]
    MalformedRecord {
        source_name: String,
        line: u64,
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid state: {0}")]
    InvalidState(#[from] StateViolation),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    State,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SeatError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SeatError::IoError(_) => ErrorCategory::Io,
            SeatError::CsvError(_)
            | SeatError::SerializationError(_)
            | SeatError::MalformedRecord { .. } => ErrorCategory::Data,
            SeatError::InvalidState(_) => ErrorCategory::State,
            SeatError::ConfigError { .. }
            | SeatError::ConfigValidationError { .. }
            | SeatError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單一手勢被拒絕，狀態保持不變
            ErrorCategory::State => ErrorSeverity::Low,
            ErrorCategory::Configuration => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SeatError::IoError(_) => "Check that the data directory exists and is readable",
            SeatError::CsvError(_) => "Check the CSV header row and column count",
            SeatError::SerializationError(_) => "Check that the JSON input is well formed",
            SeatError::MalformedRecord { .. } => {
                "Fix the numeric field in the named file; votes and seats must be integers"
            }
            SeatError::InvalidState(_) => "The gesture was skipped; the previous grouping is kept",
            SeatError::ConfigError { .. }
            | SeatError::ConfigValidationError { .. }
            | SeatError::InvalidConfigValueError { .. } => {
                "Review the configuration values against the documented ranges"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SeatError::MalformedRecord {
                source_name, line, ..
            } => format!("Could not read {} (line {}): {}", source_name, line, self),
            SeatError::InvalidState(violation) => format!("Regrouping skipped: {}", violation),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SeatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_violation_is_low_severity() {
        let err: SeatError = StateViolation::PartyNotRegistered {
            party: PartyId::new("PRO"),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::State);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(err.user_friendly_message().contains("PRO"));
    }

    #[test]
    fn test_malformed_record_message_names_source() {
        let err = SeatError::MalformedRecord {
            source_name: "votes.csv".to_string(),
            line: 4,
            field: "votes".to_string(),
            value: "12a".to_string(),
            reason: "invalid digit found in string".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        let message = err.to_string();
        assert!(message.contains("votes.csv"));
        assert!(message.contains("12a"));
    }
}
