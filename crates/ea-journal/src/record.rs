//! Journal records and their line format.

use std::fmt;

use chrono::{Local, NaiveDateTime};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Initialize,
    Deploy,
    Upgrade,
    Test,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "INITIALIZE",
            Self::Deploy => "DEPLOY",
            Self::Upgrade => "UPGRADE",
            Self::Test => "TEST",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn from_success(success: bool) -> Self {
        if success { Self::Success } else { Self::Failure }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    fn level(self) -> &'static str {
        match self {
            Self::Success => "INFO",
            Self::Failure => "ERROR",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        })
    }
}

/// One immutable journal entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    pub timestamp: NaiveDateTime,
    pub kind: OperationKind,
    /// Adapter or container name.
    pub subject: Option<String>,
    pub outcome: Outcome,
    pub detail: Option<String>,
}

impl OperationRecord {
    /// A record stamped with the current local time.
    pub fn now(
        kind: OperationKind,
        subject: Option<&str>,
        success: bool,
        detail: Option<&str>,
    ) -> Self {
        Self {
            timestamp: Local::now().naive_local(),
            kind,
            subject: subject.map(str::to_string),
            outcome: Outcome::from_success(success),
            detail: detail.map(str::to_string),
        }
    }

    /// `{timestamp} - {level} - {KIND} - {OUTCOME}[ - Adapter: ..][ - Details: ..]`
    pub fn render(&self) -> String {
        let mut line = format!(
            "{} - {} - {} - {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.outcome.level(),
            self.kind,
            self.outcome
        );
        if let Some(subject) = self.subject.as_deref().filter(|s| !s.is_empty()) {
            line.push_str(" - Adapter: ");
            line.push_str(subject);
        }
        if let Some(detail) = self.detail.as_deref().filter(|s| !s.is_empty()) {
            line.push_str(" - Details: ");
            line.push_str(detail);
        }
        line
    }
}

/// Detail text for deploy and upgrade records.
pub fn tag_detail(tag: Option<&str>, extra: Option<&str>) -> Option<String> {
    match (tag, extra) {
        (Some(tag), Some(extra)) => Some(format!("Tag: {tag}, {extra}")),
        (Some(tag), None) => Some(format!("Tag: {tag}")),
        (None, extra) => extra.map(str::to_string),
    }
}

/// Detail text for test records.
pub fn test_detail(from: &str, to: &str, result: Option<&str>) -> String {
    match result {
        Some(result) => format!("FROM: {from}, TO: {to}, Result: {result}"),
        None => format!("FROM: {from}, TO: {to}"),
    }
}
