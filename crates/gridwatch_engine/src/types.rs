use std::fmt;

use gridwatch_core::{BatchProgress, CityEntity, WeatherRecord};

/// Per-city result of a batch load. A failure never affects its siblings.
pub type FetchOutcome = Result<WeatherRecord, FailureKind>;

#[derive(Debug, Clone, PartialEq)]
pub struct CityResult {
    pub city: CityEntity,
    pub outcome: FetchOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    /// One entry per settled city, in list order.
    pub results: Vec<CityResult>,
    pub progress: BatchProgress,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&CityEntity, &WeatherRecord)> {
        self.results
            .iter()
            .filter_map(|result| result.outcome.as_ref().ok().map(|record| (&result.city, record)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    CitySettled {
        index: usize,
        city: CityEntity,
        outcome: FetchOutcome,
        progress: BatchProgress,
    },
    Completed(BatchProgress),
    Cancelled(BatchProgress),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "undecodable response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
