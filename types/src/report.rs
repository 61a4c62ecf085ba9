//! Fortune report data model and engine error types.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::NonEmptyString;

// ============================================================================
// Rating
// ============================================================================

/// Five ordinal rating tiers.
///
/// Declaration order is most favorable first, so `Rating::Great < Rating::Terrible`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    #[serde(alias = "great-fortune")]
    Great,
    #[serde(alias = "good-fortune")]
    Good,
    Neutral,
    #[serde(alias = "bad-fortune")]
    Bad,
    #[serde(alias = "terrible-fortune")]
    Terrible,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown rating {0:?} (expected great, good, neutral, bad or terrible)")]
pub struct UnknownRatingError(pub String);

impl Rating {
    pub const ALL: [Self; 5] = [
        Self::Great,
        Self::Good,
        Self::Neutral,
        Self::Bad,
        Self::Terrible,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Great => "great",
            Self::Good => "good",
            Self::Neutral => "neutral",
            Self::Bad => "bad",
            Self::Terrible => "terrible",
        }
    }

    /// Position in the ordinal scale, 0 = most favorable.
    #[must_use]
    pub const fn ordinal(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = UnknownRatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let key = key.strip_suffix("-fortune").unwrap_or(&key);
        Self::ALL
            .into_iter()
            .find(|rating| rating.as_str() == key)
            .ok_or_else(|| UnknownRatingError(s.to_string()))
    }
}

// ============================================================================
// Score
// ============================================================================

/// A score in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 100;

    pub fn new(value: u32) -> Result<Self, ReportError> {
        match u8::try_from(value) {
            Ok(v) if v <= Self::MAX => Ok(Self(v)),
            _ => Err(ReportError::ScoreOutOfRange { score: value }),
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Fraction of the full scale, for gauges.
    #[must_use]
    pub fn ratio(self) -> f64 {
        f64::from(self.0) / f64::from(Self::MAX)
    }
}

impl TryFrom<u32> for Score {
    type Error = ReportError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for u8 {
    fn from(value: Score) -> Self {
        value.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

// ============================================================================
// Recommendations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Do,
    Avoid,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Do => "do",
            Self::Avoid => "avoid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    title: NonEmptyString,
    description: String,
    category: Category,
}

impl Recommendation {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: Category,
    ) -> Result<Self, ReportError> {
        let title = NonEmptyString::new(title).map_err(|_| ReportError::EmptyTitle)?;
        Ok(Self {
            title,
            description: description.into(),
            category,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }
}

// ============================================================================
// FortuneReport
// ============================================================================

/// Engine output. Structurally valid by construction: the rating is one of the
/// five tiers, the score is in range, and the interpretation is non-empty.
///
/// Whether the score agrees with the rating is engine policy, not checked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FortuneReport {
    rating: Rating,
    score: Score,
    recommendations: Vec<Recommendation>,
    interpretation: NonEmptyString,
}

impl FortuneReport {
    pub fn new(
        rating: Rating,
        score: u32,
        recommendations: Vec<Recommendation>,
        interpretation: impl Into<String>,
    ) -> Result<Self, ReportError> {
        let score = Score::new(score)?;
        let interpretation =
            NonEmptyString::new(interpretation).map_err(|_| ReportError::EmptyInterpretation)?;
        Ok(Self {
            rating,
            score,
            recommendations,
            interpretation,
        })
    }

    #[must_use]
    pub fn rating(&self) -> Rating {
        self.rating
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    /// Recommendations in insertion order.
    #[must_use]
    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    #[must_use]
    pub fn interpretation(&self) -> &str {
        self.interpretation.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("score {score} is outside 0..=100")]
    ScoreOutOfRange { score: u32 },
    #[error("recommendation title must not be empty")]
    EmptyTitle,
    #[error("interpretation must not be empty")]
    EmptyInterpretation,
}

// ============================================================================
// Engine errors
// ============================================================================

/// Error raised by a fortune engine implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    #[error("engine produced an invalid report: {0}")]
    InvalidReport(#[from] ReportError),
    #[error("{0}")]
    Internal(String),
}

/// Why a pending calculation ended without a report.
///
/// Every variant returns the session to idle; none of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineFailure {
    #[error("calculation timed out after {}ms", .elapsed.as_millis())]
    Timeout { elapsed: Duration },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("engine panicked: {0}")]
    Panicked(String),
    #[error("calculation task ended without a result")]
    Disconnected,
}
