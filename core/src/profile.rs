//! Rating profile: the rating-to-display lookup table.
//!
//! Built once at startup and shared read-only afterwards. The builtin table
//! lives in a `LazyLock`; configured tables are built by the caller and
//! handed around behind an `Arc`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use thiserror::Error;

use fortune_types::settings::RatingOverride;
use fortune_types::{NonEmptyStaticStr, NonEmptyString, Rating, UnknownRatingError};

/// Visual tone of a rating badge. Renderers map tones to concrete colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Green,
    Emerald,
    Blue,
    Orange,
    Red,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tone {0:?} (expected green, emerald, blue, orange or red)")]
pub struct UnknownToneError(pub String);

impl Tone {
    pub const ALL: [Self; 5] = [
        Self::Green,
        Self::Emerald,
        Self::Blue,
        Self::Orange,
        Self::Red,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Emerald => "emerald",
            Self::Blue => "blue",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = UnknownToneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tone| tone.as_str() == key)
            .ok_or_else(|| UnknownToneError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingEntry {
    pub label: NonEmptyString,
    pub tone: Tone,
    pub description: NonEmptyString,
}

impl RatingEntry {
    fn builtin(label: &'static str, tone: Tone, description: &'static str) -> Self {
        Self {
            label: NonEmptyStaticStr::new(label).into(),
            tone,
            description: NonEmptyStaticStr::new(description).into(),
        }
    }
}

/// Broken invariant between the rating set and its profile table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("rating profile has no entry for {0}")]
    MissingEntry(Rating),
    #[error("rating profile lists {0} more than once")]
    DuplicateEntry(Rating),
    #[error(transparent)]
    UnknownRating(#[from] UnknownRatingError),
    #[error("rating {rating}: {source}")]
    UnknownTone {
        rating: Rating,
        source: UnknownToneError,
    },
    #[error("rating {rating}: {field} must not be empty")]
    EmptyField { rating: Rating, field: &'static str },
}

static BUILTIN: LazyLock<RatingProfile> = LazyLock::new(|| RatingProfile {
    entries: BTreeMap::from([
        (
            Rating::Great,
            RatingEntry::builtin("大吉", Tone::Green, "今日运势极佳，万事顺遂"),
        ),
        (
            Rating::Good,
            RatingEntry::builtin("小吉", Tone::Emerald, "今日运势良好，适合进行大多数活动"),
        ),
        (
            Rating::Neutral,
            RatingEntry::builtin("中平", Tone::Blue, "今日运势平稳，宜守不宜进"),
        ),
        (
            Rating::Bad,
            RatingEntry::builtin("小凶", Tone::Orange, "今日运势欠佳，需谨慎行事"),
        ),
        (
            Rating::Terrible,
            RatingEntry::builtin("大凶", Tone::Red, "今日运势不佳，宜静养避祸"),
        ),
    ]),
});

/// Rating-to-display lookup. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingProfile {
    entries: BTreeMap<Rating, RatingEntry>,
}

impl RatingProfile {
    /// The builtin table, one entry per rating.
    #[must_use]
    pub fn builtin() -> &'static RatingProfile {
        &BUILTIN
    }

    /// Build a table from explicit entries.
    ///
    /// Duplicates are rejected. Completeness is not checked here; call
    /// [`RatingProfile::ensure_complete`] at startup.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (Rating, RatingEntry)>,
    ) -> Result<Self, ProfileError> {
        let mut map = BTreeMap::new();
        for (rating, entry) in entries {
            if map.insert(rating, entry).is_some() {
                return Err(ProfileError::DuplicateEntry(rating));
            }
        }
        Ok(Self { entries: map })
    }

    /// Apply user overrides on top of this table, returning a new table.
    ///
    /// Keys are rating names (`good` or `good-fortune`). Unset fields keep the
    /// current value.
    pub fn with_overrides<'a>(
        &self,
        overrides: impl IntoIterator<Item = (&'a String, &'a RatingOverride)>,
    ) -> Result<Self, ProfileError> {
        let mut entries = self.entries.clone();
        for (key, patch) in overrides {
            let rating: Rating = key.parse()?;
            let entry = entries
                .get_mut(&rating)
                .ok_or(ProfileError::MissingEntry(rating))?;
            if let Some(label) = &patch.label {
                entry.label = NonEmptyString::trimmed(label).map_err(|_| ProfileError::EmptyField {
                    rating,
                    field: "label",
                })?;
            }
            if let Some(tone) = &patch.tone {
                entry.tone = tone
                    .parse()
                    .map_err(|source| ProfileError::UnknownTone { rating, source })?;
            }
            if let Some(description) = &patch.description {
                entry.description =
                    NonEmptyString::trimmed(description).map_err(|_| ProfileError::EmptyField {
                        rating,
                        field: "description",
                    })?;
            }
            tracing::debug!(rating = %rating, "Applied rating profile override");
        }
        Ok(Self { entries })
    }

    /// Fail unless every rating has an entry.
    pub fn ensure_complete(&self) -> Result<(), ProfileError> {
        match Rating::ALL
            .into_iter()
            .find(|rating| !self.entries.contains_key(rating))
        {
            Some(missing) => Err(ProfileError::MissingEntry(missing)),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn lookup(&self, rating: Rating) -> Option<&RatingEntry> {
        self.entries.get(&rating)
    }

    /// Entries in rating order, most favorable first.
    pub fn iter(&self) -> impl Iterator<Item = (Rating, &RatingEntry)> {
        self.entries.iter().map(|(rating, entry)| (*rating, entry))
    }
}
