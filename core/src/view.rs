//! Projection of a fortune report into a display-ready view.

use std::fmt;

use thiserror::Error;

use fortune_types::{Category, FortuneReport, Identity, NonEmptyStaticStr, Rating, Score};

use crate::profile::{RatingProfile, Tone};

/// Attribution shown under every report.
pub const ATTRIBUTION: NonEmptyStaticStr =
    NonEmptyStaticStr::new("基于东方玄学、紫微斗数、易经和西方星座学综合分析");

/// The rating table and the rating set disagree. Not user-recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("no rating profile entry for {rating}: rating table and profile are out of sync")]
    MissingProfile { rating: Rating },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingBadge {
    pub rating: Rating,
    pub label: String,
    pub tone: Tone,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationItem {
    pub title: String,
    pub description: String,
}

/// Everything a presentation layer needs to draw a settled report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub badge: RatingBadge,
    /// Passed through unchanged; drawn as a 0-100 gauge.
    pub score: Score,
    /// `do` items in report order.
    pub encouraged: Vec<RecommendationItem>,
    /// `avoid` items in report order.
    pub discouraged: Vec<RecommendationItem>,
    pub interpretation: String,
}

impl ResultView {
    #[must_use]
    pub fn group(&self, category: Category) -> &[RecommendationItem] {
        match category {
            Category::Do => &self.encouraged,
            Category::Avoid => &self.discouraged,
        }
    }
}

/// Pure and deterministic: equal inputs give equal views.
pub fn project(report: &FortuneReport, profile: &RatingProfile) -> Result<ResultView, RenderError> {
    let rating = report.rating();
    let Some(entry) = profile.lookup(rating) else {
        tracing::error!(rating = %rating, "Rating profile entry missing; refusing to render report");
        return Err(RenderError::MissingProfile { rating });
    };

    let mut encouraged = Vec::new();
    let mut discouraged = Vec::new();
    for recommendation in report.recommendations() {
        let item = RecommendationItem {
            title: recommendation.title().to_string(),
            description: recommendation.description().to_string(),
        };
        match recommendation.category() {
            Category::Do => encouraged.push(item),
            Category::Avoid => discouraged.push(item),
        }
    }

    Ok(ResultView {
        badge: RatingBadge {
            rating,
            label: entry.label.to_string(),
            tone: entry.tone,
            description: entry.description.to_string(),
        },
        score: report.score(),
        encouraged,
        discouraged,
        interpretation: report.interpretation().to_string(),
    })
}

/// `name · YYYY-MM-DD` line above the badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    pub name: String,
    pub birthdate: String,
}

impl ReportHeader {
    #[must_use]
    pub fn new(identity: &Identity) -> Self {
        Self {
            name: identity.name().to_string(),
            birthdate: identity.display_birthdate(),
        }
    }
}

impl fmt::Display for ReportHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} · {}", self.name, self.birthdate)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use fortune_types::Recommendation;

    use super::*;
    use crate::profile::RatingEntry;

    fn rec(title: &str, category: Category) -> Recommendation {
        Recommendation::new(title, format!("{title} details"), category).expect("recommendation")
    }

    fn report(rating: Rating, score: u32, recs: Vec<Recommendation>) -> FortuneReport {
        FortuneReport::new(rating, score, recs, "解读").expect("report")
    }

    #[test]
    fn scenario_good_78_one_of_each() {
        let report = report(
            Rating::Good,
            78,
            vec![
                rec("投资理财", Category::Do),
                rec("冲动消费", Category::Avoid),
            ],
        );
        let view = project(&report, RatingProfile::builtin()).expect("complete profile");

        assert_eq!(view.badge.rating, Rating::Good);
        assert_eq!(view.badge.label, "小吉");
        assert_eq!(view.badge.tone, Tone::Emerald);
        assert_eq!(view.score.value(), 78);
        assert_eq!(view.score.to_string(), "78/100");
        assert_eq!(view.encouraged.len(), 1);
        assert_eq!(view.encouraged[0].title, "投资理财");
        assert_eq!(view.discouraged.len(), 1);
        assert_eq!(view.discouraged[0].title, "冲动消费");
        assert_eq!(view.interpretation, "解读");
    }

    #[test]
    fn projection_is_deterministic() {
        let report = report(
            Rating::Neutral,
            50,
            vec![rec("a", Category::Avoid), rec("b", Category::Do)],
        );
        let first = project(&report, RatingProfile::builtin());
        let second = project(&report, RatingProfile::builtin());
        assert_eq!(first, second);
    }

    #[test]
    fn grouping_preserves_order_and_is_exhaustive() {
        let recs = vec![
            rec("d1", Category::Do),
            rec("a1", Category::Avoid),
            rec("d2", Category::Do),
            rec("a2", Category::Avoid),
            rec("d3", Category::Do),
        ];
        let report = report(Rating::Great, 95, recs.clone());
        let view = project(&report, RatingProfile::builtin()).expect("view");

        let titles = |items: &[RecommendationItem]| -> Vec<String> {
            items.iter().map(|item| item.title.clone()).collect()
        };
        assert_eq!(titles(view.group(Category::Do)), vec!["d1", "d2", "d3"]);
        assert_eq!(titles(view.group(Category::Avoid)), vec!["a1", "a2"]);
        assert_eq!(
            view.encouraged.len() + view.discouraged.len(),
            recs.len(),
            "every recommendation lands in exactly one group"
        );
    }

    #[test]
    fn empty_recommendations_give_empty_groups() {
        let view = project(&report(Rating::Bad, 30, Vec::new()), RatingProfile::builtin())
            .expect("view");
        assert!(view.encouraged.is_empty());
        assert!(view.discouraged.is_empty());
    }

    #[test]
    fn missing_profile_entry_fails_loudly() {
        let partial = RatingProfile::from_entries([(
            Rating::Great,
            RatingEntry {
                label: "A".try_into().expect("label"),
                tone: Tone::Green,
                description: "d".try_into().expect("description"),
            },
        )])
        .expect("partial table");
        let err = project(&report(Rating::Terrible, 5, Vec::new()), &partial)
            .expect_err("no entry for terrible");
        assert_eq!(
            err,
            RenderError::MissingProfile {
                rating: Rating::Terrible
            }
        );
    }

    #[test]
    fn header_formats_name_and_date() {
        let identity = Identity::new(
            "张三",
            NaiveDate::from_ymd_opt(1990, 1, 1).expect("date"),
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
        )
        .expect("identity");
        assert_eq!(ReportHeader::new(&identity).to_string(), "张三 · 1990-01-01");
    }
}
