//! Fixed sample report after an artificial delay.

use std::time::Duration;

use fortune_types::{Category, EngineError, FortuneReport, Identity, Rating, Recommendation};

use super::{EngineFut, FortuneEngine};

const SAMPLE_SCORE: u32 = 78;

const SAMPLE_RECOMMENDATIONS: [(&str, &str, Category); 5] = [
    (
        "宜：投资理财",
        "今日财运亨通，适合进行投资活动或理财规划。",
        Category::Do,
    ),
    (
        "宜：社交活动",
        "人缘运势佳，适合参加社交活动，拓展人脉。",
        Category::Do,
    ),
    (
        "宜：学习进修",
        "思维敏捷，记忆力增强，是学习新知识的好时机。",
        Category::Do,
    ),
    (
        "忌：冲动消费",
        "虽然财运不错，但仍需避免不必要的冲动消费。",
        Category::Avoid,
    ),
    (
        "忌：激烈运动",
        "身体能量略有不足，不宜进行剧烈运动。",
        Category::Avoid,
    ),
];

const SAMPLE_INTERPRETATION: &str = "根据紫微斗数和八字分析，您今日的整体运势良好。财运和人际关系方面尤为突出，可把握机会拓展人脉和进行适度投资。健康方面需要注意休息，避免过度劳累。工作学习效率较高，适合处理需要专注力的任务。感情方面平稳，已有伴侣的人可增进感情交流。";

/// Returns the same report for every identity.
#[derive(Debug, Clone)]
pub struct SampleEngine {
    delay: Duration,
}

impl SampleEngine {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn report() -> Result<FortuneReport, EngineError> {
        let recommendations = SAMPLE_RECOMMENDATIONS
            .iter()
            .map(|(title, description, category)| Recommendation::new(*title, *description, *category))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FortuneReport::new(
            Rating::Good,
            SAMPLE_SCORE,
            recommendations,
            SAMPLE_INTERPRETATION,
        )?)
    }
}

impl FortuneEngine for SampleEngine {
    fn name(&self) -> &'static str {
        "sample"
    }

    fn calculate<'a>(&'a self, _identity: &'a Identity) -> EngineFut<'a> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Self::report()
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tokio::time::Instant;

    use super::*;

    #[test]
    fn sample_report_matches_page() {
        let report = SampleEngine::report().expect("static data is valid");
        assert_eq!(report.rating(), Rating::Good);
        assert_eq!(report.score().value(), 78);
        let categories: Vec<Category> = report
            .recommendations()
            .iter()
            .map(Recommendation::category)
            .collect();
        assert_eq!(
            categories,
            vec![
                Category::Do,
                Category::Do,
                Category::Do,
                Category::Avoid,
                Category::Avoid
            ]
        );
        assert!(report.interpretation().starts_with("根据紫微斗数"));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_configured_delay() {
        let engine = SampleEngine::new(Duration::from_millis(1_500));
        let identity = Identity::new(
            "张三",
            NaiveDate::from_ymd_opt(1990, 1, 1).expect("date"),
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
        )
        .expect("identity");

        let started = Instant::now();
        let report = engine.calculate(&identity).await.expect("report");
        assert!(started.elapsed() >= Duration::from_millis(1_500));
        assert_eq!(report.score().value(), 78);
    }
}
