//! Deterministic table-driven engine.
//!
//! A SHA-256 digest of `(name, birthdate, reading date)` picks the score and
//! the catalog entries. The rating is derived from the score band, so the two
//! always agree.

use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use sha2::{Digest, Sha256};

use fortune_types::{
    BIRTHDATE_DISPLAY_FORMAT, Category, EngineError, FortuneReport, Identity, Rating,
    Recommendation,
};

use super::{EngineFut, FortuneEngine};

/// Lower score bound of each tier, most favorable first.
const SCORE_BANDS: [(u32, Rating); 4] = [
    (85, Rating::Great),
    (65, Rating::Good),
    (45, Rating::Neutral),
    (25, Rating::Bad),
];

const DO_CATALOG: [(&str, &str); 8] = [
    ("宜：投资理财", "财运亨通，适合进行投资活动或理财规划。"),
    ("宜：社交活动", "人缘运势佳，适合参加社交活动，拓展人脉。"),
    ("宜：学习进修", "思维敏捷，记忆力增强，是学习新知识的好时机。"),
    ("宜：出行访友", "出行顺利，适合拜访久未联系的朋友。"),
    ("宜：整理居所", "整理环境有助于理清思路，带来好心情。"),
    ("宜：锻炼身体", "精力充沛，适度运动可以进一步提升状态。"),
    ("宜：规划未来", "头脑清晰，适合制定长期目标与计划。"),
    ("宜：表达心意", "沟通顺畅，适合向重要的人表达想法。"),
];

const AVOID_CATALOG: [(&str, &str); 6] = [
    ("忌：冲动消费", "需避免不必要的冲动消费，量入为出。"),
    ("忌：激烈运动", "身体能量略有不足，不宜进行剧烈运动。"),
    ("忌：熬夜劳累", "注意休息，避免过度劳累影响次日状态。"),
    ("忌：与人争执", "情绪易起伏，遇事宜冷静，避免口舌之争。"),
    ("忌：草率决定", "重要事项宜三思而后行，不宜仓促拍板。"),
    ("忌：借贷担保", "财务往来需谨慎，不宜为他人作保。"),
];

/// `(first month, first day, sign)` for each western zodiac sign by calendar month.
const WESTERN_ZODIAC: [(u32, u32, &str); 12] = [
    (1, 20, "水瓶座"),
    (2, 19, "双鱼座"),
    (3, 21, "白羊座"),
    (4, 20, "金牛座"),
    (5, 21, "双子座"),
    (6, 21, "巨蟹座"),
    (7, 23, "狮子座"),
    (8, 23, "处女座"),
    (9, 23, "天秤座"),
    (10, 23, "天蝎座"),
    (11, 22, "射手座"),
    (12, 22, "摩羯座"),
];

/// Indexed from the year of the rat; 1900 is a rat year.
const CHINESE_ZODIAC: [&str; 12] = [
    "鼠", "牛", "虎", "兔", "龙", "蛇", "马", "羊", "猴", "鸡", "狗", "猪",
];

fn band(score: u32) -> Rating {
    SCORE_BANDS
        .iter()
        .find(|(floor, _)| score >= *floor)
        .map_or(Rating::Terrible, |(_, rating)| *rating)
}

fn western_sign(date: NaiveDate) -> &'static str {
    let month_index = date.month0() as usize;
    let (_, first_day, sign) = WESTERN_ZODIAC[month_index];
    if date.day() >= first_day {
        sign
    } else {
        WESTERN_ZODIAC[(month_index + 11) % 12].2
    }
}

/// Animal of the Gregorian birth year. The lunar new year boundary is ignored.
fn chinese_animal(date: NaiveDate) -> &'static str {
    let offset = (date.year() - 1900).rem_euclid(12);
    CHINESE_ZODIAC[usize::try_from(offset).unwrap_or_default()]
}

fn tier_summary(rating: Rating) -> &'static str {
    match rating {
        Rating::Great => "今日整体运势极佳，诸事顺遂，可大胆把握机会。",
        Rating::Good => "今日整体运势良好，多数事务进展顺利。",
        Rating::Neutral => "今日整体运势平稳，宜按部就班，稳中求进。",
        Rating::Bad => "今日整体运势欠佳，行事需多加谨慎。",
        Rating::Terrible => "今日整体运势低迷，宜静养休整，避免冒进。",
    }
}

/// Take `count` consecutive catalog entries starting at `start`, wrapping.
fn pick<'c>(
    catalog: &'c [(&'c str, &'c str)],
    start: u8,
    count: usize,
) -> impl Iterator<Item = &'c (&'c str, &'c str)> {
    catalog
        .iter()
        .cycle()
        .skip(usize::from(start) % catalog.len())
        .take(count.min(catalog.len()))
}

#[derive(Debug, Clone)]
pub struct TableEngine {
    delay: Duration,
    reading_date: Option<NaiveDate>,
}

impl TableEngine {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            reading_date: None,
        }
    }

    /// Pin the reading date instead of using the local calendar day.
    #[must_use]
    pub fn with_reading_date(mut self, date: NaiveDate) -> Self {
        self.reading_date = Some(date);
        self
    }

    pub fn reading(&self, identity: &Identity) -> Result<FortuneReport, EngineError> {
        let reading_date = self
            .reading_date
            .unwrap_or_else(|| Local::now().date_naive());

        let mut hasher = Sha256::new();
        hasher.update(identity.name().as_str().as_bytes());
        hasher.update([0]);
        hasher.update(identity.display_birthdate().as_bytes());
        hasher.update([0]);
        hasher.update(reading_date.format(BIRTHDATE_DISPLAY_FORMAT).to_string().as_bytes());
        let digest = hasher.finalize();

        let score = u32::from(u16::from_be_bytes([digest[0], digest[1]])) % 101;
        let rating = band(score);

        let do_count = 2 + usize::from(digest[2] % 2);
        let avoid_count = 1 + usize::from(digest[3] % 2);
        let recommendations = pick(&DO_CATALOG, digest[4], do_count)
            .map(|(title, description)| Recommendation::new(*title, *description, Category::Do))
            .chain(
                pick(&AVOID_CATALOG, digest[5], avoid_count).map(|(title, description)| {
                    Recommendation::new(*title, *description, Category::Avoid)
                }),
            )
            .collect::<Result<Vec<_>, _>>()?;

        let birthdate = identity.birthdate();
        let interpretation = format!(
            "{}生于{}年的您属{}，太阳星座为{}。结合紫微斗数与星座学综合分析，今日运势评分为{}分。",
            tier_summary(rating),
            birthdate.year(),
            chinese_animal(birthdate),
            western_sign(birthdate),
            score,
        );

        tracing::debug!(
            name_len = identity.name().as_str().chars().count(),
            rating = %rating,
            score,
            "Table engine reading"
        );
        Ok(FortuneReport::new(rating, score, recommendations, interpretation)?)
    }
}

impl FortuneEngine for TableEngine {
    fn name(&self) -> &'static str {
        "table"
    }

    fn calculate<'a>(&'a self, identity: &'a Identity) -> EngineFut<'a> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.reading(identity)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn identity(name: &str, birthdate: NaiveDate) -> Identity {
        Identity::new(name, birthdate, day(2024, 6, 1)).expect("identity")
    }

    fn engine() -> TableEngine {
        TableEngine::new(Duration::ZERO).with_reading_date(day(2024, 6, 1))
    }

    #[test]
    fn bands_are_monotonic() {
        assert_eq!(band(100), Rating::Great);
        assert_eq!(band(85), Rating::Great);
        assert_eq!(band(84), Rating::Good);
        assert_eq!(band(65), Rating::Good);
        assert_eq!(band(45), Rating::Neutral);
        assert_eq!(band(25), Rating::Bad);
        assert_eq!(band(24), Rating::Terrible);
        assert_eq!(band(0), Rating::Terrible);

        let mut previous = band(0);
        for score in 1..=100 {
            let current = band(score);
            assert!(current <= previous, "rating must not worsen as score rises");
            previous = current;
        }
    }

    #[test]
    fn western_sign_boundaries() {
        assert_eq!(western_sign(day(1990, 1, 1)), "摩羯座");
        assert_eq!(western_sign(day(1990, 1, 19)), "摩羯座");
        assert_eq!(western_sign(day(1990, 1, 20)), "水瓶座");
        assert_eq!(western_sign(day(1990, 7, 22)), "巨蟹座");
        assert_eq!(western_sign(day(1990, 7, 23)), "狮子座");
        assert_eq!(western_sign(day(1990, 12, 31)), "摩羯座");
    }

    #[test]
    fn chinese_animal_by_year() {
        assert_eq!(chinese_animal(day(1900, 6, 1)), "鼠");
        assert_eq!(chinese_animal(day(1990, 6, 1)), "马");
        assert_eq!(chinese_animal(day(2024, 6, 1)), "龙");
        assert_eq!(chinese_animal(day(1899, 6, 1)), "猪");
    }

    #[tokio::test(start_paused = true)]
    async fn calculate_waits_out_the_delay() {
        let engine = TableEngine::new(Duration::from_millis(800)).with_reading_date(day(2024, 6, 1));
        let who = identity("张三", day(1990, 1, 1));

        let start = tokio::time::Instant::now();
        let report = engine.calculate(&who).await.expect("report");
        assert!(start.elapsed() >= Duration::from_millis(800));
        assert_eq!(report, engine.reading(&who).expect("report"));
    }

    #[test]
    fn same_inputs_give_same_report() {
        let who = identity("张三", day(1990, 1, 1));
        assert_eq!(
            engine().reading(&who).expect("report"),
            engine().reading(&who).expect("report")
        );
    }

    #[test]
    fn reports_respect_shape_and_rating_agrees_with_score() {
        for (i, name) in ["张三", "李四", "王五", "Alice", "Bob", "赵六"].iter().enumerate() {
            let birth = day(1970 + i32::try_from(i).expect("small"), 3, 15);
            let report = engine().reading(&identity(name, birth)).expect("report");

            assert_eq!(report.rating(), band(u32::from(report.score().value())));
            let (dos, avoids): (Vec<_>, Vec<_>) = report
                .recommendations()
                .iter()
                .partition(|rec| rec.category() == Category::Do);
            assert!((2..=3).contains(&dos.len()), "{name}: {} do items", dos.len());
            assert!((1..=2).contains(&avoids.len()), "{name}: {} avoid items", avoids.len());
            assert!(report.interpretation().contains("双鱼座"));
        }
    }

    #[test]
    fn picks_are_distinct() {
        let titles: Vec<&str> = pick(&DO_CATALOG, 7, 3).map(|(title, _)| *title).collect();
        assert_eq!(titles, vec!["宜：表达心意", "宜：投资理财", "宜：社交活动"]);
    }
}
