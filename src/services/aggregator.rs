//! 评价聚合 - 业务能力层
//!
//! 把学生在日期范围内的咨询记录合并为一份档案：
//! - 时点型维度（学业、态度、出勤、适应、就业准备）取最近一次
//! - TOPIK 成绩、志愿、获奖按时间顺序全部保留

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::consultation::{ConsultationRecord, DateRange};
use crate::models::evaluation::Evaluation;
use crate::models::profile::{
    Achievement, AggregatedProfile, ConsultationSummary, DimensionSnapshot, PreferenceEntry,
};
use crate::models::student::{Student, StudentId};
use crate::models::topik::TopikTestResult;
use crate::services::cache::TtlCache;
use crate::services::store::StudentStore;

pub struct EvaluationAggregator {
    store: Arc<dyn StudentStore>,
    students: TtlCache<StudentId, Student>,
}

impl EvaluationAggregator {
    pub fn new(store: Arc<dyn StudentStore>, student_ttl: Duration) -> Self {
        Self {
            store,
            students: TtlCache::new(student_ttl),
        }
    }

    /// 聚合学生档案
    ///
    /// # 参数
    /// * `student_id` - 学生 ID
    /// * `range` - 日期范围（闭区间，两端可省略）
    ///
    /// # 返回
    /// 合并后的档案。范围内没有记录时返回空档案（不是错误）；
    /// 起始日期晚于结束日期时返回 `InvalidDateRange`
    pub async fn aggregate(
        &self,
        student_id: StudentId,
        range: &DateRange,
    ) -> AppResult<AggregatedProfile> {
        range.validate()?;

        let student = self.student(student_id).await?;
        let records = self.store.list_consultations(student_id, range).await?;

        let mut profile = AggregatedProfile::empty(student, *range);
        let mut ordered: Vec<&ConsultationRecord> =
            records.iter().filter(|r| range.contains(r.date)).collect();
        if ordered.is_empty() {
            info!("[学生 {}] 范围内没有咨询记录，生成空档案", student_id);
            return Ok(profile);
        }
        ordered.sort_by_key(|r| (r.date, r.id));

        for record in ordered {
            merge(&mut profile, record);
        }

        debug!(
            "[学生 {}] 聚合完成: {} 条咨询, {} 次 TOPIK, {} 个维度",
            student_id,
            profile.consultations.len(),
            profile.topik_results.len(),
            profile.latest.len()
        );
        Ok(profile)
    }

    /// 学生信息变更后显式失效缓存
    pub fn invalidate_student(&self, student_id: StudentId) {
        if self.students.invalidate(&student_id) {
            debug!("[学生 {}] 缓存已失效", student_id);
        }
    }

    async fn student(&self, student_id: StudentId) -> AppResult<Student> {
        if let Some(student) = self.students.get(&student_id) {
            return Ok(student);
        }
        let student = self.store.get_student(student_id).await?;
        self.students.insert(student_id, student.clone());
        Ok(student)
    }
}

/// 按时间顺序合并，后到的记录覆盖同一维度
fn merge(profile: &mut AggregatedProfile, record: &ConsultationRecord) {
    for (key, dimension) in record.evaluation.dimensions() {
        profile.latest.insert(
            key,
            DimensionSnapshot {
                dimension: dimension.clone(),
                consultation_id: record.id,
                date: record.date,
            },
        );
    }

    match &record.evaluation {
        Evaluation::TopikV1 {
            test_number,
            reading,
            listening,
            writing,
            total,
            level,
        } => profile.topik_results.push(TopikTestResult {
            test_number: *test_number,
            reading: *reading,
            listening: *listening,
            writing: *writing,
            total: *total,
            level: *level,
            taken_on: record.date,
            consultation_id: record.id,
        }),
        Evaluation::CareerV1 { preferences, .. } => {
            profile
                .preferences
                .extend(preferences.iter().map(|p| PreferenceEntry {
                    university: p.university.clone(),
                    major: p.major.clone(),
                    rank: p.rank,
                    recorded_on: record.date,
                    consultation_id: record.id,
                }));
        }
        Evaluation::AchievementV1 {
            title,
            description,
            awarded_on,
        } => profile.achievements.push(Achievement {
            title: title.clone(),
            description: description.clone(),
            awarded_on: awarded_on.unwrap_or(record.date),
            consultation_id: record.id,
        }),
        _ => {}
    }

    profile.consultations.push(ConsultationSummary {
        id: record.id,
        date: record.date,
        category: record.category,
        summary: record.summary.clone(),
        counselor_evaluation: record.counselor_evaluation.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, NotFoundError, ValidationError};
    use crate::models::consultation::{ConsultationCategory, ConsultationId, RawConsultation};
    use crate::models::evaluation::{DimensionKey, Rating};
    use crate::services::store::InMemoryStore;
    use crate::utils::logging::LogCapture;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn record(
        id: i64,
        date: NaiveDate,
        category: ConsultationCategory,
        evaluation: &str,
    ) -> ConsultationRecord {
        RawConsultation {
            id: ConsultationId(id),
            student_id: StudentId(1),
            date,
            category,
            summary: format!("consultation {}", id),
            details: String::new(),
            counselor_evaluation: String::new(),
            evaluation: Some(evaluation.to_string()),
        }
        .into()
    }

    fn student() -> Student {
        Student {
            id: StudentId(1),
            code: "S2024001".to_string(),
            name: None,
        }
    }

    fn aggregator(records: Vec<ConsultationRecord>) -> EvaluationAggregator {
        let store = InMemoryStore::new(vec![student()], records);
        EvaluationAggregator::new(Arc::new(store), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn later_consultation_wins_per_dimension() {
        let records = vec![
            record(
                2,
                date(3, 1),
                ConsultationCategory::Academic,
                r#"{"schema":"academic.v1","academic":{"rating":"excellent"}}"#,
            ),
            record(
                1,
                date(1, 1),
                ConsultationCategory::Academic,
                r#"{"schema":"academic.v1","academic":{"rating":"poor"},"attitude":{"rating":"good","notes":"polite"}}"#,
            ),
        ];

        let profile = aggregator(records)
            .aggregate(StudentId(1), &DateRange::all())
            .await
            .unwrap();

        let academic = profile.snapshot(DimensionKey::Academic).unwrap();
        assert_eq!(academic.dimension.rating, Rating::Excellent);
        assert_eq!(academic.consultation_id, ConsultationId(2));

        // 较新的记录没有 attitude，保留旧值
        let attitude = profile.snapshot(DimensionKey::Attitude).unwrap();
        assert_eq!(attitude.dimension.notes, "polite");
        assert_eq!(profile.consultations[0].id, ConsultationId(1));
    }

    #[tokio::test]
    async fn accumulates_topik_preferences_and_achievements() {
        let records = vec![
            record(
                1,
                date(1, 10),
                ConsultationCategory::Topik,
                r#"{"schema":"topik.v1","test_number":1,"reading":50,"listening":45,"total":95}"#,
            ),
            record(
                2,
                date(2, 10),
                ConsultationCategory::Career,
                r#"{"schema":"career.v1","preferences":[{"university":"Seoul Univ","major":"CS"},{"university":"Busan Univ","rank":2}]}"#,
            ),
            record(
                3,
                date(4, 10),
                ConsultationCategory::Topik,
                r#"{"schema":"topik.v1","test_number":2,"reading":60,"listening":55,"total":115}"#,
            ),
            record(
                4,
                date(5, 1),
                ConsultationCategory::Achievement,
                r#"{"schema":"achievement.v1","title":"Speech contest"}"#,
            ),
            record(5, date(5, 2), ConsultationCategory::General, "not json"),
        ];

        let profile = aggregator(records)
            .aggregate(StudentId(1), &DateRange::all())
            .await
            .unwrap();

        let totals: Vec<u32> = profile.topik_results.iter().map(|r| r.total).collect();
        assert_eq!(totals, vec![95, 115]);
        assert_eq!(profile.topik_results[1].taken_on, date(4, 10));
        assert_eq!(profile.preferences.len(), 2);
        assert_eq!(profile.preferences[1].rank, 2);
        assert_eq!(profile.achievements[0].awarded_on, date(5, 1));
        assert_eq!(profile.consultations.len(), 5);
    }

    #[tokio::test]
    async fn range_filters_records() {
        let records = vec![
            record(1, date(1, 1), ConsultationCategory::General, ""),
            record(2, date(6, 1), ConsultationCategory::General, ""),
        ];
        let range = DateRange::new(Some(date(5, 1)), Some(date(12, 31)));

        let profile = aggregator(records)
            .aggregate(StudentId(1), &range)
            .await
            .unwrap();
        assert_eq!(profile.consultations.len(), 1);
        assert_eq!(profile.consultations[0].id, ConsultationId(2));
    }

    #[tokio::test]
    async fn empty_range_yields_empty_profile() {
        let range = DateRange::new(Some(date(7, 1)), Some(date(7, 31)));
        let profile = aggregator(Vec::new())
            .aggregate(StudentId(1), &range)
            .await
            .unwrap();

        assert!(profile.is_empty());
        assert_eq!(profile.student.code, "S2024001");
        assert_eq!(profile.range, range);
    }

    /// 不按日期过滤的存储
    struct UnfilteredStore(Vec<ConsultationRecord>);

    #[async_trait]
    impl StudentStore for UnfilteredStore {
        async fn get_student(&self, _id: StudentId) -> AppResult<Student> {
            Ok(student())
        }

        async fn list_consultations(
            &self,
            _student_id: StudentId,
            _range: &DateRange,
        ) -> AppResult<Vec<ConsultationRecord>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn records_outside_range_yield_logged_empty_profile() {
        let records = vec![record(
            1,
            date(3, 1),
            ConsultationCategory::Academic,
            r#"{"schema":"academic.v1","academic":{"rating":"good"}}"#,
        )];
        let aggregator =
            EvaluationAggregator::new(Arc::new(UnfilteredStore(records)), Duration::from_secs(60));
        let range = DateRange::new(Some(date(7, 1)), Some(date(7, 31)));

        let capture = LogCapture::start();
        let profile = aggregator.aggregate(StudentId(1), &range).await.unwrap();

        assert!(profile.is_empty());
        assert!(capture.contents().contains("生成空档案"));
    }

    #[tokio::test]
    async fn inverted_range_is_rejected() {
        let range = DateRange::new(Some(date(8, 1)), Some(date(7, 1)));
        let err = aggregator(Vec::new())
            .aggregate(StudentId(1), &range)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::InvalidDateRange { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_student_is_not_found() {
        let err = aggregator(Vec::new())
            .aggregate(StudentId(9), &DateRange::all())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(NotFoundError::Student(_))));
    }

    #[tokio::test]
    async fn student_lookup_is_cached_until_invalidated() {
        let aggregator = aggregator(Vec::new());
        aggregator
            .aggregate(StudentId(1), &DateRange::all())
            .await
            .unwrap();
        assert_eq!(aggregator.students.len(), 1);

        aggregator.invalidate_student(StudentId(1));
        assert!(aggregator.students.is_empty());
    }
}
