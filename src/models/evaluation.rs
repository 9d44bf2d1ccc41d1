//! 咨询记录中的评价数据
//!
//! 数据库里评价以不透明的 JSON 存储。这里在入库（加载）时只解析一次，
//! 转换为按类别区分、带版本号的强类型枚举，后续各处不再做临时解析。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::consultation::ConsultationId;

/// 评价等级（有序：优 > 良 > 中 > 差）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Poor,
    Average,
    Good,
    Excellent,
}

impl Rating {
    pub fn key(self) -> &'static str {
        match self {
            Rating::Excellent => "rating.excellent",
            Rating::Good => "rating.good",
            Rating::Average => "rating.average",
            Rating::Poor => "rating.poor",
        }
    }
}

/// 单个评价维度：等级 + 备注
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationDimension {
    pub rating: Rating,
    #[serde(default)]
    pub notes: String,
}

/// 时点型评价维度（以最新记录为准）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKey {
    /// 学业表现
    Academic,
    /// 课堂态度
    Attitude,
    /// 出勤
    Attendance,
    /// 生活适应
    Adaptation,
    /// 升学准备度
    CareerReadiness,
}

impl DimensionKey {
    pub const ALL: [DimensionKey; 5] = [
        DimensionKey::Academic,
        DimensionKey::Attitude,
        DimensionKey::Attendance,
        DimensionKey::Adaptation,
        DimensionKey::CareerReadiness,
    ];

    pub fn key(self) -> &'static str {
        match self {
            DimensionKey::Academic => "dimension.academic",
            DimensionKey::Attitude => "dimension.attitude",
            DimensionKey::Attendance => "dimension.attendance",
            DimensionKey::Adaptation => "dimension.adaptation",
            DimensionKey::CareerReadiness => "dimension.career_readiness",
        }
    }
}

/// 志愿（大学 / 专业）条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceChoice {
    pub university: String,
    #[serde(default)]
    pub major: String,
    /// 志愿顺位，从 1 开始
    #[serde(default = "default_rank")]
    pub rank: u8,
}

fn default_rank() -> u8 {
    1
}

/// 评价数据（按类别区分，带 schema 版本）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "schema")]
pub enum Evaluation {
    #[serde(rename = "academic.v1")]
    AcademicV1 {
        #[serde(default)]
        academic: Option<EvaluationDimension>,
        #[serde(default)]
        attitude: Option<EvaluationDimension>,
        #[serde(default)]
        attendance: Option<EvaluationDimension>,
    },
    #[serde(rename = "life.v1")]
    LifeV1 {
        #[serde(default)]
        adaptation: Option<EvaluationDimension>,
    },
    #[serde(rename = "career.v1")]
    CareerV1 {
        #[serde(default)]
        readiness: Option<EvaluationDimension>,
        #[serde(default)]
        preferences: Vec<PreferenceChoice>,
    },
    #[serde(rename = "topik.v1")]
    TopikV1 {
        test_number: u8,
        reading: u32,
        listening: u32,
        #[serde(default)]
        writing: Option<u32>,
        total: u32,
        #[serde(default)]
        level: Option<u8>,
    },
    #[serde(rename = "achievement.v1")]
    AchievementV1 {
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        awarded_on: Option<NaiveDate>,
    },
    /// 缺失或无法解析的评价
    #[default]
    #[serde(rename = "empty")]
    Empty,
}

impl Evaluation {
    /// 解析存储中的评价 JSON
    ///
    /// 缺失、空白或格式错误时返回 `Evaluation::Empty` 并记录日志，从不失败
    pub fn parse(consultation_id: ConsultationId, raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            debug!("[咨询 {}] 没有评价数据，按空评价处理", consultation_id);
            return Evaluation::Empty;
        };

        match serde_json::from_str::<Evaluation>(raw) {
            Ok(evaluation) => evaluation,
            Err(e) => {
                warn!(
                    "[咨询 {}] ⚠️ 评价数据无法解析，按空评价处理: {}",
                    consultation_id, e
                );
                Evaluation::Empty
            }
        }
    }

    /// 该评价携带的时点型维度
    pub fn dimensions(&self) -> Vec<(DimensionKey, &EvaluationDimension)> {
        let pairs: Vec<(DimensionKey, Option<&EvaluationDimension>)> = match self {
            Evaluation::AcademicV1 {
                academic,
                attitude,
                attendance,
            } => vec![
                (DimensionKey::Academic, academic.as_ref()),
                (DimensionKey::Attitude, attitude.as_ref()),
                (DimensionKey::Attendance, attendance.as_ref()),
            ],
            Evaluation::LifeV1 { adaptation } => {
                vec![(DimensionKey::Adaptation, adaptation.as_ref())]
            }
            Evaluation::CareerV1 { readiness, .. } => {
                vec![(DimensionKey::CareerReadiness, readiness.as_ref())]
            }
            _ => Vec::new(),
        };

        pairs
            .into_iter()
            .filter_map(|(key, dim)| dim.map(|d| (key, d)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Evaluation::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::logging::capture_logs;

    #[test]
    fn parses_tagged_academic_blob() {
        let raw = r#"{"schema":"academic.v1","academic":{"rating":"good","notes":"steady"},"attitude":{"rating":"excellent"}}"#;
        let evaluation = Evaluation::parse(ConsultationId(1), Some(raw));

        let dims = evaluation.dimensions();
        assert_eq!(dims.len(), 2);
        assert_eq!(dims[0].0, DimensionKey::Academic);
        assert_eq!(dims[0].1.rating, Rating::Good);
        assert_eq!(dims[1].1.notes, "");
    }

    #[test]
    fn malformed_or_missing_blob_is_empty() {
        let logs = capture_logs(|| {
            assert!(Evaluation::parse(ConsultationId(1), None).is_empty());
            assert!(Evaluation::parse(ConsultationId(2), Some("   ")).is_empty());
            assert!(Evaluation::parse(ConsultationId(3), Some("{not json")).is_empty());
            assert!(
                Evaluation::parse(ConsultationId(4), Some(r#"{"schema":"unknown.v9"}"#))
                    .is_empty()
            );
        });

        for id in 1..=4 {
            assert!(logs.contains(&format!("[咨询 {}]", id)), "{}", logs);
        }
        assert!(logs.contains("没有评价数据"));
        assert!(logs.contains("无法解析"));
    }

    #[test]
    fn parses_topik_blob_without_writing() {
        let raw = r#"{"schema":"topik.v1","test_number":2,"reading":60,"listening":55,"total":115}"#;
        match Evaluation::parse(ConsultationId(7), Some(raw)) {
            Evaluation::TopikV1 {
                test_number,
                writing,
                total,
                ..
            } => {
                assert_eq!(test_number, 2);
                assert_eq!(writing, None);
                assert_eq!(total, 115);
            }
            other => panic!("unexpected evaluation: {:?}", other),
        }
    }

    #[test]
    fn ratings_are_ordered() {
        assert!(Rating::Excellent > Rating::Good);
        assert!(Rating::Average > Rating::Poor);
    }
}
