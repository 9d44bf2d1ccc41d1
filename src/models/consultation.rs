use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::models::evaluation::Evaluation;
use crate::models::student::StudentId;

/// 咨询记录 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsultationId(pub i64);

impl fmt::Display for ConsultationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 咨询类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationCategory {
    Academic,
    Life,
    Career,
    Topik,
    Achievement,
    General,
}

impl ConsultationCategory {
    pub fn key(self) -> &'static str {
        match self {
            ConsultationCategory::Academic => "category.academic",
            ConsultationCategory::Life => "category.life",
            ConsultationCategory::Career => "category.career",
            ConsultationCategory::Topik => "category.topik",
            ConsultationCategory::Achievement => "category.achievement",
            ConsultationCategory::General => "category.general",
        }
    }
}

/// 存储层中的原始咨询记录（评价为不透明 JSON 字符串）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConsultation {
    pub id: ConsultationId,
    pub student_id: StudentId,
    pub date: NaiveDate,
    pub category: ConsultationCategory,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub counselor_evaluation: String,
    #[serde(default)]
    pub evaluation: Option<String>,
}

/// 咨询记录（评价已解析为强类型）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationRecord {
    pub id: ConsultationId,
    pub student_id: StudentId,
    pub date: NaiveDate,
    pub category: ConsultationCategory,
    pub summary: String,
    pub details: String,
    /// 咨询老师评语，正式报告要求非空
    pub counselor_evaluation: String,
    pub evaluation: Evaluation,
}

impl From<RawConsultation> for ConsultationRecord {
    fn from(raw: RawConsultation) -> Self {
        let evaluation = Evaluation::parse(raw.id, raw.evaluation.as_deref());
        Self {
            id: raw.id,
            student_id: raw.student_id,
            date: raw.date,
            category: raw.category,
            summary: raw.summary,
            details: raw.details,
            counselor_evaluation: raw.counselor_evaluation,
            evaluation,
        }
    }
}

impl ConsultationRecord {
    pub fn has_counselor_evaluation(&self) -> bool {
        !self.counselor_evaluation.trim().is_empty()
    }
}

/// 日期范围（闭区间，两端均可省略）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    /// 起始日期晚于结束日期时无效
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => {
                Err(ValidationError::InvalidDateRange { from, to })
            }
            _ => Ok(()),
        }
    }
}
